use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use insight_core::{Existence, JobStatus};
use insight_engine::{ApiClient, ApiError, ApiSettings, ReqwestApiClient, StaticTokenProvider};

fn client_for(server: &MockServer) -> ReqwestApiClient {
    insight_logging::initialize_for_tests();
    ReqwestApiClient::new(
        ApiSettings::new(server.uri()),
        Arc::new(StaticTokenProvider::new("test-token")),
    )
    .expect("client")
}

#[tokio::test]
async fn validate_handle_sends_bearer_token_and_parses_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analysis/validate-handle"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({ "handle": "john_doe" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "exists": true, "message": "Account found" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let validation = client.validate_handle("john_doe").await.expect("validate");

    assert_eq!(validation.exists, Existence::Yes);
    assert_eq!(validation.message, "Account found");
    assert!(validation.existing.is_none());
}

#[tokio::test]
async fn validate_handle_surfaces_an_attached_existing_analysis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analysis/validate-handle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "exists": true,
                "message": "Account found",
                "hasExistingAnalysisForUser": true,
                "analysis": {
                    "id": "an_7",
                    "tiktokHandle": "john_doe",
                    "status": "completed",
                    "result": { "followers": 1200 },
                    "completedAt": "2026-08-01T10:00:00Z"
                }
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let validation = client.validate_handle("john_doe").await.expect("validate");

    let existing = validation.existing.expect("existing analysis");
    assert_eq!(existing.handle, "john_doe");
    assert_eq!(existing.result.0["followers"], 1200);
}

#[tokio::test]
async fn unknown_existence_label_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analysis/validate-handle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "exists": "unknown", "message": "Validator unavailable" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let validation = client.validate_handle("john_doe").await.expect("validate");
    assert_eq!(validation.exists, Existence::Unknown);
}

#[tokio::test]
async fn domain_rejection_is_not_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analysis/validate-handle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Compte introuvable"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.validate_handle("nobody").await.unwrap_err();
    match err {
        ApiError::Rejected(message) => assert_eq!(message, "Compte introuvable"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn non_envelope_body_is_a_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analysis/validate-handle"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.validate_handle("john_doe").await.unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn http_failure_maps_to_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analysis/status/run_42"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.job_status("run_42").await.unwrap_err();
    assert!(matches!(err, ApiError::HttpStatus(503)), "got {err:?}");
}

#[tokio::test]
async fn slow_reply_hits_the_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analysis/status/run_42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({ "success": true, "data": { "status": "scraping" } })),
        )
        .mount(&server)
        .await;

    let mut settings = ApiSettings::new(server.uri());
    settings.request_timeout = Duration::from_millis(50);
    let client = ReqwestApiClient::new(
        settings,
        Arc::new(StaticTokenProvider::new("test-token")),
    )
    .expect("client");

    let err = client.job_status("run_42").await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn start_analysis_posts_the_pro_flag_and_returns_the_run_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analysis"))
        .and(body_json(json!({ "handle": "creator1", "isPro": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "runId": "run_42" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let run_id = client.start_analysis("creator1", true).await.expect("start");
    assert_eq!(run_id, "run_42");
}

#[tokio::test]
async fn job_status_parses_the_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analysis/status/run_42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "status": "failed",
                "errorMessage": "account is private"
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let report = client.job_status("run_42").await.expect("status");
    assert_eq!(report.status, JobStatus::Failed);
    assert_eq!(report.error_message.as_deref(), Some("account is private"));
}

#[tokio::test]
async fn unknown_status_label_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analysis/status/run_42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "status": "paused" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.job_status("run_42").await.unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn job_result_returns_the_opaque_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analysis/result/run_42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "followers": 1200, "engagementRate": 4.2 }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.job_result("run_42").await.expect("result");
    assert_eq!(result.0["followers"], 1200);
}

#[tokio::test]
async fn existing_analysis_may_be_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analysis/existing"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "data": null })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let existing = client.existing_analysis().await.expect("existing");
    assert!(existing.is_none());
}
