use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use insight_core::{AnalysisResult, ExistingAnalysis, HandleValidation, JobStatus, RunId};

use crate::wire::{Envelope, ExistingAnalysisDto, StartData, StartRequest, StatusData, ValidateData, ValidateRequest};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Quiet period after the last keystroke before validation fires.
    pub debounce: Duration,
    /// Fixed delay between status polls.
    pub poll_interval: Duration,
    /// Poll budget; exceeding it fails the session with a timeout error.
    pub max_polls: u32,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            debounce: Duration::from_millis(2000),
            poll_interval: Duration::from_millis(3000),
            max_polls: 60,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no bearer credential available: {0}")]
    Unavailable(String),
}

/// Supplies the bearer credential attached to every request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String, TokenError>;
}

/// Fixed token, for tests and embeddings that handle refresh elsewhere.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String, TokenError> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("http status {0}")]
    HttpStatus(u16),
    /// Response did not match the `{success, data, error}` envelope. Always a
    /// transport-level problem, never a domain outcome.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Well-formed envelope with `success == false`.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// One well-formed status poll reply. `progress` is whatever the server
/// volunteered; the state machine keeps its own estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: JobStatus,
    pub progress: Option<u8>,
    pub error_message: Option<String>,
}

/// The analysis backend, one method per endpoint.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn validate_handle(&self, handle: &str) -> Result<HandleValidation, ApiError>;
    async fn start_analysis(&self, handle: &str, is_pro: bool) -> Result<RunId, ApiError>;
    async fn job_status(&self, run_id: &str) -> Result<StatusReport, ApiError>;
    async fn job_result(&self, run_id: &str) -> Result<AnalysisResult, ApiError>;
    async fn existing_analysis(&self) -> Result<Option<ExistingAnalysis>, ApiError>;
}

pub struct ReqwestApiClient {
    client: reqwest::Client,
    settings: ApiSettings,
    tokens: Arc<dyn TokenProvider>,
}

impl ReqwestApiClient {
    pub fn new(settings: ApiSettings, tokens: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self {
            client,
            settings,
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        let token = self.tokens.bearer_token().await?;
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        unwrap_envelope(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let token = self.tokens.bearer_token().await?;
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        unwrap_envelope(response).await
    }
}

#[async_trait]
impl ApiClient for ReqwestApiClient {
    async fn validate_handle(&self, handle: &str) -> Result<HandleValidation, ApiError> {
        let data: ValidateData =
            require_data(self.post("/analysis/validate-handle", &ValidateRequest { handle }).await?)?;
        data.into_domain()
    }

    async fn start_analysis(&self, handle: &str, is_pro: bool) -> Result<RunId, ApiError> {
        let data: StartData =
            require_data(self.post("/analysis", &StartRequest { handle, is_pro }).await?)?;
        Ok(data.run_id)
    }

    async fn job_status(&self, run_id: &str) -> Result<StatusReport, ApiError> {
        let data: StatusData =
            require_data(self.get(&format!("/analysis/status/{run_id}")).await?)?;
        Ok(StatusReport {
            status: parse_status(&data.status)?,
            progress: data.progress,
            error_message: data.error_message,
        })
    }

    async fn job_result(&self, run_id: &str) -> Result<AnalysisResult, ApiError> {
        let data: serde_json::Value =
            require_data(self.get(&format!("/analysis/result/{run_id}")).await?)?;
        Ok(AnalysisResult(data))
    }

    async fn existing_analysis(&self) -> Result<Option<ExistingAnalysis>, ApiError> {
        let data: Option<ExistingAnalysisDto> = self.get("/analysis/existing").await?;
        Ok(data.map(ExistingAnalysisDto::into_domain))
    }
}

async fn unwrap_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<Option<T>, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::HttpStatus(status.as_u16()));
    }
    let envelope: Envelope<T> = response
        .json()
        .await
        .map_err(|err| ApiError::Malformed(err.to_string()))?;
    if envelope.success {
        Ok(envelope.data)
    } else {
        Err(ApiError::Rejected(envelope.error.unwrap_or_else(|| {
            "request rejected by server".to_string()
        })))
    }
}

fn require_data<T>(data: Option<T>) -> Result<T, ApiError> {
    data.ok_or_else(|| ApiError::Malformed("missing data field".to_string()))
}

fn parse_status(raw: &str) -> Result<JobStatus, ApiError> {
    match raw {
        "starting" => Ok(JobStatus::Starting),
        "scraping" => Ok(JobStatus::Scraping),
        "analyzing" => Ok(JobStatus::Analyzing),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        other => Err(ApiError::Malformed(format!("unknown job status {other:?}"))),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    ApiError::Network(err.to_string())
}
