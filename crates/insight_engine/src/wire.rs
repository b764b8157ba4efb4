//! Wire-format DTOs for the `{success, data, error}` API envelope.

use serde::{Deserialize, Serialize};

use insight_core::{AnalysisResult, Existence, ExistingAnalysis, HandleValidation};
use insight_logging::insight_warn;

use crate::api::ApiError;

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ValidateRequest<'a> {
    pub handle: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartRequest<'a> {
    pub handle: &'a str,
    pub is_pro: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ValidateData {
    pub exists: ExistsFlag,
    pub message: Option<String>,
    #[serde(default)]
    pub has_existing_analysis_for_user: bool,
    pub analysis: Option<ExistingAnalysisDto>,
}

/// The endpoint reports existence as `true`, `false`, or the literal string
/// `"unknown"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ExistsFlag {
    Known(bool),
    Label(String),
}

impl ValidateData {
    pub fn into_domain(self) -> Result<HandleValidation, ApiError> {
        let exists = match self.exists {
            ExistsFlag::Known(true) => Existence::Yes,
            ExistsFlag::Known(false) => Existence::No,
            ExistsFlag::Label(label) if label == "unknown" => Existence::Unknown,
            ExistsFlag::Label(label) => {
                return Err(ApiError::Malformed(format!(
                    "unexpected exists value {label:?}"
                )))
            }
        };
        let existing = if self.has_existing_analysis_for_user {
            if self.analysis.is_none() {
                insight_warn!("validator flagged an existing analysis but attached none");
            }
            self.analysis.map(ExistingAnalysisDto::into_domain)
        } else {
            None
        };
        Ok(HandleValidation {
            exists,
            message: self.message.unwrap_or_default(),
            existing,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExistingAnalysisDto {
    pub id: String,
    #[serde(alias = "tiktokHandle")]
    pub handle: String,
    pub status: Option<String>,
    pub result: serde_json::Value,
    pub completed_at: Option<String>,
}

impl ExistingAnalysisDto {
    pub fn into_domain(self) -> ExistingAnalysis {
        ExistingAnalysis {
            id: self.id,
            handle: self.handle,
            status: self.status.unwrap_or_else(|| "completed".to_string()),
            result: AnalysisResult(self.result),
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartData {
    pub run_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusData {
    pub status: String,
    pub progress: Option<u8>,
    pub error_message: Option<String>,
}
