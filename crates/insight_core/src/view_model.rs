use crate::state::{AnalysisResult, AppState, ErrorKind, Session};

/// Which screen the UI should render for the current session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Paywall,
    Input,
    Analyzing,
    Result,
    Error,
}

/// Recovery action the UI should offer for the current error. Derived from
/// the error kind: a finished job whose result failed to download is
/// re-fetched, never relaunched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    Resubmit,
    RefetchResult,
    Upgrade,
}

/// Flattened, render-ready projection of [`AppState`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub screen: Screen,
    pub handle: String,
    pub handle_error: Option<String>,
    pub is_validating: bool,
    pub is_handle_valid: bool,
    pub progress: u8,
    pub status_message: Option<String>,
    pub error_message: Option<String>,
    pub result: Option<AnalysisResult>,
    pub retry: Option<RetryAction>,
}

impl AppState {
    pub fn view(&self) -> SessionView {
        let mut view = SessionView {
            screen: Screen::Input,
            handle: self.handle().to_string(),
            handle_error: None,
            is_validating: false,
            is_handle_valid: false,
            progress: 0,
            status_message: None,
            error_message: None,
            result: None,
            retry: None,
        };
        match self.session() {
            Session::Paywall => view.screen = Screen::Paywall,
            Session::Input {
                handle_error,
                is_validating,
                is_handle_valid,
            } => {
                view.handle_error = handle_error.clone();
                view.is_validating = *is_validating;
                view.is_handle_valid = *is_handle_valid;
            }
            Session::Analyzing(job) => {
                view.screen = Screen::Analyzing;
                view.progress = job.progress;
                view.status_message = Some(job.status_message.clone());
            }
            Session::Result(result) => {
                view.screen = Screen::Result;
                view.progress = 100;
                view.result = Some(result.clone());
            }
            Session::Error { kind, message, .. } => {
                view.screen = Screen::Error;
                view.error_message = Some(message.clone());
                view.retry = Some(retry_for(*kind));
            }
        }
        view
    }
}

fn retry_for(kind: ErrorKind) -> RetryAction {
    match kind {
        ErrorKind::Entitlement => RetryAction::Upgrade,
        ErrorKind::ResultFetch => RetryAction::RefetchResult,
        ErrorKind::Input
        | ErrorKind::Validation
        | ErrorKind::Launch
        | ErrorKind::JobFailure
        | ErrorKind::Timeout => RetryAction::Resubmit,
    }
}
