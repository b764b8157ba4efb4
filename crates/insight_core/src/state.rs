use std::fmt;

/// Opaque identifier for one server-side analysis run.
pub type RunId = String;

/// Monotonic counter used to discard stale debounce and validation replies.
pub type Generation = u64;

/// Minimum cleaned-handle length before any validation is scheduled.
pub const MIN_HANDLE_LEN: usize = 2;

/// Strips the decorative `@` prefix convention and all whitespace from raw
/// handle input.
pub fn clean_handle(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '@')
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Starting,
    Scraping,
    Analyzing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Forward-progress rank. A poll response ranking below the current
    /// status is stale and must be ignored.
    pub(crate) fn rank(self) -> u8 {
        match self {
            JobStatus::Starting => 0,
            JobStatus::Scraping => 1,
            JobStatus::Analyzing => 2,
            JobStatus::Completed | JobStatus::Failed => 3,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Starting => "starting",
            JobStatus::Scraping => "scraping",
            JobStatus::Analyzing => "analyzing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// One in-flight (or just-finished) server-side analysis run.
///
/// `run_id` is assigned on launch and never changes afterwards. `progress`
/// is advisory and monotonically non-decreasing while the status is
/// non-terminal; the authoritative signal is `status`. A failure message has
/// no field here: a failed job becomes [`Session::Error`], so the illegal
/// "failed but still analyzing" combination cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisJob {
    pub run_id: Option<RunId>,
    pub status: JobStatus,
    pub progress: u8,
    pub status_message: String,
}

/// Tri-state existence signal from the validation endpoint. `Unknown` means
/// the validator itself could not tell, which is distinct from a handle
/// confirmed absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    Yes,
    No,
    Unknown,
}

/// Classified reply from the handle-validation endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleValidation {
    pub exists: Existence,
    pub message: String,
    /// A completed analysis already on file for this handle. When present the
    /// orchestrator must skip the launch entirely.
    pub existing: Option<ExistingAnalysis>,
}

/// A previously completed job for this handle, owned by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingAnalysis {
    pub id: String,
    pub handle: String,
    pub status: String,
    pub result: AnalysisResult,
    pub completed_at: Option<String>,
}

/// Terminal analysis payload. The orchestrator treats it as an opaque,
/// immutable value and never interprets its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult(pub serde_json::Value);

/// Error taxonomy. The kind decides which recovery action the UI should
/// offer, not how the message is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Handle too short or locally malformed; no network call was made.
    Input,
    /// The remote validator rejected the handle or returned an ambiguous
    /// existence signal.
    Validation,
    /// Caller lacks the capability to launch a job.
    Entitlement,
    /// The start-job request failed.
    Launch,
    /// The remote job itself reported failure.
    JobFailure,
    /// Polling exhausted its budget; the job may still be running remotely.
    Timeout,
    /// The job completed but its result could not be retrieved. Recovery is
    /// a re-fetch, never a relaunch.
    ResultFetch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Input => "input",
            ErrorKind::Validation => "validation",
            ErrorKind::Entitlement => "entitlement",
            ErrorKind::Launch => "launch",
            ErrorKind::JobFailure => "job failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ResultFetch => "result fetch",
        };
        write!(f, "{name}")
    }
}

/// Outcome of one validation round-trip as seen by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// The request never produced a well-formed reply. Recoverable; the user
    /// can edit the input to re-trigger.
    TransportFailed,
    /// Well-formed reply with `success == false`.
    Rejected { message: Option<String> },
    /// Well-formed positive reply, still subject to existence classification.
    Verified(HandleValidation),
}

/// The single aggregate exposed to the UI layer. Exactly one variant is
/// active at any time; transitions happen only through [`crate::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Paywall,
    Input {
        handle_error: Option<String>,
        is_validating: bool,
        is_handle_valid: bool,
    },
    Analyzing(AnalysisJob),
    Result(AnalysisResult),
    Error {
        kind: ErrorKind,
        message: String,
        run_id: Option<RunId>,
    },
}

impl Session {
    pub(crate) fn fresh_input() -> Self {
        Session::Input {
            handle_error: None,
            is_validating: false,
            is_handle_valid: false,
        }
    }
}

/// Orchestrator state for one analysis session (one screen mount).
///
/// The cleaned handle text lives beside the session union so that
/// [`crate::Msg::RetryFromError`] can restore the input without retyping.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub(crate) session: Session,
    pub(crate) handle: String,
    pub(crate) entitled: bool,
    pub(crate) generation: Generation,
    pub(crate) dirty: bool,
}

impl AppState {
    pub fn new(entitled: bool) -> Self {
        Self {
            session: if entitled {
                Session::fresh_input()
            } else {
                Session::Paywall
            },
            handle: String::new(),
            entitled,
            generation: 0,
            dirty: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The cleaned handle as last entered.
    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn is_entitled(&self) -> bool {
        self.entitled
    }

    /// Returns whether the state changed since the last call, and clears the
    /// flag. Used by embedders to coalesce rendering.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn touch(&mut self) {
        self.dirty = true;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(false)
    }
}
