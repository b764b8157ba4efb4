use crate::state::{AnalysisResult, Generation, JobStatus, RunId, ValidationOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The entitlement collaborator reported a capability change.
    EntitlementChanged(bool),
    /// User edited the handle input box (raw, uncleaned text).
    HandleEdited(String),
    /// The debounce window elapsed without further input.
    DebounceElapsed { handle: String, generation: Generation },
    /// A validation round-trip finished.
    ValidationFinished {
        generation: Generation,
        /// True when this validation was triggered by a submit, in which case
        /// a positive outcome proceeds to launch.
        on_submit: bool,
        outcome: ValidationOutcome,
    },
    /// User asked to start the analysis (explicit handle or current input).
    SubmitRequested { handle: Option<String> },
    /// The start-job request finished.
    LaunchFinished { outcome: Result<RunId, String> },
    /// One status poll produced a well-formed reply.
    PollObserved {
        run_id: RunId,
        poll_count: u32,
        status: JobStatus,
        error_message: Option<String>,
    },
    /// The poll loop exhausted its budget without a terminal status.
    PollTimedOut { run_id: RunId },
    /// The result fetch was dispatched; drives the finalizing interim.
    ResultFetchStarted { run_id: RunId },
    /// The result fetch finished.
    ResultFetched {
        run_id: RunId,
        outcome: Result<AnalysisResult, String>,
    },
    /// Discard everything and return to the initial state.
    ResetRequested,
    /// Leave the error state, keeping the last-entered handle.
    RetryFromError,
    /// Re-fetch the result of an already-completed job without relaunching.
    RetryFetchRequested,
}
