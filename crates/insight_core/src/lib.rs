//! Insight core: pure orchestrator state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    clean_handle, AnalysisJob, AnalysisResult, AppState, ErrorKind, Existence, ExistingAnalysis,
    Generation, HandleValidation, JobStatus, RunId, Session, ValidationOutcome, MIN_HANDLE_LEN,
};
pub use update::update;
pub use view_model::{RetryAction, Screen, SessionView};
