use crate::state::{Generation, RunId};

/// Side effects requested by [`crate::update`], executed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Arm the debounce timer for this handle, superseding any pending one.
    ScheduleValidation { handle: String, generation: Generation },
    /// Disarm the debounce timer. Idempotent.
    CancelValidation,
    /// Call the validation endpoint now (no debounce).
    ValidateHandle {
        handle: String,
        generation: Generation,
        on_submit: bool,
    },
    /// POST the start-job request.
    StartJob { handle: String, is_pro: bool },
    /// Begin the status poll loop for this run.
    StartPolling { run_id: RunId },
    /// Stop any active poll loop. Idempotent.
    StopPolling,
    /// GET the finished job's result.
    FetchResult { run_id: RunId },
}
