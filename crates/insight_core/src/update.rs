use crate::state::{
    clean_handle, AnalysisJob, AppState, ErrorKind, Existence, JobStatus, Session,
    ValidationOutcome, MIN_HANDLE_LEN,
};
use crate::{Effect, Msg};

const MSG_INITIALIZING: &str = "Initializing analysis…";
const MSG_FINALIZING: &str = "Finalizing your report…";
const MSG_HANDLE_TOO_SHORT: &str = "Handles must be at least 2 characters long.";
const MSG_VALIDATION_FAILED: &str =
    "We could not validate this handle. Check your connection and try again.";
const MSG_HANDLE_REJECTED: &str = "This handle could not be found.";
const MSG_HANDLE_UNKNOWN: &str = "We could not confirm this handle exists. Please try again.";
const MSG_ENTITLEMENT_REQUIRED: &str = "An active subscription is required to run an analysis.";
const MSG_LAUNCH_FAILED: &str = "The analysis could not be started. Please try again.";
const MSG_JOB_FAILED: &str = "The analysis failed. Please try again.";
const MSG_TIMEOUT: &str =
    "The analysis timed out. The job may still finish server-side; please try again.";
const MSG_FETCH_FAILED: &str =
    "Your analysis finished, but the results could not be retrieved. Please retry.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::EntitlementChanged(entitled) => {
            state.entitled = entitled;
            match (&state.session, entitled) {
                (Session::Paywall, true) => {
                    state.session = Session::fresh_input();
                    state.touch();
                }
                (Session::Input { .. }, false) => {
                    state.session = Session::Paywall;
                    state.touch();
                }
                _ => {}
            }
            Vec::new()
        }
        Msg::HandleEdited(raw) => {
            if !matches!(state.session, Session::Input { .. }) {
                return (state, Vec::new());
            }
            let cleaned = clean_handle(&raw);
            state.generation += 1;
            state.handle = cleaned.clone();
            state.session = Session::fresh_input();
            state.touch();
            if cleaned.chars().count() < MIN_HANDLE_LEN {
                // Too short to be worth a network call; stay indeterminate.
                vec![Effect::CancelValidation]
            } else {
                vec![Effect::ScheduleValidation {
                    handle: cleaned,
                    generation: state.generation,
                }]
            }
        }
        Msg::DebounceElapsed { handle, generation } => {
            if generation != state.generation || !matches!(state.session, Session::Input { .. }) {
                return (state, Vec::new());
            }
            state.session = Session::Input {
                handle_error: None,
                is_validating: true,
                is_handle_valid: false,
            };
            state.touch();
            vec![Effect::ValidateHandle {
                handle,
                generation,
                on_submit: false,
            }]
        }
        Msg::ValidationFinished {
            generation,
            on_submit,
            outcome,
        } => {
            if generation != state.generation || !matches!(state.session, Session::Input { .. }) {
                return (state, Vec::new());
            }
            state.touch();
            apply_validation(&mut state, outcome, on_submit)
        }
        Msg::SubmitRequested { handle } => {
            if matches!(state.session, Session::Analyzing(_) | Session::Result(_)) {
                return (state, Vec::new());
            }
            if !state.entitled {
                state.session = Session::Error {
                    kind: ErrorKind::Entitlement,
                    message: MSG_ENTITLEMENT_REQUIRED.to_string(),
                    run_id: None,
                };
                state.touch();
                return (state, Vec::new());
            }
            let cleaned = match handle {
                Some(raw) => clean_handle(&raw),
                None => state.handle.clone(),
            };
            state.generation += 1;
            state.handle = cleaned.clone();
            state.touch();
            if cleaned.chars().count() < MIN_HANDLE_LEN {
                state.session = Session::Input {
                    handle_error: Some(MSG_HANDLE_TOO_SHORT.to_string()),
                    is_validating: false,
                    is_handle_valid: false,
                };
                vec![Effect::CancelValidation]
            } else {
                state.session = Session::Input {
                    handle_error: None,
                    is_validating: true,
                    is_handle_valid: false,
                };
                vec![
                    Effect::CancelValidation,
                    Effect::ValidateHandle {
                        handle: cleaned,
                        generation: state.generation,
                        on_submit: true,
                    },
                ]
            }
        }
        Msg::LaunchFinished { outcome } => {
            let launching = matches!(
                &state.session,
                Session::Analyzing(job)
                    if job.status == JobStatus::Starting && job.run_id.is_none()
            );
            if !launching {
                return (state, Vec::new());
            }
            state.touch();
            match outcome {
                Ok(run_id) => {
                    state.session = Session::Analyzing(AnalysisJob {
                        run_id: Some(run_id.clone()),
                        status: JobStatus::Scraping,
                        progress: 10,
                        status_message: status_message(JobStatus::Scraping, 0),
                    });
                    vec![Effect::StartPolling { run_id }]
                }
                Err(message) => {
                    state.session = Session::Error {
                        kind: ErrorKind::Launch,
                        message: non_empty_or(message, MSG_LAUNCH_FAILED),
                        run_id: None,
                    };
                    Vec::new()
                }
            }
        }
        Msg::PollObserved {
            run_id,
            poll_count,
            status,
            error_message,
        } => {
            let current = match &state.session {
                Session::Analyzing(job)
                    if job.run_id.as_deref() == Some(run_id.as_str())
                        && !job.status.is_terminal() =>
                {
                    job.clone()
                }
                _ => return (state, Vec::new()),
            };
            if status.rank() < current.status.rank() {
                // Out-of-order response; a newer status already applied.
                return (state, Vec::new());
            }
            match status {
                JobStatus::Starting => Vec::new(),
                JobStatus::Scraping | JobStatus::Analyzing => {
                    let mut job = current;
                    job.status = status;
                    if let Some(estimate) = estimated_progress(status, poll_count) {
                        job.progress = job.progress.max(estimate);
                    }
                    job.status_message = status_message(status, poll_count);
                    state.session = Session::Analyzing(job);
                    state.touch();
                    Vec::new()
                }
                JobStatus::Completed => {
                    let mut job = current;
                    job.status = JobStatus::Completed;
                    job.progress = job.progress.max(95);
                    job.status_message = status_message(JobStatus::Completed, poll_count);
                    state.session = Session::Analyzing(job);
                    state.touch();
                    vec![Effect::StopPolling, Effect::FetchResult { run_id }]
                }
                JobStatus::Failed => {
                    state.session = Session::Error {
                        kind: ErrorKind::JobFailure,
                        message: non_empty_or(error_message.unwrap_or_default(), MSG_JOB_FAILED),
                        run_id: Some(run_id),
                    };
                    state.touch();
                    vec![Effect::StopPolling]
                }
            }
        }
        Msg::PollTimedOut { run_id } => {
            let active = matches!(
                &state.session,
                Session::Analyzing(job)
                    if job.run_id.as_deref() == Some(run_id.as_str())
                        && !job.status.is_terminal()
            );
            if !active {
                return (state, Vec::new());
            }
            state.session = Session::Error {
                kind: ErrorKind::Timeout,
                message: MSG_TIMEOUT.to_string(),
                run_id: Some(run_id),
            };
            state.touch();
            vec![Effect::StopPolling]
        }
        Msg::ResultFetchStarted { run_id } => {
            if let Session::Analyzing(job) = &mut state.session {
                if job.run_id.as_deref() == Some(run_id.as_str())
                    && job.status == JobStatus::Completed
                {
                    job.progress = job.progress.max(98);
                    job.status_message = MSG_FINALIZING.to_string();
                    state.dirty = true;
                }
            }
            Vec::new()
        }
        Msg::ResultFetched { run_id, outcome } => {
            let finalizing = matches!(
                &state.session,
                Session::Analyzing(job)
                    if job.run_id.as_deref() == Some(run_id.as_str())
                        && job.status == JobStatus::Completed
            );
            if !finalizing {
                return (state, Vec::new());
            }
            state.touch();
            match outcome {
                Ok(result) => {
                    state.session = Session::Result(result);
                }
                Err(_) => {
                    // The job itself succeeded; only retrieval failed.
                    state.session = Session::Error {
                        kind: ErrorKind::ResultFetch,
                        message: MSG_FETCH_FAILED.to_string(),
                        run_id: Some(run_id),
                    };
                }
            }
            Vec::new()
        }
        Msg::ResetRequested => {
            state.handle.clear();
            state.generation += 1;
            state.session = if state.entitled {
                Session::fresh_input()
            } else {
                Session::Paywall
            };
            state.touch();
            vec![Effect::CancelValidation, Effect::StopPolling]
        }
        Msg::RetryFromError => {
            if matches!(state.session, Session::Error { .. }) {
                state.session = if state.entitled {
                    Session::fresh_input()
                } else {
                    Session::Paywall
                };
                state.touch();
            }
            Vec::new()
        }
        Msg::RetryFetchRequested => {
            if let Session::Error {
                kind: ErrorKind::ResultFetch,
                run_id: Some(run_id),
                ..
            } = &state.session
            {
                let run_id = run_id.clone();
                state.session = Session::Analyzing(AnalysisJob {
                    run_id: Some(run_id.clone()),
                    status: JobStatus::Completed,
                    progress: 98,
                    status_message: MSG_FINALIZING.to_string(),
                });
                state.touch();
                vec![Effect::FetchResult { run_id }]
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}

fn apply_validation(
    state: &mut AppState,
    outcome: ValidationOutcome,
    on_submit: bool,
) -> Vec<Effect> {
    match outcome {
        ValidationOutcome::TransportFailed => {
            state.session = input_error(MSG_VALIDATION_FAILED.to_string());
            Vec::new()
        }
        ValidationOutcome::Rejected { message } => {
            state.session = input_error(non_empty_or(
                message.unwrap_or_default(),
                MSG_HANDLE_REJECTED,
            ));
            Vec::new()
        }
        ValidationOutcome::Verified(validation) => {
            if let Some(existing) = validation.existing {
                // A completed analysis is already on file: skip the launch
                // entirely and jump straight to the result.
                state.session = Session::Result(existing.result);
                return vec![Effect::CancelValidation];
            }
            match validation.exists {
                Existence::Yes => {
                    if on_submit {
                        state.session = Session::Analyzing(AnalysisJob {
                            run_id: None,
                            status: JobStatus::Starting,
                            progress: 5,
                            status_message: MSG_INITIALIZING.to_string(),
                        });
                        // StopPolling first: at most one poll loop per session.
                        vec![
                            Effect::StopPolling,
                            Effect::StartJob {
                                handle: state.handle.clone(),
                                is_pro: state.entitled,
                            },
                        ]
                    } else {
                        state.session = Session::Input {
                            handle_error: None,
                            is_validating: false,
                            is_handle_valid: true,
                        };
                        Vec::new()
                    }
                }
                Existence::No => {
                    state.session =
                        input_error(non_empty_or(validation.message, MSG_HANDLE_REJECTED));
                    Vec::new()
                }
                Existence::Unknown => {
                    state.session =
                        input_error(non_empty_or(validation.message, MSG_HANDLE_UNKNOWN));
                    Vec::new()
                }
            }
        }
    }
}

fn input_error(message: String) -> Session {
    Session::Input {
        handle_error: Some(message),
        is_validating: false,
        is_handle_valid: false,
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Advisory progress estimate for non-terminal polling, purely for UI
/// smoothness.
fn estimated_progress(status: JobStatus, poll_count: u32) -> Option<u8> {
    match status {
        JobStatus::Scraping => Some((30 + poll_count.saturating_mul(2)).min(60) as u8),
        JobStatus::Analyzing => Some((60 + poll_count.saturating_mul(3)).min(90) as u8),
        _ => None,
    }
}

fn status_message(status: JobStatus, poll_count: u32) -> String {
    let text = match status {
        JobStatus::Starting => MSG_INITIALIZING,
        JobStatus::Scraping if poll_count > 10 => "Still collecting account data…",
        JobStatus::Scraping => "Collecting account data…",
        JobStatus::Analyzing if poll_count > 20 => "Almost done, crunching the numbers…",
        JobStatus::Analyzing => "Analyzing content and audience…",
        JobStatus::Completed => "Retrieving your results…",
        JobStatus::Failed => "Analysis failed.",
    };
    text.to_string()
}
