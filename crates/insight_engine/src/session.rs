use std::sync::{mpsc, Arc};
use std::thread;

use insight_core::{AppState, Effect, Msg, ValidationOutcome};
use insight_logging::{insight_info, insight_warn};

use crate::api::{ApiClient, ApiError, ApiSettings};
use crate::debounce::Debouncer;
use crate::entitlement::EntitlementSource;
use crate::poller::PollTask;

/// Async side of one orchestrator session.
///
/// The embedding event loop feeds core [`Effect`]s in through [`apply`] and
/// drains resulting [`Msg`]s out through [`try_recv`]. Dropping the handle
/// closes the command channel, which tears down the runtime and with it any
/// pending debounce or poll timer.
///
/// [`apply`]: SessionHandle::apply
/// [`try_recv`]: SessionHandle::try_recv
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<Effect>,
    event_rx: mpsc::Receiver<Msg>,
    entitlements: Arc<dyn EntitlementSource>,
}

impl SessionHandle {
    pub fn new(
        client: Arc<dyn ApiClient>,
        settings: ApiSettings,
        entitlements: Arc<dyn EntitlementSource>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Effect>();
        let (event_tx, event_rx) = mpsc::channel::<Msg>();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let _guard = runtime.enter();
            let mut driver = EffectDriver::new(client, settings, event_tx);
            while let Ok(effect) = cmd_rx.recv() {
                driver.apply(effect);
            }
            // Dropping the driver and runtime here aborts any outstanding
            // task, so no timer survives the session.
        });

        Self {
            cmd_tx,
            event_rx,
            entitlements,
        }
    }

    /// Builds the core state seeded with the current entitlement capability.
    pub fn initial_state(&self) -> AppState {
        AppState::new(self.entitlements.allows_analysis())
    }

    pub fn apply(&self, effect: Effect) {
        let _ = self.cmd_tx.send(effect);
    }

    pub fn apply_all(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.apply(effect);
        }
    }

    pub fn try_recv(&self) -> Option<Msg> {
        self.event_rx.try_recv().ok()
    }
}

struct EffectDriver {
    client: Arc<dyn ApiClient>,
    settings: ApiSettings,
    event_tx: mpsc::Sender<Msg>,
    debouncer: Debouncer,
    poll: Option<PollTask>,
}

impl EffectDriver {
    fn new(client: Arc<dyn ApiClient>, settings: ApiSettings, event_tx: mpsc::Sender<Msg>) -> Self {
        let debouncer = Debouncer::new(settings.debounce);
        Self {
            client,
            settings,
            event_tx,
            debouncer,
            poll: None,
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ScheduleValidation { handle, generation } => {
                let tx = self.event_tx.clone();
                self.debouncer.schedule(move || {
                    let _ = tx.send(Msg::DebounceElapsed { handle, generation });
                });
            }
            Effect::CancelValidation => self.debouncer.cancel(),
            Effect::ValidateHandle {
                handle,
                generation,
                on_submit,
            } => {
                let client = self.client.clone();
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let outcome = match client.validate_handle(&handle).await {
                        Ok(validation) => ValidationOutcome::Verified(validation),
                        Err(ApiError::Rejected(message)) => ValidationOutcome::Rejected {
                            message: (!message.is_empty()).then_some(message),
                        },
                        Err(err) => {
                            insight_warn!("handle validation failed: {err}");
                            ValidationOutcome::TransportFailed
                        }
                    };
                    let _ = tx.send(Msg::ValidationFinished {
                        generation,
                        on_submit,
                        outcome,
                    });
                });
            }
            Effect::StartJob { handle, is_pro } => {
                insight_info!("starting analysis for handle={handle} is_pro={is_pro}");
                let client = self.client.clone();
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let outcome = client
                        .start_analysis(&handle, is_pro)
                        .await
                        .map_err(user_message);
                    let _ = tx.send(Msg::LaunchFinished { outcome });
                });
            }
            Effect::StartPolling { run_id } => {
                // Exactly one poll loop per session: tear down any prior one
                // before arming the next.
                if let Some(prior) = self.poll.take() {
                    prior.stop();
                }
                insight_info!("polling status for run {run_id}");
                self.poll = Some(PollTask::spawn(
                    self.client.clone(),
                    run_id,
                    self.settings.poll_interval,
                    self.settings.max_polls,
                    self.event_tx.clone(),
                ));
            }
            Effect::StopPolling => {
                if let Some(task) = self.poll.take() {
                    task.stop();
                }
            }
            Effect::FetchResult { run_id } => {
                let _ = self.event_tx.send(Msg::ResultFetchStarted {
                    run_id: run_id.clone(),
                });
                let client = self.client.clone();
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let outcome = client.job_result(&run_id).await.map_err(|err| {
                        insight_warn!("result fetch for {run_id} failed: {err}");
                        user_message(err)
                    });
                    let _ = tx.send(Msg::ResultFetched { run_id, outcome });
                });
            }
        }
    }
}

/// Prefers the server-supplied rejection text over transport phrasing.
fn user_message(err: ApiError) -> String {
    match err {
        ApiError::Rejected(message) => message,
        other => other.to_string(),
    }
}
