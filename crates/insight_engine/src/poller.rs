use std::sync::{mpsc, Arc};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use insight_core::{Msg, RunId};
use insight_logging::insight_warn;

use crate::api::ApiClient;

/// Cancellable status-poll loop for one job.
///
/// At most one task may exist per session; [`PollTask::stop`] is the single
/// cancellation capability, and dropping the task cancels it as well, so the
/// loop can never outlive its owner.
pub struct PollTask {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollTask {
    /// Spawns the loop; must be called from within a tokio runtime.
    ///
    /// Each tick issues one status request. Well-formed replies are forwarded
    /// as [`Msg::PollObserved`]; a terminal status ends the loop. Transport
    /// errors on individual ticks are tolerated, bounded only by `max_polls`,
    /// after which [`Msg::PollTimedOut`] is sent.
    pub fn spawn(
        client: Arc<dyn ApiClient>,
        run_id: RunId,
        interval: Duration,
        max_polls: u32,
        event_tx: mpsc::Sender<Msg>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let guard = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            for poll_count in 1..=max_polls {
                tokio::select! {
                    _ = guard.cancelled() => return,
                    _ = ticker.tick() => {}
                }
                match client.job_status(&run_id).await {
                    Ok(report) => {
                        let terminal = report.status.is_terminal();
                        let _ = event_tx.send(Msg::PollObserved {
                            run_id: run_id.clone(),
                            poll_count,
                            status: report.status,
                            error_message: report.error_message,
                        });
                        if terminal {
                            return;
                        }
                    }
                    Err(err) => {
                        // Tolerated: flaky connectivity must not kill a
                        // multi-minute job. Only max_polls bounds the loop.
                        insight_warn!("status poll {poll_count} for {run_id} failed: {err}");
                    }
                }
            }
            let _ = event_tx.send(Msg::PollTimedOut { run_id });
        });
        Self { cancel, task }
    }

    pub fn stop(self) {
        self.shutdown();
    }

    fn shutdown(&self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}
