use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use campground_scan::{CycleOutcome, PollJob, RunState, ScanExecutor};

/// Background watcher that re-runs one poll job every `check_every` minutes.
///
/// The same [`RunState`] is carried across cycles, so a site/date pair is only
/// texted once and repeated errors escalate across cycles.
pub struct ScanManager {
    executor: Arc<ScanExecutor>,
    executor_handle: Option<JoinHandle<()>>,
}

impl ScanManager {
    /// Create a new scan manager
    pub fn new(executor: Arc<ScanExecutor>) -> Self {
        Self {
            executor,
            executor_handle: None,
        }
    }

    /// Start watching `job`, replacing any watch already running
    pub fn start(&mut self, job: PollJob) {
        self.abort();

        let period = Duration::from_secs(u64::from(job.check_every.max(1)) * 60);
        info!(
            "Starting watcher for {} campground(s), polling every {} minute(s)",
            job.campgrounds.len(),
            job.check_every
        );

        let executor = self.executor.clone();
        let handle = tokio::spawn(async move {
            let mut state = RunState::new();
            let mut ticker = tokio::time::interval(period);

            loop {
                ticker.tick().await;

                match executor.run_cycle(&job, &mut state).await {
                    CycleOutcome::Completed(reports) => {
                        let found: usize = reports.iter().map(|r| r.stays.len()).sum();
                        info!(
                            "Cycle {} finished: {} stay(s) across {} campground(s)",
                            state.run_id,
                            found,
                            reports.len()
                        );
                    }
                    CycleOutcome::FacilityLookup { campground, .. } => {
                        warn!(
                            "'{}' is not a facility id; watcher stopped until the request is fixed",
                            campground
                        );
                        break;
                    }
                }
            }
        });

        self.executor_handle = Some(handle);
    }

    /// Whether a watch task is still running
    pub fn is_running(&self) -> bool {
        self.executor_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the watcher and wait for the task to wind down
    pub async fn stop(&mut self) {
        info!("Stopping watcher");

        if let Some(handle) = self.executor_handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }

    fn abort(&mut self) {
        if let Some(handle) = self.executor_handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ScanManager {
    fn drop(&mut self) {
        self.abort();
    }
}
