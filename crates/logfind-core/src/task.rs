//! Cancellable periodic background work.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// A job that runs on a fixed interval until shut down.
///
/// The job body runs on the blocking pool, so it may do filesystem work or
/// take synchronous locks. Shutdown waits for an in-flight run to finish.
pub struct PeriodicTask {
    name: &'static str,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawns `job` every `period`. The first run happens one full period
    /// after spawning.
    ///
    /// Must be called from within a tokio runtime. `period` must be non-zero.
    pub fn spawn<F>(name: &'static str, period: Duration, job: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let job = Arc::new(job);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            debug!(task = name, period_ms = period.as_millis(), "periodic task started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let job = Arc::clone(&job);
                        if let Err(e) = tokio::task::spawn_blocking(move || job()).await {
                            warn!(task = name, error = %e, "periodic task run failed");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        debug!(task = name, "periodic task shutting down");
                        break;
                    }
                }
            }
        });

        Self {
            name,
            shutdown_tx,
            handle,
        }
    }

    /// Signals the task to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!(task = self.name, error = %e, "periodic task did not exit cleanly");
        }
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true once the task loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn runs_repeatedly_until_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let task = PeriodicTask::spawn("counter", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        task.shutdown().await;

        let after_shutdown = runs.load(Ordering::SeqCst);
        assert!(after_shutdown >= 2, "ran {after_shutdown} times");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_shutdown);
    }

    #[tokio::test]
    async fn first_run_waits_one_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let task = PeriodicTask::spawn("slow", Duration::from_secs(3600), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(task.name(), "slow");
        task.shutdown().await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn panicking_job_keeps_task_alive() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let task = PeriodicTask::spawn("flaky", Duration::from_millis(10), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            assert!(n != 0, "first run fails");
        });

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!task.is_finished());
        task.shutdown().await;

        assert!(runs.load(Ordering::SeqCst) >= 2);
    }
}
