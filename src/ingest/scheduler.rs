// src/ingest/scheduler.rs
use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

/// Longest period the timer is armed with; anything beyond never fires in practice
/// and would overflow `Instant` arithmetic.
const MAX_PERIOD: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Handle to a running fixed-period job.
pub struct SchedulerHandle {
    id: Uuid,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ask the loop to stop and wait for it. A cycle that is already running
    /// completes first.
    pub async fn shutdown(self) -> Result<()> {
        // Err only means the loop already exited.
        let _ = self.stop.send(true);
        self.task.await.context("scheduler task")?;
        tracing::info!(target: "scheduler", job_id = %self.id, "scheduler shut down");
        Ok(())
    }
}

/// Run `job` every `period`, first one period after start. Runs never overlap:
/// the job is awaited inline, and ticks missed while it runs are delayed.
pub fn spawn<F, Fut>(period: Duration, mut job: F) -> SchedulerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let id = Uuid::new_v4();
    let period = period.min(MAX_PERIOD);
    let (stop, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    tracing::debug!(target: "scheduler", job_id = %id, "tick");
                    job().await;
                }
            }
        }
    });

    tracing::info!(target: "scheduler", job_id = %id, period = ?period, "job created");
    SchedulerHandle { id, stop, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn first_run_waits_one_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let h = spawn(Duration::from_secs(60), move || {
            let r = r.clone();
            async move {
                r.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        h.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn huge_period_neither_panics_nor_fires() {
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let h = spawn(Duration::from_secs(u64::MAX / 3600 * 3600), move || {
            let r = r.clone();
            async move {
                r.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(3600)).await;
        h.shutdown().await.expect("scheduler task must not panic");
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let h = spawn(Duration::from_secs(10), move || {
            let r = r.clone();
            async move {
                r.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(35)).await;
        h.shutdown().await.unwrap();
        let seen = runs.load(Ordering::SeqCst);
        assert_eq!(seen, 3);

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), seen);
    }
}
