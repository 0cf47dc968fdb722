//! Cancellable fixed-period task runner.
//!
//! The first cycle runs immediately, later ones every `period`. Cycles run
//! back to back on one task, so they never overlap; a late cycle delays the
//! next tick instead of bursting. On cancellation no new cycle starts and an
//! in-flight one gets `grace` to finish before it is abandoned.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[async_trait]
pub trait PeriodicJob: Send + Sync + 'static {
    fn name(&self) -> &str;
    async fn run_once(&self) -> Result<()>;
}

pub struct PeriodicTaskHandle {
    name: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PeriodicTaskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel and wait for the task to wind down.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            error!("PeriodicTask[{}]: task ended abnormally: {}", self.name, e);
        }
    }

    /// Wait without cancelling; returns once the shared token is cancelled
    /// elsewhere and the task has wound down.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            error!("PeriodicTask[{}]: task ended abnormally: {}", self.name, e);
        }
    }
}

/// Spawn `job` on a fixed period. `cancel` is typically a child of the process
/// shutdown token.
pub fn spawn_periodic(
    job: Arc<dyn PeriodicJob>,
    period: Duration,
    grace: Duration,
    cancel: CancellationToken,
) -> PeriodicTaskHandle {
    let name = job.name().to_string();
    let task_cancel = cancel.clone();
    let handle = tokio::spawn(run_loop(job, period, grace, task_cancel));
    PeriodicTaskHandle {
        name,
        cancel,
        handle,
    }
}

async fn run_loop(
    job: Arc<dyn PeriodicJob>,
    period: Duration,
    grace: Duration,
    cancel: CancellationToken,
) {
    info!("PeriodicTask[{}]: started (interval: {:?})", job.name(), period);

    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let cycle = job.run_once();
        tokio::pin!(cycle);

        tokio::select! {
            result = &mut cycle => log_result(job.name(), result),
            _ = cancel.cancelled() => {
                info!(
                    "PeriodicTask[{}]: shutdown requested, waiting up to {:?} for running cycle",
                    job.name(),
                    grace
                );
                match time::timeout(grace, &mut cycle).await {
                    Ok(result) => log_result(job.name(), result),
                    Err(_) => warn!(
                        "PeriodicTask[{}]: cycle abandoned after {:?} grace",
                        job.name(),
                        grace
                    ),
                }
                break;
            }
        }
    }

    info!("PeriodicTask[{}]: stopped", job.name());
}

fn log_result(name: &str, result: Result<()>) {
    if let Err(e) = result {
        error!("PeriodicTask[{}]: cycle failed: {:#}", name, e);
    }
}
