//! Periodic job start sweep.
//!
//! [`JobScheduler`] runs as a background task and, on every tick, starts
//! each pending job whose timeline start has passed. It goes through
//! [`LifecycleEngine::start_due_job`], the same conditional write as a
//! manual start, so a job started by hand in between is skipped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use siteworks_core::types::Timestamp;
use tokio_util::sync::CancellationToken;

use crate::engine::LifecycleEngine;

/// How often the scheduler sweeps by default.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

// ---------------------------------------------------------------------------
// JobScheduler
// ---------------------------------------------------------------------------

pub struct JobScheduler {
    engine: Arc<LifecycleEngine>,
    interval: Duration,
}

impl JobScheduler {
    pub fn new(engine: Arc<LifecycleEngine>) -> Self {
        Self {
            engine,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until `cancel` fires. The first sweep runs
    /// immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        tracing::info!(interval_secs = self.interval.as_secs(), "Job scheduler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep_once(Utc::now()).await;
                }
            }
        }
    }

    /// One sweep at `now`. Returns the number of jobs started.
    pub async fn sweep_once(&self, now: Timestamp) -> usize {
        match self.engine.sweep_due_jobs(now).await {
            Ok(0) => {
                tracing::debug!("Job sweep: nothing due");
                0
            }
            Ok(started) => {
                tracing::info!(started, "Job sweep: started due jobs");
                started
            }
            Err(e) => {
                tracing::error!(error = %e, "Job sweep failed");
                0
            }
        }
    }
}
