//! Job scheduler loop tests.

mod common;

use std::time::Duration;

use chrono::Utc;
use common::{company, harness, job_input};
use siteworks_core::hiring::JobStatus;
use siteworks_db::store::JobRepository;
use siteworks_lifecycle::JobScheduler;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn run_sweeps_on_start_and_stops_on_cancel() {
    let h = harness();
    let mut input = job_input(1);
    input.timeline_start_date = Utc::now() - chrono::Duration::minutes(1);
    let job = h.engine.create_job(&company(1), &input).await.unwrap();

    let scheduler = JobScheduler::new(h.engine.clone()).with_interval(Duration::from_millis(20));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { scheduler.run(cancel).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    handle.await.unwrap();

    let job = h.store.find_job(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::InProgress);
}

#[tokio::test]
async fn sweep_once_is_idempotent() {
    let h = harness();
    let mut input = job_input(1);
    input.timeline_start_date = Utc::now() - chrono::Duration::minutes(1);
    h.engine.create_job(&company(1), &input).await.unwrap();

    let scheduler = JobScheduler::new(h.engine.clone());
    assert_eq!(scheduler.sweep_once(Utc::now()).await, 1);
    assert_eq!(scheduler.sweep_once(Utc::now()).await, 0);
}
