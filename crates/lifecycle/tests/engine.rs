//! Lifecycle engine integration tests against the in-memory store.

mod common;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use common::{
    application_input, company, harness, job_input, kinds_for, notifications_for, offer_for,
    subcontractor,
};
use siteworks_core::actors::ActorRef;
use siteworks_core::error::CoreError;
use siteworks_core::hiring::{ApplicationStatus, JobKind, JobStatus, OfferStatus};
use siteworks_core::notifications::NotificationKind;
use siteworks_db::models::job::UpdateJob;
use siteworks_db::models::offer::CreateOffer;
use siteworks_db::store::{JobRepository, StoreError};
use tokio::sync::Barrier;

type BoxedAccept = Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send>>;

// ---------------------------------------------------------------------------
// Test: Applications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_slot_apply_and_accept_starts_the_job() {
    let h = harness();
    let acme = company(1);
    let sam = subcontractor(10);
    let job = h.engine.create_job(&acme, &job_input(1)).await.unwrap();

    let application = h
        .engine
        .apply_to_job(&sam, &application_input(job.id))
        .await
        .unwrap();
    assert_eq!(application.company_id, acme.id);

    let accepted = h.engine.accept_application(&acme, application.id).await.unwrap();
    assert_eq!(accepted.application.status, ApplicationStatus::Accepted);
    assert_eq!(accepted.job.assigned_workers, vec![sam.id]);
    assert_eq!(accepted.job.status, JobStatus::InProgress);
    assert!(accepted.job_started);

    assert_eq!(
        kinds_for(&h.store, sam.actor()).await,
        vec![NotificationKind::ApplicationAccepted, NotificationKind::JobStatusUpdate]
    );
    // The company filled the job itself, so it gets no status update.
    assert_eq!(
        kinds_for(&h.store, acme.actor()).await,
        vec![NotificationKind::NewApplication]
    );
}

#[tokio::test]
async fn accepting_one_rejects_every_other_pending_application() {
    let h = harness();
    let acme = company(1);
    let job = h.engine.create_job(&acme, &job_input(3)).await.unwrap();

    let mut ids = Vec::new();
    for sub in [10, 11, 12] {
        let application = h
            .engine
            .apply_to_job(&subcontractor(sub), &application_input(job.id))
            .await
            .unwrap();
        ids.push(application.id);
    }

    let accepted = h.engine.accept_application(&acme, ids[0]).await.unwrap();
    assert_eq!(accepted.auto_rejected.len(), 2);
    assert!(!accepted.job_started);
    assert_eq!(accepted.job.status, JobStatus::Pending);

    for sub in [11, 12] {
        let notes = notifications_for(&h.store, ActorRef::subcontractor(sub)).await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notification_type, NotificationKind::ApplicationRejected);
        assert_eq!(notes[0].data["automatic"], true);
    }

    let pending = h
        .engine
        .list_job_applications(acme.actor(), job.id, Some(ApplicationStatus::Pending))
        .await
        .unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn only_the_owning_company_can_accept() {
    let h = harness();
    let job = h.engine.create_job(&company(1), &job_input(1)).await.unwrap();
    let application = h
        .engine
        .apply_to_job(&subcontractor(10), &application_input(job.id))
        .await
        .unwrap();

    let err = h
        .engine
        .accept_application(&company(2), application.id)
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::Forbidden(_)));

    let err = h
        .engine
        .accept_application(&subcontractor(10), application.id)
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::Forbidden(_)));
}

#[tokio::test]
async fn apply_refuses_offer_jobs_started_jobs_and_duplicates() {
    let h = harness();
    let acme = company(1);
    let sam = subcontractor(10);

    let (offer_job, _) = h
        .engine
        .send_offer(
            &acme,
            &CreateOffer {
                subcontractor_id: 20,
                job_id: None,
                job: Some(job_input(1)),
                message: None,
                expires_at: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(offer_job.kind, JobKind::Offer);
    assert_matches!(
        h.engine.apply_to_job(&sam, &application_input(offer_job.id)).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );

    let mut past = job_input(1);
    past.timeline_start_date = Utc::now() - Duration::hours(1);
    let started = h.engine.create_job(&acme, &past).await.unwrap();
    assert_matches!(
        h.engine.apply_to_job(&sam, &application_input(started.id)).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );

    let job = h.engine.create_job(&acme, &job_input(2)).await.unwrap();
    h.engine.apply_to_job(&sam, &application_input(job.id)).await.unwrap();
    assert_matches!(
        h.engine.apply_to_job(&sam, &application_input(job.id)).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );

    assert_matches!(
        h.engine.apply_to_job(&sam, &application_input(9999)).await,
        Err(StoreError::Core(CoreError::NotFound { .. }))
    );
}

#[tokio::test]
async fn withdrawn_application_notifies_company_and_frees_the_pair() {
    let h = harness();
    let acme = company(1);
    let sam = subcontractor(10);
    let job = h.engine.create_job(&acme, &job_input(1)).await.unwrap();
    let application = h
        .engine
        .apply_to_job(&sam, &application_input(job.id))
        .await
        .unwrap();

    assert_matches!(
        h.engine.withdraw_application(&subcontractor(11), application.id).await,
        Err(StoreError::Core(CoreError::Forbidden(_)))
    );
    let withdrawn = h.engine.withdraw_application(&sam, application.id).await.unwrap();
    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);
    assert_matches!(
        h.engine.accept_application(&acme, application.id).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );

    assert_eq!(
        kinds_for(&h.store, acme.actor()).await,
        vec![NotificationKind::ApplicationWithdrawn, NotificationKind::NewApplication]
    );
    assert!(h.engine.apply_to_job(&sam, &application_input(job.id)).await.is_ok());
}

#[tokio::test]
async fn reject_sends_a_single_notification() {
    let h = harness();
    let acme = company(1);
    let job = h.engine.create_job(&acme, &job_input(1)).await.unwrap();
    let application = h
        .engine
        .apply_to_job(&subcontractor(10), &application_input(job.id))
        .await
        .unwrap();

    let rejected = h.engine.reject_application(&acme, application.id).await.unwrap();
    assert_eq!(rejected.status, ApplicationStatus::Rejected);
    let notes = notifications_for(&h.store, ActorRef::subcontractor(10)).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].data["automatic"], false);
}

// ---------------------------------------------------------------------------
// Test: Offers
// ---------------------------------------------------------------------------

const RACE_ROUNDS: usize = 25;

/// Run two accepts released together by a barrier on separate workers.
async fn race(first: BoxedAccept, second: BoxedAccept) -> [Result<(), StoreError>; 2] {
    let barrier = Arc::new(Barrier::new(2));
    let spawn = |fut: BoxedAccept| {
        let barrier = barrier.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            fut.await
        })
    };
    let (a, b) = (spawn(first), spawn(second));
    [a.await.unwrap(), b.await.unwrap()]
}

fn assert_one_winner(results: &[Result<(), StoreError>; 2]) {
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::Core(CoreError::Conflict(_)))))
            .count(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_offer_accepts_for_last_slot_have_one_winner() {
    let h = harness();
    let acme = company(1);

    for _ in 0..RACE_ROUNDS {
        let job = h.engine.create_job(&acme, &job_input(1)).await.unwrap();
        let (_, o1) = h.engine.send_offer(&acme, &offer_for(20, job.id)).await.unwrap();
        let (_, o2) = h.engine.send_offer(&acme, &offer_for(21, job.id)).await.unwrap();

        let (e1, e2) = (h.engine.clone(), h.engine.clone());
        let results = race(
            Box::pin(async move { e1.accept_offer(&subcontractor(20), o1.id).await.map(drop) }),
            Box::pin(async move { e2.accept_offer(&subcontractor(21), o2.id).await.map(drop) }),
        )
        .await;
        assert_one_winner(&results);

        let job = h.store.find_job(job.id).await.unwrap().unwrap();
        assert_eq!(job.assigned_workers.len(), job.workers_required as usize);
        assert_eq!(job.status, JobStatus::InProgress);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_application_accepts_for_last_slot_have_one_winner() {
    let h = harness();
    let acme = company(1);

    for _ in 0..RACE_ROUNDS {
        let job = h.engine.create_job(&acme, &job_input(1)).await.unwrap();
        let a1 = h
            .engine
            .apply_to_job(&subcontractor(10), &application_input(job.id))
            .await
            .unwrap();
        let a2 = h
            .engine
            .apply_to_job(&subcontractor(11), &application_input(job.id))
            .await
            .unwrap();

        let (e1, e2) = (h.engine.clone(), h.engine.clone());
        let (c1, c2) = (acme.clone(), acme.clone());
        let results = race(
            Box::pin(async move { e1.accept_application(&c1, a1.id).await.map(drop) }),
            Box::pin(async move { e2.accept_application(&c2, a2.id).await.map(drop) }),
        )
        .await;
        assert_one_winner(&results);

        let job = h.store.find_job(job.id).await.unwrap().unwrap();
        assert_eq!(job.assigned_workers.len(), job.workers_required as usize);
        assert_eq!(job.status, JobStatus::InProgress);
    }
}

#[tokio::test]
async fn expired_offer_cannot_be_accepted_but_can_be_declined() {
    let h = harness();
    let acme = company(1);
    let sam = subcontractor(20);
    let job = h.engine.create_job(&acme, &job_input(1)).await.unwrap();
    let (_, offer) = h
        .engine
        .send_offer(
            &acme,
            &CreateOffer {
                subcontractor_id: sam.id,
                job_id: Some(job.id),
                job: None,
                message: None,
                expires_at: Some(Utc::now() - Duration::hours(1)),
            },
        )
        .await
        .unwrap();
    assert_eq!(offer.status, OfferStatus::Pending);

    let err = h.engine.accept_offer(&sam, offer.id).await.unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::Conflict(msg)) if msg.contains("expired"));

    let job = h.store.find_job(job.id).await.unwrap().unwrap();
    assert!(job.assigned_workers.is_empty());
    assert!(notifications_for(&h.store, acme.actor()).await.is_empty());

    let declined = h.engine.reject_offer(&sam, offer.id).await.unwrap();
    assert_eq!(declined.status, OfferStatus::Rejected);
    assert_eq!(
        kinds_for(&h.store, acme.actor()).await,
        vec![NotificationKind::OfferRejected]
    );
}

#[tokio::test]
async fn offer_accept_notifies_company_and_starts_full_job() {
    let h = harness();
    let acme = company(1);
    let sam = subcontractor(20);
    let (job, offer) = h
        .engine
        .send_offer(
            &acme,
            &CreateOffer {
                subcontractor_id: sam.id,
                job_id: None,
                job: Some(job_input(1)),
                message: Some("Can you start Monday?".into()),
                expires_at: Some(Utc::now() + Duration::days(1)),
            },
        )
        .await
        .unwrap();
    assert_eq!(job.company_id, acme.id);
    assert_eq!(kinds_for(&h.store, sam.actor()).await, vec![NotificationKind::OfferReceived]);

    assert_matches!(
        h.engine.accept_offer(&subcontractor(21), offer.id).await,
        Err(StoreError::Core(CoreError::Forbidden(_)))
    );
    let accepted = h.engine.accept_offer(&sam, offer.id).await.unwrap();
    assert!(accepted.job_started);
    assert_eq!(accepted.offer.status, OfferStatus::Accepted);

    assert_eq!(
        kinds_for(&h.store, acme.actor()).await,
        vec![NotificationKind::JobStatusUpdate, NotificationKind::OfferAccepted]
    );
}

#[tokio::test]
async fn offers_are_refused_for_started_jobs_and_duplicate_pairs() {
    let h = harness();
    let acme = company(1);
    let job = h.engine.create_job(&acme, &job_input(2)).await.unwrap();
    h.engine.send_offer(&acme, &offer_for(20, job.id)).await.unwrap();
    assert_matches!(
        h.engine.send_offer(&acme, &offer_for(20, job.id)).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );

    assert_matches!(
        h.engine.send_offer(&company(2), &offer_for(21, job.id)).await,
        Err(StoreError::Core(CoreError::Forbidden(_)))
    );

    h.engine.start_job(&acme, job.id).await.unwrap();
    assert_matches!(
        h.engine.send_offer(&acme, &offer_for(21, job.id)).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );
}

#[tokio::test]
async fn withdrawn_offer_notifies_subcontractor() {
    let h = harness();
    let acme = company(1);
    let job = h.engine.create_job(&acme, &job_input(1)).await.unwrap();
    let (_, offer) = h.engine.send_offer(&acme, &offer_for(20, job.id)).await.unwrap();

    let withdrawn = h.engine.withdraw_offer(&acme, offer.id).await.unwrap();
    assert_eq!(withdrawn.status, OfferStatus::Withdrawn);
    assert_eq!(
        kinds_for(&h.store, ActorRef::subcontractor(20)).await,
        vec![NotificationKind::OfferReceived, NotificationKind::OfferWithdrawn]
    );
    assert_matches!(
        h.engine.accept_offer(&subcontractor(20), offer.id).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );
}

// ---------------------------------------------------------------------------
// Test: Job start, edit and delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_starts_due_jobs_once() {
    let h = harness();
    let acme = company(1);
    let mut due = job_input(2);
    due.timeline_start_date = Utc::now() - Duration::minutes(5);
    let due = h.engine.create_job(&acme, &due).await.unwrap();
    let later = h.engine.create_job(&acme, &job_input(1)).await.unwrap();

    let now = Utc::now();
    assert_eq!(h.engine.sweep_due_jobs(now).await.unwrap(), 1);
    let due = h.store.find_job(due.id).await.unwrap().unwrap();
    assert_eq!(due.status, JobStatus::InProgress);
    assert_eq!(due.timeline_start_date, now);
    let later = h.store.find_job(later.id).await.unwrap().unwrap();
    assert_eq!(later.status, JobStatus::Pending);

    assert_eq!(h.engine.sweep_due_jobs(Utc::now()).await.unwrap(), 0);
    assert_eq!(
        kinds_for(&h.store, acme.actor()).await,
        vec![NotificationKind::JobStatusUpdate]
    );
}

#[tokio::test]
async fn sweep_skips_jobs_started_by_hand() {
    let h = harness();
    let acme = company(1);
    let mut input = job_input(1);
    input.timeline_start_date = Utc::now() - Duration::minutes(5);
    let job = h.engine.create_job(&acme, &input).await.unwrap();

    h.engine.start_job(&acme, job.id).await.unwrap();
    assert_eq!(h.engine.sweep_due_jobs(Utc::now()).await.unwrap(), 0);
    assert!(!h.engine.start_due_job(job.id, Utc::now()).await.unwrap());

    assert_matches!(
        h.engine.start_job(&acme, job.id).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );
}

#[tokio::test]
async fn manual_start_notifies_assigned_workers() {
    let h = harness();
    let acme = company(1);
    let job = h.engine.create_job(&acme, &job_input(2)).await.unwrap();
    let application = h
        .engine
        .apply_to_job(&subcontractor(10), &application_input(job.id))
        .await
        .unwrap();
    h.engine.accept_application(&acme, application.id).await.unwrap();

    let started = h.engine.start_job(&acme, job.id).await.unwrap();
    assert_eq!(started.status, JobStatus::InProgress);
    assert_eq!(
        kinds_for(&h.store, ActorRef::subcontractor(10)).await,
        vec![NotificationKind::ApplicationAccepted, NotificationKind::JobStatusUpdate]
    );
    // The company started it, so no status update for the company.
    assert_eq!(
        kinds_for(&h.store, acme.actor()).await,
        vec![NotificationKind::NewApplication]
    );
}

#[tokio::test]
async fn delete_cascades_while_pending_and_conflicts_after_start() {
    let h = harness();
    let acme = company(1);
    let job = h.engine.create_job(&acme, &job_input(2)).await.unwrap();
    let application = h
        .engine
        .apply_to_job(&subcontractor(10), &application_input(job.id))
        .await
        .unwrap();

    assert_matches!(
        h.engine.delete_job(&company(2), job.id).await,
        Err(StoreError::Core(CoreError::Forbidden(_)))
    );
    h.engine.delete_job(&acme, job.id).await.unwrap();
    assert_matches!(
        h.engine.get_job(acme.actor(), job.id).await,
        Err(StoreError::Core(CoreError::NotFound { .. }))
    );
    assert_matches!(
        h.engine.withdraw_application(&subcontractor(10), application.id).await,
        Err(StoreError::Core(CoreError::NotFound { .. }))
    );

    let job = h.engine.create_job(&acme, &job_input(1)).await.unwrap();
    h.engine.start_job(&acme, job.id).await.unwrap();
    assert_matches!(
        h.engine.delete_job(&acme, job.id).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );
}

#[tokio::test]
async fn update_is_validated_and_blocked_after_start() {
    let h = harness();
    let acme = company(1);
    let job = h.engine.create_job(&acme, &job_input(1)).await.unwrap();

    let patch = UpdateJob {
        hourly_rate: Some(45.0),
        ..Default::default()
    };
    let updated = h.engine.update_job(&acme, job.id, &patch).await.unwrap();
    assert_eq!(updated.hourly_rate, 45.0);

    let bad = UpdateJob {
        timeline_end_date: Some(job.timeline_start_date - Duration::days(1)),
        ..Default::default()
    };
    assert_matches!(
        h.engine.update_job(&acme, job.id, &bad).await,
        Err(StoreError::Core(CoreError::Validation(_)))
    );

    h.engine.start_job(&acme, job.id).await.unwrap();
    assert_matches!(
        h.engine.update_job(&acme, job.id, &patch).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );
}

#[tokio::test]
async fn owner_sees_applications_and_offers_on_job_detail() {
    let h = harness();
    let acme = company(1);
    let job = h.engine.create_job(&acme, &job_input(2)).await.unwrap();
    h.engine
        .apply_to_job(&subcontractor(10), &application_input(job.id))
        .await
        .unwrap();
    h.engine.send_offer(&acme, &offer_for(20, job.id)).await.unwrap();

    let detail = h.engine.get_job(acme.actor(), job.id).await.unwrap();
    assert_eq!(detail.applications.map(|a| a.len()), Some(1));
    assert_eq!(detail.offers.map(|o| o.len()), Some(1));

    let detail = h
        .engine
        .get_job(ActorRef::subcontractor(10), job.id)
        .await
        .unwrap();
    assert!(detail.applications.is_none());
    assert!(detail.offers.is_none());
}

#[tokio::test]
async fn invalid_job_input_is_a_validation_error() {
    let h = harness();
    let mut input = job_input(0);
    input.title = "  ".into();
    assert_matches!(
        h.engine.create_job(&company(1), &input).await,
        Err(StoreError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        h.engine.create_job(&subcontractor(1), &job_input(1)).await,
        Err(StoreError::Core(CoreError::Forbidden(_)))
    );
    let jobs = h.store.list_jobs_for_company(1).await.unwrap();
    assert!(jobs.is_empty());
}
