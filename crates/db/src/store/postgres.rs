//! Postgres-backed store.
//!
//! Reads delegate straight to the repositories. Transitions run in one
//! transaction that locks the job row before touching offers or
//! applications, so two accepts racing for a job's last slot serialise on
//! the lock and the loser's conditional `UPDATE` matches no row.

use async_trait::async_trait;
use siteworks_core::actors::ActorRef;
use siteworks_core::hiring::{ApplicationStatus, JobKind, JobStatus, OfferStatus};
use siteworks_core::search::{JobSearch, Page};
use siteworks_core::types::{DbId, Timestamp};

use crate::models::application::{AcceptedApplication, JobApplication, NewApplication};
use crate::models::conversation::{Conversation, Message};
use crate::models::job::{CreateJob, Job, UpdateJob};
use crate::models::notification::{NewNotification, Notification};
use crate::models::offer::{AcceptedOffer, NewOffer, Offer};
use crate::repositories::{
    ApplicationRepo, ConversationRepo, JobRepo, NotificationRepo, OfferRepo,
};
use crate::store::{
    conflict, not_found, ApplicationRepository, ConversationRepository, JobRepository,
    NotificationRepository, OfferRepository, StoreResult,
};
use crate::DbPool;

/// [`HiringStore`](crate::store::HiringStore) over a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[async_trait]
impl JobRepository for PgStore {
    async fn create_job(
        &self,
        company_id: DbId,
        kind: JobKind,
        input: &CreateJob,
    ) -> StoreResult<Job> {
        Ok(JobRepo::create(&self.pool, company_id, kind, input).await?)
    }

    async fn find_job(&self, id: DbId) -> StoreResult<Option<Job>> {
        Ok(JobRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_jobs_for_company(&self, company_id: DbId) -> StoreResult<Vec<Job>> {
        Ok(JobRepo::list_by_company(&self.pool, company_id).await?)
    }

    async fn search_jobs(
        &self,
        search: &JobSearch,
        now: Timestamp,
    ) -> StoreResult<(Vec<Job>, i64)> {
        Ok(JobRepo::search(&self.pool, search, now).await?)
    }

    async fn update_job(&self, id: DbId, input: &UpdateJob) -> StoreResult<Job> {
        match JobRepo::update_pending(&self.pool, id, input).await? {
            Some(job) => Ok(job),
            None => match JobRepo::find_by_id(&self.pool, id).await? {
                Some(job) => conflict(format!(
                    "Job {id} is {} and can no longer be edited",
                    job.status
                )),
                None => not_found("Job", id),
            },
        }
    }

    async fn delete_job(&self, id: DbId) -> StoreResult<()> {
        if JobRepo::delete_pending(&self.pool, id).await? {
            return Ok(());
        }
        match JobRepo::find_by_id(&self.pool, id).await? {
            Some(job) => conflict(format!(
                "Job {id} is {} and can no longer be deleted",
                job.status
            )),
            None => not_found("Job", id),
        }
    }

    async fn start_job(&self, id: DbId, started_at: Timestamp) -> StoreResult<Option<Job>> {
        if let Some(job) = JobRepo::start_pending(&self.pool, id, started_at).await? {
            return Ok(Some(job));
        }
        match JobRepo::find_by_id(&self.pool, id).await? {
            Some(_) => Ok(None),
            None => not_found("Job", id),
        }
    }

    async fn list_due_job_ids(&self, now: Timestamp) -> StoreResult<Vec<DbId>> {
        Ok(JobRepo::list_due_ids(&self.pool, now).await?)
    }
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

#[async_trait]
impl ApplicationRepository for PgStore {
    async fn create_application(&self, input: &NewApplication) -> StoreResult<JobApplication> {
        match ApplicationRepo::create(&self.pool, input).await? {
            Some(application) => Ok(application),
            None => conflict(format!(
                "Job {} is not open for applications",
                input.job_id
            )),
        }
    }

    async fn find_application(&self, id: DbId) -> StoreResult<Option<JobApplication>> {
        Ok(ApplicationRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_applications_for_job(
        &self,
        job_id: DbId,
        status: Option<ApplicationStatus>,
    ) -> StoreResult<Vec<JobApplication>> {
        Ok(ApplicationRepo::list_by_job(&self.pool, job_id, status).await?)
    }

    async fn list_applications_for_subcontractor(
        &self,
        subcontractor_id: DbId,
    ) -> StoreResult<Vec<JobApplication>> {
        Ok(ApplicationRepo::list_by_subcontractor(&self.pool, subcontractor_id).await?)
    }

    async fn accept_application(
        &self,
        id: DbId,
        responded_at: Timestamp,
    ) -> StoreResult<AcceptedApplication> {
        let mut tx = self.pool.begin().await?;

        let Some(job_id) = ApplicationRepo::job_id_of(&mut tx, id).await? else {
            return not_found("Application", id);
        };
        let Some(locked) = JobRepo::lock(&mut tx, job_id).await? else {
            return not_found("Job", job_id);
        };

        let Some(application) =
            ApplicationRepo::respond_in(&mut tx, id, ApplicationStatus::Accepted, responded_at)
                .await?
        else {
            return conflict(format!("Application {id} is no longer pending"));
        };

        // The row is locked, so the in-process check is authoritative for the
        // error message; the conditional UPDATE below enforces it.
        locked.clone().assign_worker(application.subcontractor_id)?;
        let Some(job) =
            JobRepo::assign_worker(&mut tx, job_id, application.subcontractor_id).await?
        else {
            return conflict(format!("Job {job_id} has no open positions"));
        };

        let auto_rejected =
            ApplicationRepo::reject_pending_siblings(&mut tx, job_id, id, responded_at).await?;

        tx.commit().await?;

        let job_started =
            locked.status == JobStatus::Pending && job.status == JobStatus::InProgress;
        Ok(AcceptedApplication {
            application,
            job,
            auto_rejected,
            job_started,
        })
    }

    async fn respond_to_application(
        &self,
        id: DbId,
        status: ApplicationStatus,
        responded_at: Timestamp,
    ) -> StoreResult<JobApplication> {
        if let Some(application) =
            ApplicationRepo::respond(&self.pool, id, status, responded_at).await?
        {
            return Ok(application);
        }
        match ApplicationRepo::find_by_id(&self.pool, id).await? {
            Some(current) => conflict(format!(
                "Application {id} is already {}",
                current.status
            )),
            None => not_found("Application", id),
        }
    }
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------

#[async_trait]
impl OfferRepository for PgStore {
    async fn create_offer(&self, job_id: DbId, input: &NewOffer) -> StoreResult<Offer> {
        let mut tx = self.pool.begin().await?;

        let Some(job) = JobRepo::lock(&mut tx, job_id).await? else {
            return not_found("Job", job_id);
        };
        if !job.status.accepts_offers() {
            return conflict(format!("Job {job_id} is {} and cannot take offers", job.status));
        }
        if !job.has_capacity() {
            return conflict(format!("Job {job_id} has no open positions"));
        }

        let offer = OfferRepo::create_in(&mut tx, job_id, input).await?;
        tx.commit().await?;
        Ok(offer)
    }

    async fn create_job_with_offer(
        &self,
        job: &CreateJob,
        input: &NewOffer,
    ) -> StoreResult<(Job, Offer)> {
        let mut tx = self.pool.begin().await?;
        let job = JobRepo::create_in(&mut tx, input.company_id, JobKind::Offer, job).await?;
        let offer = OfferRepo::create_in(&mut tx, job.id, input).await?;
        tx.commit().await?;
        Ok((job, offer))
    }

    async fn find_offer(&self, id: DbId) -> StoreResult<Option<Offer>> {
        Ok(OfferRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_offers_for_company(&self, company_id: DbId) -> StoreResult<Vec<Offer>> {
        Ok(OfferRepo::list_by_company(&self.pool, company_id).await?)
    }

    async fn list_offers_for_subcontractor(
        &self,
        subcontractor_id: DbId,
    ) -> StoreResult<Vec<Offer>> {
        Ok(OfferRepo::list_by_subcontractor(&self.pool, subcontractor_id).await?)
    }

    async fn list_offers_for_job(&self, job_id: DbId) -> StoreResult<Vec<Offer>> {
        Ok(OfferRepo::list_by_job(&self.pool, job_id).await?)
    }

    async fn accept_offer(&self, id: DbId, now: Timestamp) -> StoreResult<AcceptedOffer> {
        let mut tx = self.pool.begin().await?;

        let Some(job_id) = OfferRepo::job_id_of(&mut tx, id).await? else {
            return not_found("Offer", id);
        };
        let Some(locked) = JobRepo::lock(&mut tx, job_id).await? else {
            return not_found("Job", job_id);
        };

        let Some(offer) = OfferRepo::accept_in(&mut tx, id, now).await? else {
            drop(tx);
            return match OfferRepo::find_by_id(&self.pool, id).await? {
                Some(current) if current.status != OfferStatus::Pending => {
                    conflict(format!("Offer {id} is already {}", current.status))
                }
                Some(_) => conflict(format!("Offer {id} has expired")),
                None => not_found("Offer", id),
            };
        };

        locked.clone().assign_worker(offer.subcontractor_id)?;
        let Some(job) = JobRepo::assign_worker(&mut tx, job_id, offer.subcontractor_id).await?
        else {
            return conflict(format!("Job {job_id} has no open positions"));
        };

        tx.commit().await?;

        let job_started =
            locked.status == JobStatus::Pending && job.status == JobStatus::InProgress;
        Ok(AcceptedOffer {
            offer,
            job,
            job_started,
        })
    }

    async fn respond_to_offer(
        &self,
        id: DbId,
        status: OfferStatus,
        responded_at: Timestamp,
    ) -> StoreResult<Offer> {
        if let Some(offer) = OfferRepo::respond(&self.pool, id, status, responded_at).await? {
            return Ok(offer);
        }
        match OfferRepo::find_by_id(&self.pool, id).await? {
            Some(current) => conflict(format!("Offer {id} is already {}", current.status)),
            None => not_found("Offer", id),
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[async_trait]
impl NotificationRepository for PgStore {
    async fn insert_notification(&self, input: &NewNotification) -> StoreResult<Notification> {
        Ok(NotificationRepo::create(&self.pool, input).await?)
    }

    async fn list_notifications(
        &self,
        receiver: ActorRef,
        unread_only: bool,
        page: Page,
    ) -> StoreResult<(Vec<Notification>, i64)> {
        Ok(NotificationRepo::list_for_receiver(&self.pool, receiver, unread_only, page).await?)
    }

    async fn unread_notification_count(&self, receiver: ActorRef) -> StoreResult<i64> {
        Ok(NotificationRepo::unread_count(&self.pool, receiver).await?)
    }

    async fn mark_notification_read(
        &self,
        id: DbId,
        receiver: ActorRef,
    ) -> StoreResult<Option<Notification>> {
        Ok(NotificationRepo::mark_read(&self.pool, id, receiver).await?)
    }

    async fn mark_all_notifications_read(&self, receiver: ActorRef) -> StoreResult<u64> {
        Ok(NotificationRepo::mark_all_read(&self.pool, receiver).await?)
    }

    async fn delete_notification(&self, id: DbId, receiver: ActorRef) -> StoreResult<bool> {
        Ok(NotificationRepo::delete(&self.pool, id, receiver).await?)
    }
}

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

#[async_trait]
impl ConversationRepository for PgStore {
    async fn find_or_create_conversation(
        &self,
        company_id: DbId,
        subcontractor_id: DbId,
    ) -> StoreResult<Conversation> {
        Ok(ConversationRepo::find_or_create(&self.pool, company_id, subcontractor_id).await?)
    }

    async fn find_conversation(&self, id: DbId) -> StoreResult<Option<Conversation>> {
        Ok(ConversationRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_conversations(&self, actor: ActorRef) -> StoreResult<Vec<Conversation>> {
        Ok(ConversationRepo::list_for_actor(&self.pool, actor).await?)
    }

    async fn insert_message(
        &self,
        conversation_id: DbId,
        sender: ActorRef,
        content: &str,
        attachments: &[String],
        sent_at: Timestamp,
    ) -> StoreResult<Message> {
        Ok(ConversationRepo::insert_message(
            &self.pool,
            conversation_id,
            sender,
            content,
            attachments,
            sent_at,
        )
        .await?)
    }

    async fn list_messages(
        &self,
        conversation_id: DbId,
        limit: i64,
        skip: i64,
    ) -> StoreResult<Vec<Message>> {
        Ok(ConversationRepo::list_messages(&self.pool, conversation_id, limit, skip).await?)
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: DbId,
        reader: ActorRef,
    ) -> StoreResult<()> {
        Ok(ConversationRepo::mark_read(&self.pool, conversation_id, reader).await?)
    }
}
