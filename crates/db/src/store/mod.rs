//! Storage seam used by the lifecycle engine and the API.
//!
//! The traits describe every read and every atomic transition the engine
//! needs. Each transition method is all-or-nothing: it either applies every
//! row change (including cascades) or returns an error and changes nothing.
//! A refused conditional write surfaces as [`StoreError::Core`] carrying a
//! [`CoreError::Conflict`].
//!
//! Two implementations exist: [`PgStore`] (Postgres, one transaction per
//! transition) and [`MemoryStore`] (single-process, one critical section per
//! transition).

mod memory;
mod postgres;

use async_trait::async_trait;
use siteworks_core::actors::ActorRef;
use siteworks_core::error::CoreError;
use siteworks_core::hiring::{ApplicationStatus, JobKind, OfferStatus};
use siteworks_core::search::{JobSearch, Page};
use siteworks_core::types::{DbId, Timestamp};

use crate::models::application::{AcceptedApplication, JobApplication, NewApplication};
use crate::models::conversation::{Conversation, Message};
use crate::models::job::{CreateJob, Job, UpdateJob};
use crate::models::notification::{NewNotification, Notification};
use crate::models::offer::{AcceptedOffer, NewOffer, Offer};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors returned by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub(crate) fn conflict<T>(message: impl Into<String>) -> StoreResult<T> {
    Err(StoreError::Core(CoreError::Conflict(message.into())))
}

pub(crate) fn not_found<T>(entity: &'static str, id: DbId) -> StoreResult<T> {
    Err(StoreError::Core(CoreError::NotFound { entity, id }))
}

// ---------------------------------------------------------------------------
// Repository traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create_job(
        &self,
        company_id: DbId,
        kind: JobKind,
        input: &CreateJob,
    ) -> StoreResult<Job>;

    async fn find_job(&self, id: DbId) -> StoreResult<Option<Job>>;

    async fn list_jobs_for_company(&self, company_id: DbId) -> StoreResult<Vec<Job>>;

    /// Open `request` jobs matching the filters, one page plus the total.
    async fn search_jobs(&self, search: &JobSearch, now: Timestamp)
        -> StoreResult<(Vec<Job>, i64)>;

    /// Patch a job while it is still pending.
    async fn update_job(&self, id: DbId, input: &UpdateJob) -> StoreResult<Job>;

    /// Delete a pending job together with its offers and applications.
    async fn delete_job(&self, id: DbId) -> StoreResult<()>;

    /// `pending -> in_progress` with the timeline start set to `started_at`.
    ///
    /// `Ok(None)` when the job exists but is no longer pending.
    async fn start_job(&self, id: DbId, started_at: Timestamp) -> StoreResult<Option<Job>>;

    /// Pending jobs whose start time is at or before `now`.
    async fn list_due_job_ids(&self, now: Timestamp) -> StoreResult<Vec<DbId>>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Insert a pending application while the job is an open pending request
    /// and the pair has no active application.
    async fn create_application(&self, input: &NewApplication) -> StoreResult<JobApplication>;

    async fn find_application(&self, id: DbId) -> StoreResult<Option<JobApplication>>;

    async fn list_applications_for_job(
        &self,
        job_id: DbId,
        status: Option<ApplicationStatus>,
    ) -> StoreResult<Vec<JobApplication>>;

    async fn list_applications_for_subcontractor(
        &self,
        subcontractor_id: DbId,
    ) -> StoreResult<Vec<JobApplication>>;

    /// Accept a pending application: assign the worker under the capacity
    /// rule and reject every other pending application on the job.
    async fn accept_application(
        &self,
        id: DbId,
        responded_at: Timestamp,
    ) -> StoreResult<AcceptedApplication>;

    /// Move a pending application to `status` (rejected or withdrawn).
    async fn respond_to_application(
        &self,
        id: DbId,
        status: ApplicationStatus,
        responded_at: Timestamp,
    ) -> StoreResult<JobApplication>;
}

#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Attach an offer to a pending job with open capacity.
    async fn create_offer(&self, job_id: DbId, input: &NewOffer) -> StoreResult<Offer>;

    /// Create an `offer`-kind job and its offer together.
    async fn create_job_with_offer(
        &self,
        job: &CreateJob,
        input: &NewOffer,
    ) -> StoreResult<(Job, Offer)>;

    async fn find_offer(&self, id: DbId) -> StoreResult<Option<Offer>>;

    async fn list_offers_for_company(&self, company_id: DbId) -> StoreResult<Vec<Offer>>;

    async fn list_offers_for_subcontractor(&self, subcontractor_id: DbId)
        -> StoreResult<Vec<Offer>>;

    async fn list_offers_for_job(&self, job_id: DbId) -> StoreResult<Vec<Offer>>;

    /// Accept a pending, unexpired offer and assign the worker under the
    /// capacity rule.
    async fn accept_offer(&self, id: DbId, now: Timestamp) -> StoreResult<AcceptedOffer>;

    /// Move a pending offer to `status` (rejected or withdrawn).
    async fn respond_to_offer(
        &self,
        id: DbId,
        status: OfferStatus,
        responded_at: Timestamp,
    ) -> StoreResult<Offer>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, input: &NewNotification) -> StoreResult<Notification>;

    async fn list_notifications(
        &self,
        receiver: ActorRef,
        unread_only: bool,
        page: Page,
    ) -> StoreResult<(Vec<Notification>, i64)>;

    async fn unread_notification_count(&self, receiver: ActorRef) -> StoreResult<i64>;

    /// `None` when the notification does not exist or belongs to someone else.
    async fn mark_notification_read(
        &self,
        id: DbId,
        receiver: ActorRef,
    ) -> StoreResult<Option<Notification>>;

    async fn mark_all_notifications_read(&self, receiver: ActorRef) -> StoreResult<u64>;

    async fn delete_notification(&self, id: DbId, receiver: ActorRef) -> StoreResult<bool>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_or_create_conversation(
        &self,
        company_id: DbId,
        subcontractor_id: DbId,
    ) -> StoreResult<Conversation>;

    async fn find_conversation(&self, id: DbId) -> StoreResult<Option<Conversation>>;

    async fn list_conversations(&self, actor: ActorRef) -> StoreResult<Vec<Conversation>>;

    /// Persist a message, update the summary and bump the counterpart's
    /// unread counter.
    async fn insert_message(
        &self,
        conversation_id: DbId,
        sender: ActorRef,
        content: &str,
        attachments: &[String],
        sent_at: Timestamp,
    ) -> StoreResult<Message>;

    async fn list_messages(
        &self,
        conversation_id: DbId,
        limit: i64,
        skip: i64,
    ) -> StoreResult<Vec<Message>>;

    async fn mark_conversation_read(
        &self,
        conversation_id: DbId,
        reader: ActorRef,
    ) -> StoreResult<()>;
}

/// Everything the hiring backend persists.
pub trait HiringStore:
    JobRepository
    + ApplicationRepository
    + OfferRepository
    + NotificationRepository
    + ConversationRepository
{
}

impl<T> HiringStore for T where
    T: JobRepository
        + ApplicationRepository
        + OfferRepository
        + NotificationRepository
        + ConversationRepository
{
}
