//! In-process store.
//!
//! All state sits behind one async mutex and every trait method takes the
//! lock exactly once, so each transition is a single critical section. Used
//! for `STORAGE_BACKEND=memory` and by the test suites.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use siteworks_core::actors::{ActorRef, ActorType};
use siteworks_core::hiring::{ApplicationStatus, JobKind, JobStatus, OfferStatus};
use siteworks_core::search::{JobSearch, Page};
use siteworks_core::types::{DbId, Timestamp};
use tokio::sync::Mutex;

use crate::models::application::{AcceptedApplication, JobApplication, NewApplication};
use crate::models::conversation::{Conversation, Message};
use crate::models::job::{CreateJob, Job, UpdateJob};
use crate::models::notification::{NewNotification, Notification};
use crate::models::offer::{AcceptedOffer, NewOffer, Offer};
use crate::store::{
    conflict, not_found, ApplicationRepository, ConversationRepository, JobRepository,
    NotificationRepository, OfferRepository, StoreResult,
};

struct Table<T> {
    last_id: DbId,
    rows: BTreeMap<DbId, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            last_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    /// Rows newest first (ids are monotonic).
    fn newest_first(&self) -> impl Iterator<Item = &T> {
        self.rows.values().rev()
    }
}

#[derive(Default)]
struct State {
    jobs: Table<Job>,
    applications: Table<JobApplication>,
    offers: Table<Offer>,
    notifications: Table<Notification>,
    conversations: Table<Conversation>,
    messages: Table<Message>,
}

impl State {
    fn insert_job(&mut self, company_id: DbId, kind: JobKind, input: &CreateJob) -> Job {
        let now = Utc::now();
        let job = Job {
            id: self.jobs.next_id(),
            company_id,
            title: input.title.trim().to_string(),
            trade: input.trade,
            description: input.description.trim().to_string(),
            site_address: input.site_address.trim().to_string(),
            timeline_start_date: input.timeline_start_date,
            timeline_end_date: input.timeline_end_date,
            hourly_rate: input.hourly_rate,
            workers_required: input.workers_required,
            project_documents: input.project_documents.clone(),
            kind,
            status: JobStatus::Pending,
            assigned_workers: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.jobs.rows.insert(job.id, job.clone());
        job
    }

    fn insert_offer(&mut self, job_id: DbId, input: &NewOffer) -> StoreResult<Offer> {
        let duplicate = self
            .offers
            .rows
            .values()
            .any(|o| o.job_id == job_id && o.subcontractor_id == input.subcontractor_id);
        if duplicate {
            return conflict(format!(
                "An offer for job {job_id} was already sent to subcontractor {}",
                input.subcontractor_id
            ));
        }
        let offer = Offer {
            id: self.offers.next_id(),
            job_id,
            company_id: input.company_id,
            subcontractor_id: input.subcontractor_id,
            status: OfferStatus::Pending,
            message: input.message.clone(),
            sent_at: input.sent_at,
            responded_at: None,
            expires_at: input.expires_at,
        };
        self.offers.rows.insert(offer.id, offer.clone());
        Ok(offer)
    }
}

/// [`HiringStore`](crate::store::HiringStore) kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[async_trait]
impl JobRepository for MemoryStore {
    async fn create_job(
        &self,
        company_id: DbId,
        kind: JobKind,
        input: &CreateJob,
    ) -> StoreResult<Job> {
        let mut state = self.state.lock().await;
        Ok(state.insert_job(company_id, kind, input))
    }

    async fn find_job(&self, id: DbId) -> StoreResult<Option<Job>> {
        let state = self.state.lock().await;
        Ok(state.jobs.rows.get(&id).cloned())
    }

    async fn list_jobs_for_company(&self, company_id: DbId) -> StoreResult<Vec<Job>> {
        let state = self.state.lock().await;
        Ok(state
            .jobs
            .newest_first()
            .filter(|j| j.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn search_jobs(
        &self,
        search: &JobSearch,
        now: Timestamp,
    ) -> StoreResult<(Vec<Job>, i64)> {
        let state = self.state.lock().await;
        let matching: Vec<&Job> = state
            .jobs
            .newest_first()
            .filter(|j| j.is_open_for_applications(now) && j.has_capacity())
            .filter(|j| {
                search.matches(j.trade, j.hourly_rate, &j.site_address, j.timeline_start_date)
            })
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(search.page.offset() as usize)
            .take(search.page.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn update_job(&self, id: DbId, input: &UpdateJob) -> StoreResult<Job> {
        let mut state = self.state.lock().await;
        let Some(job) = state.jobs.rows.get_mut(&id) else {
            return not_found("Job", id);
        };
        if !job.status.is_editable() {
            return conflict(format!(
                "Job {id} is {} and can no longer be edited",
                job.status
            ));
        }
        input.validate_against(job)?;
        input.apply_to(job);
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    async fn delete_job(&self, id: DbId) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let Some(job) = state.jobs.rows.get(&id) else {
            return not_found("Job", id);
        };
        if !job.status.is_editable() {
            return conflict(format!(
                "Job {id} is {} and can no longer be deleted",
                job.status
            ));
        }
        state.jobs.rows.remove(&id);
        state.applications.rows.retain(|_, a| a.job_id != id);
        state.offers.rows.retain(|_, o| o.job_id != id);
        Ok(())
    }

    async fn start_job(&self, id: DbId, started_at: Timestamp) -> StoreResult<Option<Job>> {
        let mut state = self.state.lock().await;
        let Some(job) = state.jobs.rows.get_mut(&id) else {
            return not_found("Job", id);
        };
        if job.status != JobStatus::Pending {
            return Ok(None);
        }
        job.status = JobStatus::InProgress;
        job.timeline_start_date = started_at;
        job.updated_at = Utc::now();
        Ok(Some(job.clone()))
    }

    async fn list_due_job_ids(&self, now: Timestamp) -> StoreResult<Vec<DbId>> {
        let state = self.state.lock().await;
        let mut due: Vec<&Job> = state
            .jobs
            .rows
            .values()
            .filter(|j| j.status == JobStatus::Pending && j.timeline_start_date <= now)
            .collect();
        due.sort_by_key(|j| (j.timeline_start_date, j.id));
        Ok(due.into_iter().map(|j| j.id).collect())
    }
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

#[async_trait]
impl ApplicationRepository for MemoryStore {
    async fn create_application(&self, input: &NewApplication) -> StoreResult<JobApplication> {
        let mut state = self.state.lock().await;

        let Some(job) = state.jobs.rows.get(&input.job_id) else {
            return not_found("Job", input.job_id);
        };
        if !job.is_open_for_applications(input.applied_at) {
            return conflict(format!("Job {} is not open for applications", input.job_id));
        }
        let company_id = job.company_id;

        let duplicate = state.applications.rows.values().any(|a| {
            a.job_id == input.job_id
                && a.subcontractor_id == input.subcontractor_id
                && a.status.is_active()
        });
        if duplicate {
            return conflict(format!(
                "Subcontractor {} already applied to job {}",
                input.subcontractor_id, input.job_id
            ));
        }

        let application = JobApplication {
            id: state.applications.next_id(),
            job_id: input.job_id,
            subcontractor_id: input.subcontractor_id,
            company_id,
            status: ApplicationStatus::Pending,
            full_name: input.full_name.clone(),
            proposed_rate: input.proposed_rate,
            message: input.message.clone(),
            documents: input.documents.clone(),
            applied_at: input.applied_at,
            responded_at: None,
        };
        state
            .applications
            .rows
            .insert(application.id, application.clone());
        Ok(application)
    }

    async fn find_application(&self, id: DbId) -> StoreResult<Option<JobApplication>> {
        let state = self.state.lock().await;
        Ok(state.applications.rows.get(&id).cloned())
    }

    async fn list_applications_for_job(
        &self,
        job_id: DbId,
        status: Option<ApplicationStatus>,
    ) -> StoreResult<Vec<JobApplication>> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .newest_first()
            .filter(|a| a.job_id == job_id && status.map_or(true, |s| a.status == s))
            .cloned()
            .collect())
    }

    async fn list_applications_for_subcontractor(
        &self,
        subcontractor_id: DbId,
    ) -> StoreResult<Vec<JobApplication>> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .newest_first()
            .filter(|a| a.subcontractor_id == subcontractor_id)
            .cloned()
            .collect())
    }

    async fn accept_application(
        &self,
        id: DbId,
        responded_at: Timestamp,
    ) -> StoreResult<AcceptedApplication> {
        let mut state = self.state.lock().await;

        let Some(application) = state.applications.rows.get(&id).cloned() else {
            return not_found("Application", id);
        };
        if application.status != ApplicationStatus::Pending {
            return conflict(format!("Application {id} is already {}", application.status));
        }
        let Some(job) = state.jobs.rows.get_mut(&application.job_id) else {
            return not_found("Job", application.job_id);
        };

        // Validate on a copy so a refusal leaves the row untouched.
        let mut updated = job.clone();
        let job_started = updated.assign_worker(application.subcontractor_id)?;
        updated.updated_at = Utc::now();
        *job = updated.clone();

        let mut accepted = application;
        accepted.status = ApplicationStatus::Accepted;
        accepted.responded_at = Some(responded_at);
        state.applications.rows.insert(id, accepted.clone());

        let mut auto_rejected = Vec::new();
        for sibling in state.applications.rows.values_mut() {
            if sibling.job_id == accepted.job_id
                && sibling.id != id
                && sibling.status == ApplicationStatus::Pending
            {
                sibling.status = ApplicationStatus::Rejected;
                sibling.responded_at = Some(responded_at);
                auto_rejected.push(sibling.clone());
            }
        }

        Ok(AcceptedApplication {
            application: accepted,
            job: updated,
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
        let mut state = self.state.lock().await;
        let Some(application) = state.applications.rows.get_mut(&id) else {
            return not_found("Application", id);
        };
        if !application.status.can_transition(status) {
            return conflict(format!("Application {id} is already {}", application.status));
        }
        application.status = status;
        application.responded_at = Some(responded_at);
        Ok(application.clone())
    }
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------

#[async_trait]
impl OfferRepository for MemoryStore {
    async fn create_offer(&self, job_id: DbId, input: &NewOffer) -> StoreResult<Offer> {
        let mut state = self.state.lock().await;
        let Some(job) = state.jobs.rows.get(&job_id) else {
            return not_found("Job", job_id);
        };
        if !job.status.accepts_offers() {
            return conflict(format!("Job {job_id} is {} and cannot take offers", job.status));
        }
        if !job.has_capacity() {
            return conflict(format!("Job {job_id} has no open positions"));
        }
        state.insert_offer(job_id, input)
    }

    async fn create_job_with_offer(
        &self,
        job: &CreateJob,
        input: &NewOffer,
    ) -> StoreResult<(Job, Offer)> {
        let mut state = self.state.lock().await;
        let job = state.insert_job(input.company_id, JobKind::Offer, job);
        let offer = state.insert_offer(job.id, input)?;
        Ok((job, offer))
    }

    async fn find_offer(&self, id: DbId) -> StoreResult<Option<Offer>> {
        let state = self.state.lock().await;
        Ok(state.offers.rows.get(&id).cloned())
    }

    async fn list_offers_for_company(&self, company_id: DbId) -> StoreResult<Vec<Offer>> {
        let state = self.state.lock().await;
        Ok(state
            .offers
            .newest_first()
            .filter(|o| o.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn list_offers_for_subcontractor(
        &self,
        subcontractor_id: DbId,
    ) -> StoreResult<Vec<Offer>> {
        let state = self.state.lock().await;
        Ok(state
            .offers
            .newest_first()
            .filter(|o| o.subcontractor_id == subcontractor_id)
            .cloned()
            .collect())
    }

    async fn list_offers_for_job(&self, job_id: DbId) -> StoreResult<Vec<Offer>> {
        let state = self.state.lock().await;
        Ok(state
            .offers
            .newest_first()
            .filter(|o| o.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn accept_offer(&self, id: DbId, now: Timestamp) -> StoreResult<AcceptedOffer> {
        let mut state = self.state.lock().await;

        let Some(offer) = state.offers.rows.get(&id).cloned() else {
            return not_found("Offer", id);
        };
        if offer.status != OfferStatus::Pending {
            return conflict(format!("Offer {id} is already {}", offer.status));
        }
        if offer.is_expired(now) {
            return conflict(format!("Offer {id} has expired"));
        }
        let Some(job) = state.jobs.rows.get_mut(&offer.job_id) else {
            return not_found("Job", offer.job_id);
        };

        let mut updated = job.clone();
        let job_started = updated.assign_worker(offer.subcontractor_id)?;
        updated.updated_at = Utc::now();
        *job = updated.clone();

        let mut accepted = offer;
        accepted.status = OfferStatus::Accepted;
        accepted.responded_at = Some(now);
        state.offers.rows.insert(id, accepted.clone());

        Ok(AcceptedOffer {
            offer: accepted,
            job: updated,
            job_started,
        })
    }

    async fn respond_to_offer(
        &self,
        id: DbId,
        status: OfferStatus,
        responded_at: Timestamp,
    ) -> StoreResult<Offer> {
        let mut state = self.state.lock().await;
        let Some(offer) = state.offers.rows.get_mut(&id) else {
            return not_found("Offer", id);
        };
        if !offer.status.can_transition(status) {
            return conflict(format!("Offer {id} is already {}", offer.status));
        }
        offer.status = status;
        offer.responded_at = Some(responded_at);
        Ok(offer.clone())
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert_notification(&self, input: &NewNotification) -> StoreResult<Notification> {
        let mut state = self.state.lock().await;
        let notification = Notification {
            id: state.notifications.next_id(),
            notification_type: input.kind,
            title: input.title.clone(),
            message: input.message.clone(),
            sender_id: input.sender.id,
            sender_type: input.sender.actor_type,
            sender_name: input.sender.name.clone(),
            receiver_id: input.receiver.id,
            receiver_type: input.receiver.actor_type,
            related_entity_id: input.related_entity_id,
            related_entity_type: input.related_entity_type,
            data: input.data.clone(),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        state
            .notifications
            .rows
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        receiver: ActorRef,
        unread_only: bool,
        page: Page,
    ) -> StoreResult<(Vec<Notification>, i64)> {
        let state = self.state.lock().await;
        let matching: Vec<&Notification> = state
            .notifications
            .newest_first()
            .filter(|n| n.receiver() == receiver && (!unread_only || !n.is_read))
            .collect();
        let total = matching.len() as i64;
        let rows = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();
        Ok((rows, total))
    }

    async fn unread_notification_count(&self, receiver: ActorRef) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .rows
            .values()
            .filter(|n| n.receiver() == receiver && !n.is_read)
            .count() as i64)
    }

    async fn mark_notification_read(
        &self,
        id: DbId,
        receiver: ActorRef,
    ) -> StoreResult<Option<Notification>> {
        let mut state = self.state.lock().await;
        let Some(notification) = state
            .notifications
            .rows
            .get_mut(&id)
            .filter(|n| n.receiver() == receiver)
        else {
            return Ok(None);
        };
        if !notification.is_read {
            notification.is_read = true;
            notification.read_at = Some(Utc::now());
        }
        Ok(Some(notification.clone()))
    }

    async fn mark_all_notifications_read(&self, receiver: ActorRef) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut updated = 0;
        for notification in state.notifications.rows.values_mut() {
            if notification.receiver() == receiver && !notification.is_read {
                notification.is_read = true;
                notification.read_at = Some(now);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_notification(&self, id: DbId, receiver: ActorRef) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let owned = state
            .notifications
            .rows
            .get(&id)
            .is_some_and(|n| n.receiver() == receiver);
        if owned {
            state.notifications.rows.remove(&id);
        }
        Ok(owned)
    }
}

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn find_or_create_conversation(
        &self,
        company_id: DbId,
        subcontractor_id: DbId,
    ) -> StoreResult<Conversation> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .conversations
            .rows
            .values()
            .find(|c| c.company_id == company_id && c.subcontractor_id == subcontractor_id)
        {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let conversation = Conversation {
            id: state.conversations.next_id(),
            company_id,
            subcontractor_id,
            last_message: None,
            last_message_at: None,
            company_unread: 0,
            subcontractor_unread: 0,
            created_at: now,
            updated_at: now,
        };
        state
            .conversations
            .rows
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn find_conversation(&self, id: DbId) -> StoreResult<Option<Conversation>> {
        let state = self.state.lock().await;
        Ok(state.conversations.rows.get(&id).cloned())
    }

    async fn list_conversations(&self, actor: ActorRef) -> StoreResult<Vec<Conversation>> {
        let state = self.state.lock().await;
        let mut conversations: Vec<Conversation> = state
            .conversations
            .rows
            .values()
            .filter(|c| c.is_participant(actor))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| {
            let a_at = a.last_message_at.unwrap_or(a.created_at);
            let b_at = b.last_message_at.unwrap_or(b.created_at);
            b_at.cmp(&a_at).then(b.id.cmp(&a.id))
        });
        Ok(conversations)
    }

    async fn insert_message(
        &self,
        conversation_id: DbId,
        sender: ActorRef,
        content: &str,
        attachments: &[String],
        sent_at: Timestamp,
    ) -> StoreResult<Message> {
        let mut state = self.state.lock().await;
        let Some(conversation) = state.conversations.rows.get_mut(&conversation_id) else {
            return not_found("Conversation", conversation_id);
        };
        conversation.last_message = Some(content.to_string());
        conversation.last_message_at = Some(sent_at);
        conversation.updated_at = Utc::now();
        match sender.actor_type {
            ActorType::Company => conversation.subcontractor_unread += 1,
            _ => conversation.company_unread += 1,
        }

        let message = Message {
            id: state.messages.next_id(),
            conversation_id,
            sender_id: sender.id,
            sender_type: sender.actor_type,
            content: content.to_string(),
            attachments: attachments.to_vec(),
            is_read: false,
            created_at: sent_at,
        };
        state.messages.rows.insert(message.id, message.clone());
        Ok(message)
    }

    async fn list_messages(
        &self,
        conversation_id: DbId,
        limit: i64,
        skip: i64,
    ) -> StoreResult<Vec<Message>> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .rows
            .values()
            .filter(|m| m.conversation_id == conversation_id)
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: DbId,
        reader: ActorRef,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let Some(conversation) = state.conversations.rows.get_mut(&conversation_id) else {
            return not_found("Conversation", conversation_id);
        };
        match reader.actor_type {
            ActorType::Company => conversation.company_unread = 0,
            _ => conversation.subcontractor_unread = 0,
        }
        for message in state.messages.rows.values_mut() {
            let from_reader =
                message.sender_id == reader.id && message.sender_type == reader.actor_type;
            if message.conversation_id == conversation_id && !from_reader {
                message.is_read = true;
            }
        }
        Ok(())
    }
}
