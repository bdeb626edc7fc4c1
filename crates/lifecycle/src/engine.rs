//! Job lifecycle engine.
//!
//! [`LifecycleEngine`] is the only writer of jobs, applications and offers.
//! Each operation authorizes the acting party, checks the transition against
//! the current rows for a precise error, then hands the atomic write to the
//! store, which re-checks every condition inside its own transaction. Once
//! the write has committed, one notification per receiver goes through the
//! [`NotificationDispatcher`]; dispatch never fails the operation.

use std::sync::Arc;

use chrono::Utc;
use siteworks_core::actors::{ActorRef, ActorType, Party};
use siteworks_core::hiring::{validate_job_transition, ApplicationStatus, JobKind, JobStatus, OfferStatus};
use siteworks_core::search::JobSearch;
use siteworks_core::types::{DbId, Timestamp};
use siteworks_db::models::application::{
    AcceptedApplication, CreateApplication, JobApplication, NewApplication,
};
use siteworks_db::models::job::{CreateJob, Job, JobDetail, UpdateJob};
use siteworks_db::models::notification::NewNotification;
use siteworks_db::models::offer::{AcceptedOffer, CreateOffer, NewOffer, Offer, OfferTarget};
use siteworks_db::store::HiringStore;
use siteworks_events::NotificationDispatcher;

use crate::{conflict, forbidden, not_found, notices, EngineResult};

pub struct LifecycleEngine {
    store: Arc<dyn HiringStore>,
    notifier: Arc<NotificationDispatcher>,
}

impl LifecycleEngine {
    pub fn new(store: Arc<dyn HiringStore>, notifier: Arc<NotificationDispatcher>) -> Self {
        Self { store, notifier }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require_company(actor: ActorRef, action: &str) -> EngineResult<DbId> {
        match actor.actor_type {
            ActorType::Company => Ok(actor.id),
            _ => Err(forbidden(format!("Only companies can {action}"))),
        }
    }

    fn require_subcontractor(actor: ActorRef, action: &str) -> EngineResult<DbId> {
        match actor.actor_type {
            ActorType::Subcontractor => Ok(actor.id),
            _ => Err(forbidden(format!("Only subcontractors can {action}"))),
        }
    }

    async fn load_job(&self, id: DbId) -> EngineResult<Job> {
        self.store
            .find_job(id)
            .await?
            .ok_or_else(|| not_found("Job", id))
    }

    /// Load a job and verify `actor` is the owning company.
    async fn owned_job(&self, actor: ActorRef, id: DbId, action: &str) -> EngineResult<Job> {
        let company_id = Self::require_company(actor, action)?;
        let job = self.load_job(id).await?;
        if job.company_id != company_id {
            return Err(forbidden(format!("Cannot {action} another company's job")));
        }
        Ok(job)
    }

    async fn load_application(&self, id: DbId) -> EngineResult<JobApplication> {
        self.store
            .find_application(id)
            .await?
            .ok_or_else(|| not_found("Application", id))
    }

    async fn load_offer(&self, id: DbId) -> EngineResult<Offer> {
        self.store
            .find_offer(id)
            .await?
            .ok_or_else(|| not_found("Offer", id))
    }

    fn pending_application(application: &JobApplication, to: ApplicationStatus) -> EngineResult<()> {
        if application.status.can_transition(to) {
            Ok(())
        } else {
            Err(conflict(format!(
                "Application {} is already {}",
                application.id, application.status
            )))
        }
    }

    fn pending_offer(offer: &Offer, to: OfferStatus) -> EngineResult<()> {
        if offer.status.can_transition(to) {
            Ok(())
        } else {
            Err(conflict(format!("Offer {} is already {}", offer.id, offer.status)))
        }
    }

    async fn notify(&self, notices: Vec<NewNotification>) {
        self.notifier.dispatch_all(notices).await;
    }

    /// `JobStatusUpdate` to every assigned worker, and to the company unless
    /// it started the job itself.
    async fn notify_job_started(&self, job: &Job, acting: &Party) {
        let company = ActorRef::company(job.company_id);
        let mut receivers: Vec<ActorRef> = job
            .assigned_workers
            .iter()
            .map(|id| ActorRef::subcontractor(*id))
            .collect();
        if acting.actor() != company {
            receivers.push(company);
        }
        let outgoing = receivers
            .into_iter()
            .map(|receiver| notices::job_started(job, receiver, acting))
            .collect();
        self.notify(outgoing).await;
    }

    // -----------------------------------------------------------------------
    // Jobs
    // -----------------------------------------------------------------------

    pub async fn create_job(&self, actor: &Party, input: &CreateJob) -> EngineResult<Job> {
        let company_id = Self::require_company(actor.actor(), "post jobs")?;
        input.validate()?;
        let job = self
            .store
            .create_job(company_id, JobKind::Request, input)
            .await?;
        tracing::info!(job_id = job.id, company_id, trade = %job.trade, "Job created");
        Ok(job)
    }

    pub async fn list_company_jobs(&self, actor: ActorRef) -> EngineResult<Vec<Job>> {
        let company_id = Self::require_company(actor, "list their jobs")?;
        self.store.list_jobs_for_company(company_id).await
    }

    /// A job by id. The owning company also sees its applications and offers.
    pub async fn get_job(&self, viewer: ActorRef, id: DbId) -> EngineResult<JobDetail> {
        let job = self.load_job(id).await?;
        if viewer != ActorRef::company(job.company_id) {
            return Ok(JobDetail {
                job,
                applications: None,
                offers: None,
            });
        }
        let applications = self.store.list_applications_for_job(id, None).await?;
        let offers = self.store.list_offers_for_job(id).await?;
        Ok(JobDetail {
            job,
            applications: Some(applications),
            offers: Some(offers),
        })
    }

    pub async fn search_jobs(&self, search: &JobSearch) -> EngineResult<(Vec<Job>, i64)> {
        self.store.search_jobs(search, Utc::now()).await
    }

    pub async fn update_job(
        &self,
        actor: &Party,
        id: DbId,
        input: &UpdateJob,
    ) -> EngineResult<Job> {
        let job = self.owned_job(actor.actor(), id, "update").await?;
        if !job.status.is_editable() {
            return Err(conflict(format!(
                "Job {id} is {} and can no longer be edited",
                job.status
            )));
        }
        input.validate_against(&job)?;
        let job = self.store.update_job(id, input).await?;
        tracing::info!(job_id = id, "Job updated");
        Ok(job)
    }

    /// Delete a pending job together with its applications and offers.
    pub async fn delete_job(&self, actor: &Party, id: DbId) -> EngineResult<()> {
        let job = self.owned_job(actor.actor(), id, "delete").await?;
        if !job.status.is_editable() {
            return Err(conflict(format!(
                "Job {id} is {} and can no longer be deleted",
                job.status
            )));
        }
        self.store.delete_job(id).await?;
        tracing::info!(job_id = id, "Job deleted with its applications and offers");
        Ok(())
    }

    /// Manual start by the owning company. The timeline start becomes now.
    pub async fn start_job(&self, actor: &Party, id: DbId) -> EngineResult<Job> {
        let job = self.owned_job(actor.actor(), id, "start").await?;
        validate_job_transition(job.status, JobStatus::InProgress).map_err(conflict)?;

        let job = self
            .store
            .start_job(id, Utc::now())
            .await?
            .ok_or_else(|| conflict(format!("Job {id} is no longer pending")))?;
        tracing::info!(job_id = id, "Job started");

        self.notify_job_started(&job, actor).await;
        Ok(job)
    }

    /// Start one due job on behalf of the scheduler.
    ///
    /// `Ok(false)` when the job was no longer pending (already started by
    /// hand, filled, or deleted).
    pub async fn start_due_job(&self, id: DbId, now: Timestamp) -> EngineResult<bool> {
        let Some(job) = self.store.start_job(id, now).await? else {
            return Ok(false);
        };
        tracing::info!(job_id = id, "Job started by schedule");
        self.notify_job_started(&job, &Party::system()).await;
        Ok(true)
    }

    /// Start every pending job whose start time is at or before `now`.
    /// Returns the number started.
    pub async fn sweep_due_jobs(&self, now: Timestamp) -> EngineResult<usize> {
        let due = self.store.list_due_job_ids(now).await?;
        let mut started = 0;
        for id in due {
            match self.start_due_job(id, now).await {
                Ok(true) => started += 1,
                Ok(false) => {
                    tracing::debug!(job_id = id, "Due job already left pending, skipped");
                }
                Err(e) => {
                    tracing::error!(job_id = id, error = %e, "Failed to start due job");
                }
            }
        }
        Ok(started)
    }

    // -----------------------------------------------------------------------
    // Applications
    // -----------------------------------------------------------------------

    pub async fn apply_to_job(
        &self,
        actor: &Party,
        input: &CreateApplication,
    ) -> EngineResult<JobApplication> {
        let subcontractor_id = Self::require_subcontractor(actor.actor(), "apply to jobs")?;
        input.validate()?;

        let job = self.load_job(input.job_id).await?;
        let now = Utc::now();
        if job.kind != JobKind::Request {
            return Err(conflict(format!("Job {} only takes direct offers", job.id)));
        }
        if job.status != JobStatus::Pending {
            return Err(conflict(format!(
                "Job {} is {} and no longer takes applications",
                job.id, job.status
            )));
        }
        if job.timeline_start_date <= now {
            return Err(conflict(format!("Job {} has already started", job.id)));
        }

        let new = NewApplication::from_request(input, subcontractor_id, job.company_id, now);
        let application = self.store.create_application(&new).await?;
        tracing::info!(
            application_id = application.id,
            job_id = job.id,
            subcontractor_id,
            "Application submitted"
        );

        self.notify(vec![notices::new_application(&job, &application, actor)])
            .await;
        Ok(application)
    }

    /// Applications on a job, for its owning company.
    pub async fn list_job_applications(
        &self,
        viewer: ActorRef,
        job_id: DbId,
        status: Option<ApplicationStatus>,
    ) -> EngineResult<Vec<JobApplication>> {
        self.owned_job(viewer, job_id, "view applications for")
            .await?;
        self.store.list_applications_for_job(job_id, status).await
    }

    pub async fn list_my_applications(&self, viewer: ActorRef) -> EngineResult<Vec<JobApplication>> {
        let subcontractor_id = Self::require_subcontractor(viewer, "list their applications")?;
        self.store
            .list_applications_for_subcontractor(subcontractor_id)
            .await
    }

    /// Accept one application. Every other pending application on the job
    /// is rejected in the same write.
    pub async fn accept_application(
        &self,
        actor: &Party,
        id: DbId,
    ) -> EngineResult<AcceptedApplication> {
        let company_id = Self::require_company(actor.actor(), "accept applications")?;
        let application = self.load_application(id).await?;
        if application.company_id != company_id {
            return Err(forbidden("Cannot accept an application to another company's job"));
        }
        Self::pending_application(&application, ApplicationStatus::Accepted)?;

        let accepted = self.store.accept_application(id, Utc::now()).await?;
        tracing::info!(
            application_id = id,
            job_id = accepted.job.id,
            auto_rejected = accepted.auto_rejected.len(),
            job_started = accepted.job_started,
            "Application accepted"
        );

        let mut outgoing = vec![notices::application_accepted(
            &accepted.job,
            &accepted.application,
            actor,
        )];
        outgoing.extend(
            accepted
                .auto_rejected
                .iter()
                .map(|rejected| notices::application_rejected(&accepted.job, rejected, actor, true)),
        );
        self.notify(outgoing).await;
        if accepted.job_started {
            self.notify_job_started(&accepted.job, actor).await;
        }
        Ok(accepted)
    }

    pub async fn reject_application(&self, actor: &Party, id: DbId) -> EngineResult<JobApplication> {
        let company_id = Self::require_company(actor.actor(), "reject applications")?;
        let application = self.load_application(id).await?;
        if application.company_id != company_id {
            return Err(forbidden("Cannot reject an application to another company's job"));
        }
        Self::pending_application(&application, ApplicationStatus::Rejected)?;
        let job = self.load_job(application.job_id).await?;

        let application = self
            .store
            .respond_to_application(id, ApplicationStatus::Rejected, Utc::now())
            .await?;
        tracing::info!(application_id = id, job_id = job.id, "Application rejected");

        self.notify(vec![notices::application_rejected(&job, &application, actor, false)])
            .await;
        Ok(application)
    }

    pub async fn withdraw_application(
        &self,
        actor: &Party,
        id: DbId,
    ) -> EngineResult<JobApplication> {
        let subcontractor_id =
            Self::require_subcontractor(actor.actor(), "withdraw applications")?;
        let application = self.load_application(id).await?;
        if application.subcontractor_id != subcontractor_id {
            return Err(forbidden("Cannot withdraw another subcontractor's application"));
        }
        Self::pending_application(&application, ApplicationStatus::Withdrawn)?;
        let job = self.load_job(application.job_id).await?;

        let application = self
            .store
            .respond_to_application(id, ApplicationStatus::Withdrawn, Utc::now())
            .await?;
        tracing::info!(application_id = id, job_id = job.id, "Application withdrawn");

        self.notify(vec![notices::application_withdrawn(&job, &application, actor)])
            .await;
        Ok(application)
    }

    // -----------------------------------------------------------------------
    // Offers
    // -----------------------------------------------------------------------

    /// Send an offer, either with a new `offer`-kind job or for an existing
    /// job the company owns.
    pub async fn send_offer(&self, actor: &Party, input: &CreateOffer) -> EngineResult<(Job, Offer)> {
        let company_id = Self::require_company(actor.actor(), "send offers")?;
        let now = Utc::now();
        input.validate()?;

        let new = NewOffer {
            company_id,
            subcontractor_id: input.subcontractor_id,
            message: input.message.clone(),
            sent_at: now,
            expires_at: input.expires_at,
        };
        let (job, offer) = match input.target()? {
            OfferTarget::NewJob(job) => self.store.create_job_with_offer(&job, &new).await?,
            OfferTarget::ExistingJob(job_id) => {
                let job = self.owned_job(actor.actor(), job_id, "send offers for").await?;
                let offer = self.store.create_offer(job_id, &new).await?;
                (job, offer)
            }
        };
        tracing::info!(
            offer_id = offer.id,
            job_id = job.id,
            subcontractor_id = offer.subcontractor_id,
            "Offer sent"
        );

        self.notify(vec![notices::offer_received(&job, &offer, actor)])
            .await;
        Ok((job, offer))
    }

    pub async fn list_company_offers(&self, viewer: ActorRef) -> EngineResult<Vec<Offer>> {
        let company_id = Self::require_company(viewer, "list sent offers")?;
        self.store.list_offers_for_company(company_id).await
    }

    pub async fn list_my_offers(&self, viewer: ActorRef) -> EngineResult<Vec<Offer>> {
        let subcontractor_id = Self::require_subcontractor(viewer, "list received offers")?;
        self.store
            .list_offers_for_subcontractor(subcontractor_id)
            .await
    }

    pub async fn list_job_offers(&self, viewer: ActorRef, job_id: DbId) -> EngineResult<Vec<Offer>> {
        self.owned_job(viewer, job_id, "view offers for").await?;
        self.store.list_offers_for_job(job_id).await
    }

    /// Accept an offer. Refused once expired or when the job is full.
    pub async fn accept_offer(&self, actor: &Party, id: DbId) -> EngineResult<AcceptedOffer> {
        let subcontractor_id = Self::require_subcontractor(actor.actor(), "accept offers")?;
        let offer = self.load_offer(id).await?;
        if offer.subcontractor_id != subcontractor_id {
            return Err(forbidden("Cannot accept an offer sent to someone else"));
        }
        Self::pending_offer(&offer, OfferStatus::Accepted)?;
        let now = Utc::now();
        if offer.is_expired(now) {
            return Err(conflict(format!("Offer {id} has expired")));
        }

        let accepted = self.store.accept_offer(id, now).await?;
        tracing::info!(
            offer_id = id,
            job_id = accepted.job.id,
            job_started = accepted.job_started,
            "Offer accepted"
        );

        self.notify(vec![notices::offer_accepted(&accepted.job, &accepted.offer, actor)])
            .await;
        if accepted.job_started {
            self.notify_job_started(&accepted.job, actor).await;
        }
        Ok(accepted)
    }

    /// Decline an offer. Expired offers can still be declined.
    pub async fn reject_offer(&self, actor: &Party, id: DbId) -> EngineResult<Offer> {
        let subcontractor_id = Self::require_subcontractor(actor.actor(), "reject offers")?;
        let offer = self.load_offer(id).await?;
        if offer.subcontractor_id != subcontractor_id {
            return Err(forbidden("Cannot reject an offer sent to someone else"));
        }
        Self::pending_offer(&offer, OfferStatus::Rejected)?;
        let job = self.load_job(offer.job_id).await?;

        let offer = self
            .store
            .respond_to_offer(id, OfferStatus::Rejected, Utc::now())
            .await?;
        tracing::info!(offer_id = id, job_id = job.id, "Offer rejected");

        self.notify(vec![notices::offer_rejected(&job, &offer, actor)])
            .await;
        Ok(offer)
    }

    pub async fn withdraw_offer(&self, actor: &Party, id: DbId) -> EngineResult<Offer> {
        let company_id = Self::require_company(actor.actor(), "withdraw offers")?;
        let offer = self.load_offer(id).await?;
        if offer.company_id != company_id {
            return Err(forbidden("Cannot withdraw another company's offer"));
        }
        Self::pending_offer(&offer, OfferStatus::Withdrawn)?;
        let job = self.load_job(offer.job_id).await?;

        let offer = self
            .store
            .respond_to_offer(id, OfferStatus::Withdrawn, Utc::now())
            .await?;
        tracing::info!(offer_id = id, job_id = job.id, "Offer withdrawn");

        self.notify(vec![notices::offer_withdrawn(&job, &offer, actor)])
            .await;
        Ok(offer)
    }
}
