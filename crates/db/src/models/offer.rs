//! Offer entity model and DTOs.

use serde::{Deserialize, Serialize};
use siteworks_core::error::CoreError;
use siteworks_core::hiring::OfferStatus;
use siteworks_core::types::{DbId, Timestamp};
use siteworks_core::validation::MAX_TEXT_LEN;
use sqlx::FromRow;

use crate::models::job::{CreateJob, Job};

/// A row from the `offers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Offer {
    pub id: DbId,
    pub job_id: DbId,
    pub company_id: DbId,
    pub subcontractor_id: DbId,
    #[sqlx(try_from = "String")]
    pub status: OfferStatus,
    pub message: Option<String>,
    pub sent_at: Timestamp,
    pub responded_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
}

impl Offer {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Which job an offer is for.
#[derive(Debug, Clone)]
pub enum OfferTarget {
    /// Create a new `offer`-kind job together with the offer.
    NewJob(CreateJob),
    /// Attach the offer to a job the company already owns.
    ExistingJob(DbId),
}

/// DTO submitted by a company sending an offer. Exactly one of `job_id`
/// and `job` must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOffer {
    pub subcontractor_id: DbId,
    pub job_id: Option<DbId>,
    pub job: Option<CreateJob>,
    pub message: Option<String>,
    pub expires_at: Option<Timestamp>,
}

impl CreateOffer {
    /// An `expires_at` already in the past is accepted; the offer then
    /// refuses acceptance.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(job) = &self.job {
            job.validate()?;
        }
        if let Some(message) = &self.message {
            if message.chars().count() > MAX_TEXT_LEN {
                return Err(CoreError::Validation(format!(
                    "message must be at most {MAX_TEXT_LEN} characters"
                )));
            }
        }
        Ok(())
    }

    /// Resolve the job reference, rejecting both-or-neither.
    pub fn target(&self) -> Result<OfferTarget, CoreError> {
        match (&self.job_id, &self.job) {
            (Some(id), None) => Ok(OfferTarget::ExistingJob(*id)),
            (None, Some(job)) => Ok(OfferTarget::NewJob(job.clone())),
            _ => Err(CoreError::Validation(
                "exactly one of job_id or job must be provided".to_string(),
            )),
        }
    }
}

/// Fully resolved insert for the `offers` table.
#[derive(Debug, Clone)]
pub struct NewOffer {
    pub company_id: DbId,
    pub subcontractor_id: DbId,
    pub message: Option<String>,
    pub sent_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

/// Outcome of accepting an offer.
#[derive(Debug, Clone)]
pub struct AcceptedOffer {
    pub offer: Offer,
    pub job: Job,
    pub job_started: bool,
}
