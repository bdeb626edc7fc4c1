//! Job application entity model and DTOs.

use serde::{Deserialize, Serialize};
use siteworks_core::error::CoreError;
use siteworks_core::hiring::ApplicationStatus;
use siteworks_core::types::{DbId, Timestamp};
use siteworks_core::validation::{
    validate_document_urls, validate_rate, validate_text, MAX_TEXT_LEN, MAX_TITLE_LEN,
};
use sqlx::FromRow;

use crate::models::job::Job;

/// A row from the `job_applications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobApplication {
    pub id: DbId,
    pub job_id: DbId,
    pub subcontractor_id: DbId,
    /// Denormalised owner of the job.
    pub company_id: DbId,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub full_name: String,
    pub proposed_rate: Option<f64>,
    pub message: Option<String>,
    pub documents: Vec<String>,
    pub applied_at: Timestamp,
    pub responded_at: Option<Timestamp>,
}

/// DTO submitted by a subcontractor applying to a job.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApplication {
    pub job_id: DbId,
    pub full_name: String,
    pub proposed_rate: Option<f64>,
    pub message: Option<String>,
    #[serde(default)]
    pub documents: Vec<String>,
}

impl CreateApplication {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_text("full_name", &self.full_name, MAX_TITLE_LEN)?;
        if let Some(rate) = self.proposed_rate {
            validate_rate("proposed_rate", rate)?;
        }
        if let Some(message) = &self.message {
            if message.chars().count() > MAX_TEXT_LEN {
                return Err(CoreError::Validation(format!(
                    "message must be at most {MAX_TEXT_LEN} characters"
                )));
            }
        }
        validate_document_urls(&self.documents)
    }
}

/// Fully resolved insert for the `job_applications` table.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: DbId,
    pub subcontractor_id: DbId,
    pub company_id: DbId,
    pub full_name: String,
    pub proposed_rate: Option<f64>,
    pub message: Option<String>,
    pub documents: Vec<String>,
    pub applied_at: Timestamp,
}

impl NewApplication {
    pub fn from_request(
        input: &CreateApplication,
        subcontractor_id: DbId,
        company_id: DbId,
        applied_at: Timestamp,
    ) -> Self {
        Self {
            job_id: input.job_id,
            subcontractor_id,
            company_id,
            full_name: input.full_name.trim().to_string(),
            proposed_rate: input.proposed_rate,
            message: input.message.clone(),
            documents: input.documents.clone(),
            applied_at,
        }
    }
}

/// Outcome of accepting an application: every row the transition touched.
#[derive(Debug, Clone)]
pub struct AcceptedApplication {
    pub application: JobApplication,
    pub job: Job,
    /// Sibling applications moved from pending to rejected.
    pub auto_rejected: Vec<JobApplication>,
    /// Whether this accept filled the last slot and started the job.
    pub job_started: bool,
}
