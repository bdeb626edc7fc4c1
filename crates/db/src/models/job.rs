//! Job entity model and DTOs.

use serde::{Deserialize, Serialize};
use siteworks_core::error::CoreError;
use siteworks_core::hiring::{JobKind, JobStatus, Trade};
use siteworks_core::types::{DbId, Timestamp};
use siteworks_core::validation::{
    validate_document_urls, validate_rate, validate_text, validate_timeline,
    validate_workers_required, MAX_TEXT_LEN, MAX_TITLE_LEN,
};
use sqlx::FromRow;

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub company_id: DbId,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub trade: Trade,
    pub description: String,
    pub site_address: String,
    pub timeline_start_date: Timestamp,
    pub timeline_end_date: Timestamp,
    pub hourly_rate: f64,
    pub workers_required: i32,
    pub project_documents: Vec<String>,
    #[sqlx(try_from = "String")]
    pub kind: JobKind,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub assigned_workers: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    pub fn open_slots(&self) -> i64 {
        i64::from(self.workers_required) - self.assigned_workers.len() as i64
    }

    pub fn has_capacity(&self) -> bool {
        self.open_slots() > 0
    }

    pub fn is_assigned(&self, subcontractor_id: DbId) -> bool {
        self.assigned_workers.contains(&subcontractor_id)
    }

    /// Whether a subcontractor may apply right now.
    pub fn is_open_for_applications(&self, now: Timestamp) -> bool {
        self.kind == JobKind::Request
            && self.status == JobStatus::Pending
            && self.timeline_start_date > now
    }

    /// Add a worker under the capacity rule, moving a pending job to
    /// `InProgress` when the last slot fills.
    ///
    /// Returns `true` when this call started the job. Used by stores that
    /// apply the rule in process; Postgres applies it as one conditional
    /// `UPDATE`.
    pub fn assign_worker(&mut self, subcontractor_id: DbId) -> Result<bool, CoreError> {
        if !self.status.accepts_assignments() {
            return Err(CoreError::Conflict(format!(
                "Job {} is {} and cannot take on workers",
                self.id, self.status
            )));
        }
        if self.is_assigned(subcontractor_id) {
            return Err(CoreError::Conflict(format!(
                "Subcontractor {subcontractor_id} is already assigned to job {}",
                self.id
            )));
        }
        if !self.has_capacity() {
            return Err(CoreError::Conflict(format!(
                "Job {} has no open positions",
                self.id
            )));
        }

        self.assigned_workers.push(subcontractor_id);
        let started = self.status == JobStatus::Pending && !self.has_capacity();
        if started {
            self.status = JobStatus::InProgress;
        }
        Ok(started)
    }
}

/// DTO for creating a job. The owning company and the kind come from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJob {
    pub title: String,
    pub trade: Trade,
    pub description: String,
    pub site_address: String,
    pub timeline_start_date: Timestamp,
    pub timeline_end_date: Timestamp,
    pub hourly_rate: f64,
    #[serde(default = "default_workers_required")]
    pub workers_required: i32,
    #[serde(default)]
    pub project_documents: Vec<String>,
}

fn default_workers_required() -> i32 {
    1
}

impl CreateJob {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_text("title", &self.title, MAX_TITLE_LEN)?;
        validate_text("description", &self.description, MAX_TEXT_LEN)?;
        validate_text("site_address", &self.site_address, MAX_TITLE_LEN)?;
        validate_timeline(self.timeline_start_date, self.timeline_end_date)?;
        validate_rate("hourly_rate", self.hourly_rate)?;
        validate_workers_required(self.workers_required)?;
        validate_document_urls(&self.project_documents)
    }
}

/// DTO for patching a job. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateJob {
    pub title: Option<String>,
    pub trade: Option<Trade>,
    pub description: Option<String>,
    pub site_address: Option<String>,
    pub timeline_start_date: Option<Timestamp>,
    pub timeline_end_date: Option<Timestamp>,
    pub hourly_rate: Option<f64>,
    pub workers_required: Option<i32>,
    pub project_documents: Option<Vec<String>>,
}

impl UpdateJob {
    /// Validate the patch merged over the current row.
    pub fn validate_against(&self, job: &Job) -> Result<(), CoreError> {
        if let Some(title) = &self.title {
            validate_text("title", title, MAX_TITLE_LEN)?;
        }
        if let Some(description) = &self.description {
            validate_text("description", description, MAX_TEXT_LEN)?;
        }
        if let Some(address) = &self.site_address {
            validate_text("site_address", address, MAX_TITLE_LEN)?;
        }
        validate_timeline(
            self.timeline_start_date.unwrap_or(job.timeline_start_date),
            self.timeline_end_date.unwrap_or(job.timeline_end_date),
        )?;
        if let Some(rate) = self.hourly_rate {
            validate_rate("hourly_rate", rate)?;
        }
        if let Some(workers) = self.workers_required {
            validate_workers_required(workers)?;
            if (workers as usize) < job.assigned_workers.len() {
                return Err(CoreError::Validation(format!(
                    "workers_required cannot drop below the {} workers already assigned",
                    job.assigned_workers.len()
                )));
            }
        }
        if let Some(documents) = &self.project_documents {
            validate_document_urls(documents)?;
        }
        Ok(())
    }

    /// Apply the patch to an owned row. Text fields are trimmed the same
    /// way inserts trim them.
    pub fn apply_to(&self, job: &mut Job) {
        if let Some(v) = &self.title {
            job.title = v.trim().to_string();
        }
        if let Some(v) = self.trade {
            job.trade = v;
        }
        if let Some(v) = &self.description {
            job.description = v.trim().to_string();
        }
        if let Some(v) = &self.site_address {
            job.site_address = v.trim().to_string();
        }
        if let Some(v) = self.timeline_start_date {
            job.timeline_start_date = v;
        }
        if let Some(v) = self.timeline_end_date {
            job.timeline_end_date = v;
        }
        if let Some(v) = self.hourly_rate {
            job.hourly_rate = v;
        }
        if let Some(v) = self.workers_required {
            job.workers_required = v;
        }
        if let Some(v) = &self.project_documents {
            job.project_documents = v.clone();
        }
    }
}

/// Owner view of a job with its applications and offers.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<crate::models::application::JobApplication>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offers: Option<Vec<crate::models::offer::Offer>>,
}
