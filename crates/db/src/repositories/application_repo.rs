//! Repository for the `job_applications` table.

use siteworks_core::hiring::ApplicationStatus;
use siteworks_core::types::{DbId, Timestamp};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::application::{JobApplication, NewApplication};

/// Column list for `job_applications` queries.
const COLUMNS: &str = "id, job_id, subcontractor_id, company_id, status, full_name, \
    proposed_rate, message, documents, applied_at, responded_at";

/// Provides queries and conditional writes for job applications.
pub struct ApplicationRepo;

impl ApplicationRepo {
    /// Insert a pending application, but only while the job is an open
    /// pending request. Returns `None` when the job no longer qualifies.
    ///
    /// A second active application for the same pair violates
    /// `uq_job_applications_active`.
    pub async fn create(
        pool: &PgPool,
        input: &NewApplication,
    ) -> Result<Option<JobApplication>, sqlx::Error> {
        let query = format!(
            "INSERT INTO job_applications \
                (job_id, subcontractor_id, company_id, full_name, proposed_rate, message, \
                 documents, applied_at) \
             SELECT j.id, $2, j.company_id, $3, $4, $5, $6, $7 \
             FROM jobs j \
             WHERE j.id = $1 AND j.status = 'pending' AND j.kind = 'request' \
               AND j.timeline_start_date > $7 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobApplication>(&query)
            .bind(input.job_id)
            .bind(input.subcontractor_id)
            .bind(&input.full_name)
            .bind(input.proposed_rate)
            .bind(&input.message)
            .bind(&input.documents)
            .bind(input.applied_at)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<JobApplication>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM job_applications WHERE id = $1");
        sqlx::query_as::<_, JobApplication>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Job id of an application, so the job row can be locked first.
    pub(crate) async fn job_id_of(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT job_id FROM job_applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// List a job's applications, optionally filtered by status.
    pub async fn list_by_job(
        pool: &PgPool,
        job_id: DbId,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<JobApplication>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_applications \
             WHERE job_id = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY applied_at DESC, id DESC"
        );
        sqlx::query_as::<_, JobApplication>(&query)
            .bind(job_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(pool)
            .await
    }

    pub async fn list_by_subcontractor(
        pool: &PgPool,
        subcontractor_id: DbId,
    ) -> Result<Vec<JobApplication>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_applications \
             WHERE subcontractor_id = $1 \
             ORDER BY applied_at DESC, id DESC"
        );
        sqlx::query_as::<_, JobApplication>(&query)
            .bind(subcontractor_id)
            .fetch_all(pool)
            .await
    }

    /// Move a pending application to `status`. Returns `None` when it was
    /// no longer pending.
    pub async fn respond(
        pool: &PgPool,
        id: DbId,
        status: ApplicationStatus,
        responded_at: Timestamp,
    ) -> Result<Option<JobApplication>, sqlx::Error> {
        let query = format!(
            "UPDATE job_applications SET status = $2, responded_at = $3 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobApplication>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(responded_at)
            .fetch_optional(pool)
            .await
    }

    /// Transactional variant of [`Self::respond`].
    pub(crate) async fn respond_in(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        status: ApplicationStatus,
        responded_at: Timestamp,
    ) -> Result<Option<JobApplication>, sqlx::Error> {
        let query = format!(
            "UPDATE job_applications SET status = $2, responded_at = $3 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobApplication>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(responded_at)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Reject every other pending application on a job, returning the rows
    /// that changed.
    pub(crate) async fn reject_pending_siblings(
        tx: &mut Transaction<'_, Postgres>,
        job_id: DbId,
        accepted_id: DbId,
        responded_at: Timestamp,
    ) -> Result<Vec<JobApplication>, sqlx::Error> {
        let query = format!(
            "UPDATE job_applications SET status = 'rejected', responded_at = $3 \
             WHERE job_id = $1 AND id <> $2 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobApplication>(&query)
            .bind(job_id)
            .bind(accepted_id)
            .bind(responded_at)
            .fetch_all(&mut **tx)
            .await
    }
}
