//! Repository for the `jobs` table.

use siteworks_core::hiring::{JobKind, JobStatus};
use siteworks_core::search::JobSearch;
use siteworks_core::types::{DbId, Timestamp};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::job::{CreateJob, Job, UpdateJob};
use crate::repositories::escape_like;

/// Column list for `jobs` queries.
pub(crate) const COLUMNS: &str = "id, company_id, title, trade, description, site_address, \
    timeline_start_date, timeline_end_date, hourly_rate, workers_required, project_documents, \
    kind, status, assigned_workers, created_at, updated_at";

/// Shared `WHERE` body of the available-jobs search. `$1` is `now`.
const SEARCH_FILTER: &str = "status = 'pending' AND kind = 'request' \
    AND cardinality(assigned_workers) < workers_required \
    AND timeline_start_date > $1 \
    AND ($2::text IS NULL OR trade = $2) \
    AND ($3::float8 IS NULL OR hourly_rate BETWEEN $3 AND $4) \
    AND ($5::text IS NULL OR site_address ILIKE '%' || $5 || '%') \
    AND ($6::timestamptz IS NULL OR timeline_start_date >= $6)";

/// Provides queries and conditional writes for jobs.
pub struct JobRepo;

impl JobRepo {
    /// Insert a new job, returning the created row.
    pub async fn create(
        pool: &PgPool,
        company_id: DbId,
        kind: JobKind,
        input: &CreateJob,
    ) -> Result<Job, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let job = Self::create_in(&mut tx, company_id, kind, input).await?;
        tx.commit().await?;
        Ok(job)
    }

    /// Insert a new job inside an existing transaction.
    pub(crate) async fn create_in(
        tx: &mut Transaction<'_, Postgres>,
        company_id: DbId,
        kind: JobKind,
        input: &CreateJob,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs \
                (company_id, title, trade, description, site_address, timeline_start_date, \
                 timeline_end_date, hourly_rate, workers_required, project_documents, kind) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(company_id)
            .bind(input.title.trim())
            .bind(input.trade.as_str())
            .bind(input.description.trim())
            .bind(input.site_address.trim())
            .bind(input.timeline_start_date)
            .bind(input.timeline_end_date)
            .bind(input.hourly_rate)
            .bind(input.workers_required)
            .bind(&input.project_documents)
            .bind(kind.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock a job row for the rest of the transaction.
    pub(crate) async fn lock(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// List a company's jobs, newest first.
    pub async fn list_by_company(pool: &PgPool, company_id: DbId) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs WHERE company_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Search open request jobs, returning one page and the total match count.
    pub async fn search(
        pool: &PgPool,
        search: &JobSearch,
        now: Timestamp,
    ) -> Result<(Vec<Job>, i64), sqlx::Error> {
        let (min_rate, max_rate) = search.rate_band().unzip();
        let location = search.location_needle().map(escape_like);
        let trade = search.trade.map(|t| t.as_str());

        let count_query = format!("SELECT COUNT(*) FROM jobs WHERE {SEARCH_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(now)
            .bind(trade)
            .bind(min_rate)
            .bind(max_rate)
            .bind(location.as_deref())
            .bind(search.start_date)
            .fetch_one(pool)
            .await?;

        let page_query = format!(
            "SELECT {COLUMNS} FROM jobs WHERE {SEARCH_FILTER} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $7 OFFSET $8"
        );
        let jobs = sqlx::query_as::<_, Job>(&page_query)
            .bind(now)
            .bind(trade)
            .bind(min_rate)
            .bind(max_rate)
            .bind(location.as_deref())
            .bind(search.start_date)
            .bind(search.page.limit)
            .bind(search.page.offset())
            .fetch_all(pool)
            .await?;

        Ok((jobs, total))
    }

    /// Patch a pending job. Returns `None` if the job is no longer pending or
    /// the new `workers_required` would fall below the assignment count.
    pub async fn update_pending(
        pool: &PgPool,
        id: DbId,
        input: &UpdateJob,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs SET \
                title = COALESCE($2, title), \
                trade = COALESCE($3, trade), \
                description = COALESCE($4, description), \
                site_address = COALESCE($5, site_address), \
                timeline_start_date = COALESCE($6, timeline_start_date), \
                timeline_end_date = COALESCE($7, timeline_end_date), \
                hourly_rate = COALESCE($8, hourly_rate), \
                workers_required = COALESCE($9, workers_required), \
                project_documents = COALESCE($10, project_documents) \
             WHERE id = $1 AND status = 'pending' \
               AND cardinality(assigned_workers) <= COALESCE($9, workers_required) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(input.title.as_deref().map(str::trim))
            .bind(input.trade.map(|t| t.as_str()))
            .bind(input.description.as_deref().map(str::trim))
            .bind(input.site_address.as_deref().map(str::trim))
            .bind(input.timeline_start_date)
            .bind(input.timeline_end_date)
            .bind(input.hourly_rate)
            .bind(input.workers_required)
            .bind(input.project_documents.as_ref())
            .fetch_optional(pool)
            .await
    }

    /// Delete a pending job. Offers and applications go with it through
    /// `ON DELETE CASCADE`.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete_pending(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Compare-and-set `pending -> in_progress`, resetting the timeline start.
    ///
    /// Returns `None` when the job was not pending.
    pub async fn start_pending(
        pool: &PgPool,
        id: DbId,
        started_at: Timestamp,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs SET status = $2, timeline_start_date = $3 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(JobStatus::InProgress.as_str())
            .bind(started_at)
            .fetch_optional(pool)
            .await
    }

    /// IDs of pending jobs whose start time has passed.
    pub async fn list_due_ids(pool: &PgPool, now: Timestamp) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM jobs \
             WHERE status = 'pending' AND timeline_start_date <= $1 \
             ORDER BY timeline_start_date, id",
        )
        .bind(now)
        .fetch_all(pool)
        .await
    }

    /// Atomically add a worker when a slot is open, starting a pending job
    /// whose last slot this fills.
    ///
    /// Returns `None` when the job is terminal, full, or already has the worker.
    pub(crate) async fn assign_worker(
        tx: &mut Transaction<'_, Postgres>,
        job_id: DbId,
        subcontractor_id: DbId,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs SET \
                assigned_workers = array_append(assigned_workers, $2), \
                status = CASE \
                    WHEN cardinality(assigned_workers) + 1 >= workers_required THEN 'in_progress' \
                    ELSE status END \
             WHERE id = $1 \
               AND status IN ('pending', 'in_progress') \
               AND cardinality(assigned_workers) < workers_required \
               AND NOT ($2 = ANY(assigned_workers)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .bind(subcontractor_id)
            .fetch_optional(&mut **tx)
            .await
    }
}
