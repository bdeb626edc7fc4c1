//! Repository for the `offers` table.

use siteworks_core::hiring::OfferStatus;
use siteworks_core::types::{DbId, Timestamp};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::offer::{NewOffer, Offer};

/// Column list for `offers` queries.
const COLUMNS: &str = "id, job_id, company_id, subcontractor_id, status, message, sent_at, \
    responded_at, expires_at";

/// Provides queries and conditional writes for offers.
pub struct OfferRepo;

impl OfferRepo {
    /// Insert a pending offer. A second offer for the same pair violates
    /// `uq_offers_job_subcontractor`.
    pub(crate) async fn create_in(
        tx: &mut Transaction<'_, Postgres>,
        job_id: DbId,
        input: &NewOffer,
    ) -> Result<Offer, sqlx::Error> {
        let query = format!(
            "INSERT INTO offers (job_id, company_id, subcontractor_id, message, sent_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(job_id)
            .bind(input.company_id)
            .bind(input.subcontractor_id)
            .bind(&input.message)
            .bind(input.sent_at)
            .bind(input.expires_at)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM offers WHERE id = $1");
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Job id of an offer, so the job row can be locked before the offer.
    pub(crate) async fn job_id_of(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT job_id FROM offers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn list_by_company(pool: &PgPool, company_id: DbId) -> Result<Vec<Offer>, sqlx::Error> {
        Self::list_where(pool, "company_id", company_id).await
    }

    pub async fn list_by_subcontractor(
        pool: &PgPool,
        subcontractor_id: DbId,
    ) -> Result<Vec<Offer>, sqlx::Error> {
        Self::list_where(pool, "subcontractor_id", subcontractor_id).await
    }

    pub async fn list_by_job(pool: &PgPool, job_id: DbId) -> Result<Vec<Offer>, sqlx::Error> {
        Self::list_where(pool, "job_id", job_id).await
    }

    /// Move a pending offer to `status`. Returns `None` when it was no
    /// longer pending.
    pub async fn respond(
        pool: &PgPool,
        id: DbId,
        status: OfferStatus,
        responded_at: Timestamp,
    ) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!(
            "UPDATE offers SET status = $2, responded_at = $3 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(responded_at)
            .fetch_optional(pool)
            .await
    }

    /// Accept a pending, unexpired offer inside a transaction. Returns
    /// `None` when either condition fails.
    pub(crate) async fn accept_in(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<Offer>, sqlx::Error> {
        let query = format!(
            "UPDATE offers SET status = 'accepted', responded_at = $2 \
             WHERE id = $1 AND status = 'pending' \
               AND (expires_at IS NULL OR expires_at > $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(id)
            .bind(now)
            .fetch_optional(&mut **tx)
            .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// `column` is always one of the fixed owner columns above.
    async fn list_where(
        pool: &PgPool,
        column: &'static str,
        value: DbId,
    ) -> Result<Vec<Offer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM offers WHERE {column} = $1 ORDER BY sent_at DESC, id DESC"
        );
        sqlx::query_as::<_, Offer>(&query)
            .bind(value)
            .fetch_all(pool)
            .await
    }
}
