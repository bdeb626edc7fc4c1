//! Repository for the `notifications` table.

use siteworks_core::actors::ActorRef;
use siteworks_core::search::Page;
use siteworks_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{NewNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, notification_type, title, message, sender_id, sender_type, \
    sender_name, receiver_id, receiver_type, related_entity_id, related_entity_type, data, \
    is_read, read_at, created_at";

/// Provides CRUD operations for notifications. Every query is scoped to
/// the receiver `(type, id)` pair.
pub struct NotificationRepo;

impl NotificationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &NewNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications \
                (notification_type, title, message, sender_id, sender_type, sender_name, \
                 receiver_id, receiver_type, related_entity_id, related_entity_type, data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.kind.as_str())
            .bind(&input.title)
            .bind(&input.message)
            .bind(input.sender.id)
            .bind(input.sender.actor_type.as_str())
            .bind(&input.sender.name)
            .bind(input.receiver.id)
            .bind(input.receiver.actor_type.as_str())
            .bind(input.related_entity_id)
            .bind(input.related_entity_type.as_str())
            .bind(&input.data)
            .fetch_one(pool)
            .await
    }

    /// List a receiver's notifications, newest first, with the total count.
    ///
    /// When `unread_only` is `true`, only notifications with `is_read = false`
    /// are returned.
    pub async fn list_for_receiver(
        pool: &PgPool,
        receiver: ActorRef,
        unread_only: bool,
        page: Page,
    ) -> Result<(Vec<Notification>, i64), sqlx::Error> {
        let filter = if unread_only {
            "AND is_read = false"
        } else {
            ""
        };

        let count_query = format!(
            "SELECT COUNT(*) FROM notifications \
             WHERE receiver_type = $1 AND receiver_id = $2 {filter}"
        );
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(receiver.actor_type.as_str())
            .bind(receiver.id)
            .fetch_one(pool)
            .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE receiver_type = $1 AND receiver_id = $2 {filter} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, Notification>(&query)
            .bind(receiver.actor_type.as_str())
            .bind(receiver.id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Get the number of unread notifications for a receiver.
    pub async fn unread_count(pool: &PgPool, receiver: ActorRef) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE receiver_type = $1 AND receiver_id = $2 AND is_read = false",
        )
        .bind(receiver.actor_type.as_str())
        .bind(receiver.id)
        .fetch_one(pool)
        .await
    }

    /// Mark a single notification as read.
    ///
    /// Returns the row if it belongs to the receiver, already-read rows included.
    pub async fn mark_read(
        pool: &PgPool,
        id: DbId,
        receiver: ActorRef,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND receiver_type = $2 AND receiver_id = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(receiver.actor_type.as_str())
            .bind(receiver.id)
            .fetch_optional(pool)
            .await
    }

    /// Mark all unread notifications as read for a receiver.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool, receiver: ActorRef) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW() \
             WHERE receiver_type = $1 AND receiver_id = $2 AND is_read = false",
        )
        .bind(receiver.actor_type.as_str())
        .bind(receiver.id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete a notification owned by the receiver. Returns `true` if deleted.
    pub async fn delete(pool: &PgPool, id: DbId, receiver: ActorRef) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM notifications \
             WHERE id = $1 AND receiver_type = $2 AND receiver_id = $3",
        )
        .bind(id)
        .bind(receiver.actor_type.as_str())
        .bind(receiver.id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
