//! Repository for the `conversations` and `messages` tables.

use siteworks_core::actors::{ActorRef, ActorType};
use siteworks_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::conversation::{Conversation, Message};

/// Column list for `conversations` queries.
const COLUMNS: &str = "id, company_id, subcontractor_id, last_message, last_message_at, \
    company_unread, subcontractor_unread, created_at, updated_at";

/// Column list for `messages` queries.
const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, sender_type, content, attachments, is_read, created_at";

/// Provides chat persistence.
pub struct ConversationRepo;

impl ConversationRepo {
    /// Return the conversation between the pair, creating it if absent.
    pub async fn find_or_create(
        pool: &PgPool,
        company_id: DbId,
        subcontractor_id: DbId,
    ) -> Result<Conversation, sqlx::Error> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let query = format!(
            "INSERT INTO conversations (company_id, subcontractor_id) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_conversations_participants \
             DO UPDATE SET company_id = EXCLUDED.company_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Conversation>(&query)
            .bind(company_id)
            .bind(subcontractor_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Conversation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM conversations WHERE id = $1");
        sqlx::query_as::<_, Conversation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an actor's conversations, most recently active first.
    pub async fn list_for_actor(
        pool: &PgPool,
        actor: ActorRef,
    ) -> Result<Vec<Conversation>, sqlx::Error> {
        let column = participant_column(actor.actor_type);
        let query = format!(
            "SELECT {COLUMNS} FROM conversations WHERE {column} = $1 \
             ORDER BY COALESCE(last_message_at, created_at) DESC, id DESC"
        );
        sqlx::query_as::<_, Conversation>(&query)
            .bind(actor.id)
            .fetch_all(pool)
            .await
    }

    /// Insert a message and update the conversation summary and the
    /// counterpart's unread counter in one transaction.
    pub async fn insert_message(
        pool: &PgPool,
        conversation_id: DbId,
        sender: ActorRef,
        content: &str,
        attachments: &[String],
        sent_at: Timestamp,
    ) -> Result<Message, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO messages (conversation_id, sender_id, sender_type, content, attachments, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {MESSAGE_COLUMNS}"
        );
        let message = sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .bind(sender.id)
            .bind(sender.actor_type.as_str())
            .bind(content)
            .bind(attachments)
            .bind(sent_at)
            .fetch_one(&mut *tx)
            .await?;

        let counter = match sender.actor_type {
            ActorType::Company => "subcontractor_unread",
            _ => "company_unread",
        };
        let update = format!(
            "UPDATE conversations \
             SET last_message = $2, last_message_at = $3, {counter} = {counter} + 1 \
             WHERE id = $1"
        );
        sqlx::query(&update)
            .bind(conversation_id)
            .bind(content)
            .bind(sent_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(message)
    }

    /// List messages oldest first, with offset pagination.
    pub async fn list_messages(
        pool: &PgPool,
        conversation_id: DbId,
        limit: i64,
        skip: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = $1 \
             ORDER BY created_at, id LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(pool)
            .await
    }

    /// Reset the reader's unread counter and mark the counterpart's messages read.
    pub async fn mark_read(
        pool: &PgPool,
        conversation_id: DbId,
        reader: ActorRef,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let counter = match reader.actor_type {
            ActorType::Company => "company_unread",
            _ => "subcontractor_unread",
        };
        sqlx::query(&format!(
            "UPDATE conversations SET {counter} = 0 WHERE id = $1"
        ))
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE messages SET is_read = true \
             WHERE conversation_id = $1 AND is_read = false \
               AND NOT (sender_type = $2 AND sender_id = $3)",
        )
        .bind(conversation_id)
        .bind(reader.actor_type.as_str())
        .bind(reader.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn participant_column(actor_type: ActorType) -> &'static str {
    match actor_type {
        ActorType::Company => "company_id",
        _ => "subcontractor_id",
    }
}
