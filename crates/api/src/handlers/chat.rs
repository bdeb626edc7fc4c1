//! Handlers for the `/conversations` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use siteworks_core::types::DbId;
use siteworks_db::models::conversation::{Conversation, Message, SendFirstMessage, SendMessage};

use crate::error::AppResult;
use crate::middleware::auth::AuthActor;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /conversations`.
#[derive(Debug, Deserialize)]
pub struct OpenConversation {
    /// Id of the other party; its type is the opposite of the caller's.
    pub counterpart_id: DbId,
}

/// Body of `POST /conversations/{id}/messages`.
#[derive(Debug, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FirstMessageResponse {
    pub conversation: Conversation,
    pub message: Message,
}

/// GET /api/v1/conversations
pub async fn list_conversations(
    auth: AuthActor,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Conversation>>>> {
    let conversations = state.chat.list_conversations(auth.actor).await?;
    Ok(Json(DataResponse {
        data: conversations,
    }))
}

/// POST /api/v1/conversations
///
/// Find or create the conversation with the given counterpart.
pub async fn open_conversation(
    auth: AuthActor,
    State(state): State<AppState>,
    Json(body): Json<OpenConversation>,
) -> AppResult<Json<DataResponse<Conversation>>> {
    let conversation = state
        .chat
        .open_conversation(auth.actor, body.counterpart_id)
        .await?;
    Ok(Json(DataResponse { data: conversation }))
}

/// POST /api/v1/conversations/messages
pub async fn send_first_message(
    auth: AuthActor,
    State(state): State<AppState>,
    Json(input): Json<SendFirstMessage>,
) -> AppResult<(StatusCode, Json<DataResponse<FirstMessageResponse>>)> {
    let (conversation, message) = state.chat.send_first_message(&auth.party(), &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: FirstMessageResponse {
                conversation,
                message,
            },
        }),
    ))
}

/// GET /api/v1/conversations/{id}/messages
pub async fn list_messages(
    auth: AuthActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<Message>>>> {
    let messages = state
        .chat
        .list_messages(auth.actor, id, params.limit, params.skip)
        .await?;
    Ok(Json(DataResponse { data: messages }))
}

/// POST /api/v1/conversations/{id}/messages
pub async fn send_message(
    auth: AuthActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<MessageBody>,
) -> AppResult<(StatusCode, Json<DataResponse<Message>>)> {
    let input = SendMessage {
        conversation_id: id,
        content: body.content,
        attachments: body.attachments,
    };
    let message = state.chat.send_message(&auth.party(), &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}

/// POST /api/v1/conversations/{id}/read
pub async fn mark_read(
    auth: AuthActor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.chat.mark_read(auth.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
