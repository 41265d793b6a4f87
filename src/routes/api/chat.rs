//! Chat-turn orchestration.
//!
//! One request drives the whole turn: resolve (or create) the conversation,
//! persist the user message, call the completion provider, persist and return
//! the assistant message.  Each persistence call commits independently — a
//! failure after the user-message write leaves the conversation with an
//! unanswered user turn, which readers tolerate.

use std::sync::Arc;

use axum::extract::State;
use axum::{Extension, Json, Router, routing::post};
use chrono::Utc;
use tracing::{debug, info};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::{Conversation, ConversationStore, Message, MessageStore, Role};
use crate::error::ServerError;
use crate::middleware::auth::CurrentUser;
use crate::routes::api::conversations::load_owned_conversation;
use crate::schemas::api::chat::ChatRequest;
use crate::schemas::api::conversation::MessageResponse;
use crate::state::AppState;

/// Auto-created conversations are titled with this many leading characters
/// of the first message.
const TITLE_PREFIX_CHARS: usize = 30;

#[derive(OpenApi)]
#[openapi(paths(chat), components(schemas(ChatRequest, MessageResponse)))]
pub struct ChatApi;

/// Register chat routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

/// Send a message and receive the assistant's reply (`POST /api/chat`).
///
/// When `conversation_id` is absent, a new conversation is created and
/// titled from the message.  The provider is called with the current message
/// only; no history is sent.
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Persisted assistant message", body = MessageResponse),
        (status = 400, description = "Empty message"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 404, description = "Unknown conversation, or owned by another user"),
        (status = 500, description = "Provider or storage failure"),
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<MessageResponse>, ServerError> {
    if req.message.is_empty() {
        return Err(ServerError::Validation(
            "message must be a non-empty string".to_owned(),
        ));
    }

    let conversation = match req.conversation_id.as_deref() {
        Some(id) => load_owned_conversation(&state, id, &user_id).await?,
        None => {
            let conversation = Conversation {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.clone(),
                title: conversation_title(&req.message),
                created_at: Utc::now(),
            };
            state
                .store
                .create_conversation(conversation.clone())
                .await?;
            debug!(conversation_id = %conversation.id, "created conversation for chat turn");
            conversation
        }
    };

    state
        .store
        .append_message(Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation.id.clone(),
            role: Role::User,
            content: req.message.clone(),
            created_at: Utc::now(),
        })
        .await?;

    let reply = state.completions.complete(&req.message).await?;

    let assistant = state
        .store
        .append_message(Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation.id.clone(),
            role: Role::Assistant,
            content: reply,
            created_at: Utc::now(),
        })
        .await?;

    info!(
        conversation_id = %conversation.id,
        reply_len = assistant.content.len(),
        "chat turn completed"
    );
    Ok(Json(assistant.to_response()))
}

/// Title for an auto-created conversation: the first
/// [`TITLE_PREFIX_CHARS`] characters of the message plus an ellipsis marker.
fn conversation_title(message: &str) -> String {
    let head: String = message.chars().take(TITLE_PREFIX_CHARS).collect();
    format!("{head}...")
}

// ── Tests ──────────────────────────────────────────────────────────────────────
