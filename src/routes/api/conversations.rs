//! Conversation listing/creation and message history.
//!
//! Conversation ids arrive from the client, so every read goes through
//! [`load_owned_conversation`]: a conversation that does not exist or belongs
//! to another user is reported as not-found, keeping ids unprobeable.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::{Conversation, ConversationStore, MessageStore};
use crate::error::ServerError;
use crate::middleware::auth::CurrentUser;
use crate::schemas::api::conversation::{ConversationResponse, MessageResponse};
use crate::state::AppState;

const NEW_CONVERSATION_TITLE: &str = "New Chat";

#[derive(OpenApi)]
#[openapi(
    paths(list_conversations, create_conversation, list_messages),
    components(schemas(ConversationResponse, MessageResponse))
)]
pub struct ConversationsApi;

/// Register conversation routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route("/messages/{conversation_id}", get(list_messages))
}

/// Fetch a conversation and check it belongs to `user_id`.
pub(crate) async fn load_owned_conversation(
    state: &AppState,
    conversation_id: &str,
    user_id: &str,
) -> Result<Conversation, ServerError> {
    state
        .store
        .get_conversation(conversation_id)
        .await?
        .filter(|conversation| conversation.user_id == user_id)
        .ok_or_else(|| ServerError::NotFound("conversation not found".to_owned()))
}

/// The authenticated user's conversations, newest first
/// (`GET /api/conversations`).
#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "conversations",
    responses(
        (status = 200, description = "Conversations, newest first", body = Vec<ConversationResponse>),
        (status = 401, description = "Missing or invalid credential"),
    )
)]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<ConversationResponse>>, ServerError> {
    let conversations = state.store.list_conversations(&user_id).await?;
    Ok(Json(
        conversations.iter().map(|c| c.to_response()).collect(),
    ))
}

/// Create an empty conversation titled "New Chat"
/// (`POST /api/conversations`).
#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "conversations",
    responses(
        (status = 200, description = "Conversation created", body = ConversationResponse),
        (status = 401, description = "Missing or invalid credential"),
    )
)]
pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<ConversationResponse>, ServerError> {
    let conversation = Conversation {
        id: Uuid::new_v4().to_string(),
        user_id,
        title: NEW_CONVERSATION_TITLE.to_owned(),
        created_at: Utc::now(),
    };
    state.store.create_conversation(conversation.clone()).await?;
    Ok(Json(conversation.to_response()))
}

/// Messages of an owned conversation, oldest first
/// (`GET /api/messages/{conversation_id}`).
#[utoipa::path(
    get,
    path = "/api/messages/{conversation_id}",
    tag = "conversations",
    params(("conversation_id" = String, Path, description = "Conversation to read")),
    responses(
        (status = 200, description = "Messages, oldest first", body = Vec<MessageResponse>),
        (status = 401, description = "Missing or invalid credential"),
        (status = 404, description = "Unknown conversation, or owned by another user"),
    )
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, ServerError> {
    let conversation = load_owned_conversation(&state, &conversation_id, &user_id).await?;
    let messages = state.store.list_messages(&conversation.id).await?;
    Ok(Json(messages.iter().map(|m| m.to_response()).collect()))
}
