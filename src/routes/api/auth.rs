//! Google sign-in.
//!
//! Exchanges a verified Google ID token for a server session token.  First
//! sign-in creates the User plus a default "Welcome Chat" conversation; any
//! later sign-in with the same Google subject id returns the existing user
//! and creates nothing.

use std::sync::Arc;

use axum::extract::State;
use axum::{Json, Router, routing::post};
use chrono::Utc;
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::auth::google::GoogleClaims;
use crate::entities::{Conversation, ConversationStore, User, UserStore};
use crate::error::ServerError;
use crate::schemas::api::auth::{GoogleSignInRequest, SignInResponse, UserResponse};
use crate::state::AppState;

const WELCOME_CONVERSATION_TITLE: &str = "Welcome Chat";

#[derive(OpenApi)]
#[openapi(
    paths(google_sign_in),
    components(schemas(GoogleSignInRequest, SignInResponse, UserResponse))
)]
pub struct AuthApi;

/// Register authentication routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/auth/google", post(google_sign_in))
}

/// Sign in with a Google ID token (`POST /api/auth/google`).
#[utoipa::path(
    post,
    path = "/api/auth/google",
    tag = "auth",
    request_body = GoogleSignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Token rejected"),
        (status = 500, description = "Storage error"),
    )
)]
pub async fn google_sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GoogleSignInRequest>,
) -> Result<Json<SignInResponse>, ServerError> {
    let claims = state.google.verify(&req.token).await?;
    let user = provision_user(&state, claims).await?;
    let token = state.sessions.issue(&user.id)?;
    Ok(Json(SignInResponse {
        token,
        user: user.to_response(),
    }))
}

/// Resolve verified claims to a User, creating the account (and its welcome
/// conversation) on first sign-in.  Later sign-ins with the same subject id
/// return the existing user and create nothing.
async fn provision_user(state: &AppState, claims: GoogleClaims) -> Result<User, ServerError> {
    if let Some(existing) = state.store.get_user_by_google_id(&claims.sub).await? {
        return Ok(existing);
    }

    // An account without an email cannot be provisioned.
    let email = claims.email.ok_or(ServerError::InvalidCredential)?;
    let user = User {
        id: Uuid::new_v4().to_string(),
        google_id: claims.sub,
        email: email.clone(),
        name: claims.name.unwrap_or_else(|| fallback_name(&email)),
        picture: claims.picture,
        created_at: Utc::now(),
    };
    state.store.create_user(user.clone()).await?;
    state
        .store
        .create_conversation(Conversation {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            title: WELCOME_CONVERSATION_TITLE.to_owned(),
            created_at: Utc::now(),
        })
        .await?;
    info!(user_id = %user.id, "created user on first sign-in");
    Ok(user)
}

/// Display name when Google supplies none: the local part of the email.
fn fallback_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_owned()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::auth::{GoogleVerifier, SessionIssuer};
    use crate::completion::CompletionClient;
    use crate::config::Config;
    use crate::entities::SqliteStore;

    fn claims(sub: &str, email: Option<&str>, name: Option<&str>) -> GoogleClaims {
        GoogleClaims {
            sub: sub.to_owned(),
            aud: "test-client".to_owned(),
            email: email.map(str::to_owned),
            name: name.map(str::to_owned),
            picture: None,
        }
    }

    async fn test_state() -> AppState {
        let config = Arc::new(Config {
            bind_address: "127.0.0.1:0".into(),
            database_url: "sqlite::memory:".into(),
            session_secret: "test-secret".into(),
            google_client_id: "test-client".into(),
            openai_endpoint: "https://acme.openai.azure.com".into(),
            openai_deployment: "gpt-4o".into(),
            openai_api_version: "2024-02-01".into(),
            openai_api_key: "test-key".into(),
            log_level: "info".into(),
            log_json: false,
            cors_allowed_origins: None,
            enable_swagger: false,
        });
        let http = reqwest::Client::new();
        AppState {
            store: Arc::new(SqliteStore::in_memory().await),
            sessions: SessionIssuer::new(&config.session_secret).unwrap(),
            google: GoogleVerifier::new(http.clone(), config.google_client_id.clone()),
            completions: CompletionClient::new(http, &config),
            config,
        }
    }

    #[tokio::test]
    async fn first_sign_in_creates_user_and_welcome_conversation() {
        let state = test_state().await;
        let user = provision_user(&state, claims("g-1", Some("ada@example.com"), Some("Ada")))
            .await
            .unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name, "Ada");
        let conversations = state.store.list_conversations(&user.id).await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].title, "Welcome Chat");
    }

    #[tokio::test]
    async fn repeat_sign_in_creates_nothing_new() {
        let state = test_state().await;
        let first = provision_user(&state, claims("g-1", Some("ada@example.com"), Some("Ada")))
            .await
            .unwrap();
        let second = provision_user(&state, claims("g-1", Some("ada@example.com"), Some("Ada")))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(
            state.store.list_conversations(&first.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn missing_email_is_rejected() {
        let state = test_state().await;
        let err = provision_user(&state, claims("g-1", None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidCredential));
    }

    #[tokio::test]
    async fn missing_name_falls_back_to_email_local_part() {
        let state = test_state().await;
        let user = provision_user(&state, claims("g-1", Some("ada@example.com"), None))
            .await
            .unwrap();
        assert_eq!(user.name, "ada");
    }

    #[test]
    fn fallback_name_is_email_local_part() {
        assert_eq!(fallback_name("ada@example.com"), "ada");
    }

    #[test]
    fn fallback_name_without_at_sign_is_whole_string() {
        assert_eq!(fallback_name("ada"), "ada");
    }
}
