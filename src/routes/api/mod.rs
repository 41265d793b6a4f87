//! Routes nested under `/api`.
//!
//! Everything except sign-in sits behind the session gate; the gate is
//! applied with `route_layer` so unmatched paths still 404 instead of 401.

pub mod auth;
pub mod chat;
pub mod conversations;
pub mod user;

use std::sync::Arc;

use axum::{Router, middleware};
use utoipa::OpenApi;

use crate::middleware::auth::require_session;
use crate::state::AppState;

/// Build the `/api` router.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .merge(user::router())
        .merge(conversations::router())
        .merge(chat::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new().merge(auth::router()).merge(protected)
}

#[derive(OpenApi)]
#[openapi()]
pub struct ApiV1;

pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut spec = ApiV1::openapi();
    spec.merge(auth::AuthApi::openapi());
    spec.merge(user::UserApi::openapi());
    spec.merge(conversations::ConversationsApi::openapi());
    spec.merge(chat::ChatApi::openapi());
    spec
}

// ── Tests ──────────────────────────────────────────────────────────────────────
