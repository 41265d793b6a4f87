use std::sync::Arc;

use axum::extract::State;
use axum::{Extension, Json, Router, routing::get};
use utoipa::OpenApi;

use crate::entities::UserStore;
use crate::error::ServerError;
use crate::middleware::auth::CurrentUser;
use crate::schemas::api::auth::UserResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_user))]
pub struct UserApi;

/// Register user routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/user", get(get_user))
}

/// The authenticated user's profile (`GET /api/user`).
#[utoipa::path(
    get,
    path = "/api/user",
    tag = "user",
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, description = "Missing or invalid credential"),
        (status = 404, description = "User record no longer exists"),
    )
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<UserResponse>, ServerError> {
    let user = state
        .store
        .get_user_by_id(&user_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("user not found".to_owned()))?;
    Ok(Json(user.to_response()))
}
