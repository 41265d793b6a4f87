use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::User;

/// Request body for `POST /api/auth/google`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GoogleSignInRequest {
    /// The Google ID token obtained by the client from Google Sign-In.
    pub token: String,
}

/// Response body for `POST /api/auth/google`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignInResponse {
    /// Signed session token; send as `Authorization: Bearer …`.
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub google_id: String,
    pub created_at: String,
}

impl User {
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            picture: self.picture.clone(),
            google_id: self.google_id.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}
