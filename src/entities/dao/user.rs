use chrono::{DateTime, Utc};

/// A row in the `users` table.
///
/// Created on first successful Google sign-in; never deleted.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    /// Google's stable subject identifier (`sub` claim).
    pub google_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
}
