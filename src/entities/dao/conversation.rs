use chrono::{DateTime, Utc};

/// A row in the `conversations` table.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    /// Owning user; every read and write is checked against this.
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}
