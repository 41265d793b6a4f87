use std::future::Future;

use chrono::Utc;

use crate::entities::{SqliteStore, dao::Conversation};

pub trait ConversationStore: Send + Sync + 'static {
    fn create_conversation(
        &self,
        conversation: Conversation,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Fetch a single conversation; callers use this for ownership checks
    /// before touching its messages.
    fn get_conversation(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Conversation>, sqlx::Error>> + Send;
    /// All conversations owned by `user_id`, newest first.
    fn list_conversations(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<Conversation>, sqlx::Error>> + Send;
}

type ConversationRow = (String, String, String, String);

fn row_to_conversation((id, user_id, title, created_at): ConversationRow) -> Conversation {
    Conversation {
        id,
        user_id,
        title,
        created_at: created_at.parse().unwrap_or_else(|e: chrono::ParseError| {
            tracing::warn!(raw = %created_at, error = %e, "failed to parse conversation created_at; using now");
            Utc::now()
        }),
    }
}

impl ConversationStore for SqliteStore {
    async fn create_conversation(&self, conversation: Conversation) -> Result<(), sqlx::Error> {
        let created_at = conversation.created_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO conversations (id, user_id, title, created_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&conversation.id)
        .bind(&conversation.user_id)
        .bind(&conversation.title)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, sqlx::Error> {
        let row: Option<ConversationRow> = sqlx::query_as(
            "SELECT id, user_id, title, created_at \
             FROM conversations WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_conversation))
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, sqlx::Error> {
        let rows: Vec<ConversationRow> = sqlx::query_as(
            "SELECT id, user_id, title, created_at \
             FROM conversations WHERE user_id = ?1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_conversation).collect())
    }
}
