use std::future::Future;

use chrono::{Duration, Utc};

use crate::entities::{
    SqliteStore,
    dao::{Message, Role},
};

/// How far back `append_message` looks for an identical turn before
/// inserting.  Message creation has no client-supplied idempotency key, so a
/// retried or double-submitted write inside this window returns the existing
/// row instead of duplicating it.
const DEDUP_WINDOW_SECS: i64 = 10;

pub trait MessageStore: Send + Sync + 'static {
    /// Append a message, returning the effective row: either the one just
    /// inserted or an identical row already present within the dedup window.
    fn append_message(
        &self,
        msg: Message,
    ) -> impl Future<Output = Result<Message, sqlx::Error>> + Send;
    /// All messages in a conversation, timestamp ascending.
    fn list_messages(
        &self,
        conversation_id: &str,
    ) -> impl Future<Output = Result<Vec<Message>, sqlx::Error>> + Send;
}

type MessageRow = (String, String, String, String, String);

fn row_to_message(
    (id, conversation_id, role, content, created_at): MessageRow,
) -> Result<Message, sqlx::Error> {
    let role: Role = role
        .parse()
        .map_err(|e: String| sqlx::Error::Decode(e.into()))?;
    Ok(Message {
        id,
        conversation_id,
        role,
        content,
        created_at: created_at.parse().unwrap_or_else(|e: chrono::ParseError| {
            tracing::warn!(raw = %created_at, error = %e, "failed to parse message created_at; using now");
            Utc::now()
        }),
    })
}

impl MessageStore for SqliteStore {
    async fn append_message(&self, msg: Message) -> Result<Message, sqlx::Error> {
        // RFC 3339 timestamps in UTC compare correctly as strings, which is
        // also what the ORDER BY clauses below rely on.
        let window_start = (msg.created_at - Duration::seconds(DEDUP_WINDOW_SECS)).to_rfc3339();
        let existing: Option<MessageRow> = sqlx::query_as(
            "SELECT id, conversation_id, role, content, created_at \
             FROM messages \
             WHERE conversation_id = ?1 AND role = ?2 AND content = ?3 AND created_at >= ?4 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(&msg.conversation_id)
        .bind(msg.role.as_str())
        .bind(&msg.content)
        .bind(&window_start)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = existing {
            let duplicate = row_to_message(row)?;
            tracing::debug!(
                conversation_id = %msg.conversation_id,
                message_id = %duplicate.id,
                "identical message within dedup window; returning existing row"
            );
            return Ok(duplicate);
        }

        let created_at = msg.created_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO messages (id, conversation_id, role, content, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&msg.id)
        .bind(&msg.conversation_id)
        .bind(msg.role.as_str())
        .bind(&msg.content)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        Ok(msg)
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, sqlx::Error> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, conversation_id, role, content, created_at \
             FROM messages WHERE conversation_id = ?1 ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_message).collect()
    }
}
