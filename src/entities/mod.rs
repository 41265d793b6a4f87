//! Persistence gateway.
//!
//! One trait per entity ([`UserStore`], [`ConversationStore`],
//! [`MessageStore`]), all implemented by [`SqliteStore`].  To swap to another
//! database (Postgres, MySQL, …), implement the traits for your new type and
//! change the concrete type in [`crate::state::AppState`].
//!
//! All trait methods use `impl Future` in their signatures (stable since Rust
//! 1.75) so no extra `async-trait` crate is required.  Every operation is a
//! single round trip; there are no cross-entity transactions — retries are
//! the caller's concern.

pub mod conversation;
pub mod dao;
pub mod message;
pub mod user;

pub use dao::{Conversation, Message, Role, User};

pub use conversation::ConversationStore;
pub use message::MessageStore;
pub use user::UserStore;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// SQLite-backed store for users, conversations, and messages.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g.
    /// `"sqlite://parley.db"`.  The migrations directory is resolved relative
    /// to `CARGO_MANIFEST_DIR` at compile time and embedded into the binary.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory store for tests.  A single pooled connection is pinned so
    /// the migrated schema is visible to every query.
    #[cfg(test)]
    pub(crate) async fn in_memory() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        Self { pool }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(google_id: &str, email: &str) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            google_id: google_id.to_owned(),
            email: email.to_owned(),
            name: "Test User".to_owned(),
            picture: None,
            created_at: Utc::now(),
        }
    }

    fn conversation(user_id: &str, title: &str) -> Conversation {
        Conversation {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_owned(),
            title: title.to_owned(),
            created_at: Utc::now(),
        }
    }

    fn msg(conversation_id: &str, role: Role, content: &str) -> Message {
        Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_owned(),
            role,
            content: content.to_owned(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn user_round_trip_by_google_id_and_id() {
        let store = SqliteStore::in_memory().await;
        let u = user("g-1", "a@example.com");
        store.create_user(u.clone()).await.unwrap();

        let by_google = store.get_user_by_google_id("g-1").await.unwrap().unwrap();
        assert_eq!(by_google.id, u.id);
        assert_eq!(by_google.email, "a@example.com");

        let by_id = store.get_user_by_id(&u.id).await.unwrap().unwrap();
        assert_eq!(by_id.google_id, "g-1");

        assert!(store.get_user_by_google_id("g-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let store = SqliteStore::in_memory().await;
        store.create_user(user("g-1", "a@example.com")).await.unwrap();

        let err = store
            .create_user(user("g-other", "a@example.com"))
            .await
            .unwrap_err();
        match err {
            sqlx::Error::Database(db) => assert!(db.is_unique_violation()),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_google_id_is_a_unique_violation() {
        let store = SqliteStore::in_memory().await;
        store.create_user(user("g-1", "a@example.com")).await.unwrap();

        let err = store
            .create_user(user("g-1", "b@example.com"))
            .await
            .unwrap_err();
        match err {
            sqlx::Error::Database(db) => assert!(db.is_unique_violation()),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn conversations_list_newest_first() {
        let store = SqliteStore::in_memory().await;
        let u = user("g-1", "a@example.com");
        store.create_user(u.clone()).await.unwrap();

        let mut first = conversation(&u.id, "first");
        let mut second = conversation(&u.id, "second");
        // Force distinct, ordered timestamps.
        first.created_at = Utc::now() - chrono::Duration::seconds(5);
        second.created_at = Utc::now();
        store.create_conversation(first.clone()).await.unwrap();
        store.create_conversation(second.clone()).await.unwrap();

        let listed = store.list_conversations(&u.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "second");
        assert_eq!(listed[1].title, "first");
    }

    #[tokio::test]
    async fn conversations_are_scoped_to_their_owner() {
        let store = SqliteStore::in_memory().await;
        let alice = user("g-alice", "alice@example.com");
        let bob = user("g-bob", "bob@example.com");
        store.create_user(alice.clone()).await.unwrap();
        store.create_user(bob.clone()).await.unwrap();
        store
            .create_conversation(conversation(&alice.id, "alice chat"))
            .await
            .unwrap();

        assert_eq!(store.list_conversations(&alice.id).await.unwrap().len(), 1);
        assert!(store.list_conversations(&bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn messages_list_in_insertion_order() {
        let store = SqliteStore::in_memory().await;
        let u = user("g-1", "a@example.com");
        store.create_user(u.clone()).await.unwrap();
        let conv = conversation(&u.id, "chat");
        store.create_conversation(conv.clone()).await.unwrap();

        let mut question = msg(&conv.id, Role::User, "Explain recursion");
        let mut answer = msg(&conv.id, Role::Assistant, "Recursion is…");
        question.created_at = Utc::now() - chrono::Duration::seconds(2);
        answer.created_at = Utc::now();
        store.append_message(question).await.unwrap();
        store.append_message(answer).await.unwrap();

        let listed = store.list_messages(&conv.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].role, Role::User);
        assert_eq!(listed[0].content, "Explain recursion");
        assert_eq!(listed[1].role, Role::Assistant);
        assert!(listed[0].created_at <= listed[1].created_at);
    }

    #[tokio::test]
    async fn identical_message_within_window_is_not_double_written() {
        let store = SqliteStore::in_memory().await;
        let u = user("g-1", "a@example.com");
        store.create_user(u.clone()).await.unwrap();
        let conv = conversation(&u.id, "chat");
        store.create_conversation(conv.clone()).await.unwrap();

        let first_write = store
            .append_message(msg(&conv.id, Role::User, "hello"))
            .await
            .unwrap();
        let retried = store
            .append_message(msg(&conv.id, Role::User, "hello"))
            .await
            .unwrap();

        assert_eq!(retried.id, first_write.id);
        assert_eq!(store.list_messages(&conv.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn identical_message_outside_window_is_written_again() {
        let store = SqliteStore::in_memory().await;
        let u = user("g-1", "a@example.com");
        store.create_user(u.clone()).await.unwrap();
        let conv = conversation(&u.id, "chat");
        store.create_conversation(conv.clone()).await.unwrap();

        let mut old = msg(&conv.id, Role::User, "hello");
        old.created_at = Utc::now() - chrono::Duration::seconds(60);
        store.append_message(old).await.unwrap();
        store
            .append_message(msg(&conv.id, Role::User, "hello"))
            .await
            .unwrap();

        assert_eq!(store.list_messages(&conv.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn same_content_different_role_is_not_deduplicated() {
        let store = SqliteStore::in_memory().await;
        let u = user("g-1", "a@example.com");
        store.create_user(u.clone()).await.unwrap();
        let conv = conversation(&u.id, "chat");
        store.create_conversation(conv.clone()).await.unwrap();

        store
            .append_message(msg(&conv.id, Role::User, "echo"))
            .await
            .unwrap();
        store
            .append_message(msg(&conv.id, Role::Assistant, "echo"))
            .await
            .unwrap();

        assert_eq!(store.list_messages(&conv.id).await.unwrap().len(), 2);
    }
}
