use std::future::Future;

use chrono::Utc;

use crate::entities::{SqliteStore, dao::User};

pub trait UserStore: Send + Sync + 'static {
    /// Insert a new user.  Surfaces the store's unique-constraint error when
    /// the email or Google subject id already exists.
    fn create_user(&self, user: User) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_user_by_google_id(
        &self,
        google_id: &str,
    ) -> impl Future<Output = Result<Option<User>, sqlx::Error>> + Send;
    fn get_user_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<User>, sqlx::Error>> + Send;
}

type UserRow = (String, String, String, String, Option<String>, String);

fn row_to_user((id, google_id, email, name, picture, created_at): UserRow) -> User {
    User {
        id,
        google_id,
        email,
        name,
        picture,
        created_at: created_at.parse().unwrap_or_else(|e: chrono::ParseError| {
            tracing::warn!(raw = %created_at, error = %e, "failed to parse user created_at; using now");
            Utc::now()
        }),
    }
}

impl UserStore for SqliteStore {
    async fn create_user(&self, user: User) -> Result<(), sqlx::Error> {
        let created_at = user.created_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO users (id, google_id, email, name, picture, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&user.id)
        .bind(&user.google_id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.picture)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, google_id, email, name, picture, created_at \
             FROM users WHERE google_id = ?1",
        )
        .bind(google_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_user))
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, google_id, email, name, picture, created_at \
             FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_user))
    }
}
