//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! **Security note:** Internal errors (Database, Provider, Internal) are
//! logged with full detail but only a generic message is returned to the
//! caller so that SQL, upstream URLs, or other implementation details never
//! leak to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// All errors that can occur in the parley-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent invalid or missing input.
    #[error("validation error: {0}")]
    Validation(String),

    /// No bearer credential was presented on a protected route.
    #[error("no credential provided")]
    MissingCredential,

    /// The presented credential failed signature, expiry, or audience checks.
    #[error("invalid credential")]
    InvalidCredential,

    /// The caller referenced a resource that does not exist (or is not theirs).
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique constraint (email, provider subject id) was violated.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// The completion provider call failed after any applicable retries.
    #[error("completion provider error: {0}")]
    Provider(String),

    /// The provider returned 2xx but the payload lacks the completion text.
    #[error("invalid provider response: {0}")]
    InvalidProviderResponse(String),

    /// Propagated from the SQLite (or other) store.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::MissingCredential => {
                (StatusCode::UNAUTHORIZED, "no credential provided".to_owned())
            }
            ServerError::InvalidCredential => {
                (StatusCode::UNAUTHORIZED, "invalid credential".to_owned())
            }
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::DuplicateKey(m) => (StatusCode::CONFLICT, m.clone()),

            // Internal errors: log the full detail, return a generic message.
            ServerError::Provider(e) => {
                error!(error = %e, "completion provider error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "completion provider unavailable".to_owned(),
                )
            }
            ServerError::InvalidProviderResponse(e) => {
                error!(error = %e, "malformed completion provider response");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "completion provider unavailable".to_owned(),
                )
            }
            ServerError::Database(e) => {
                error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<sqlx::Error> for ServerError {
    fn from(e: sqlx::Error) -> Self {
        // Unique-constraint violations are a distinct case in the API contract
        // (conflicting email / provider subject id); everything else from the
        // store is an opaque database failure.
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ServerError::DuplicateKey(db.message().to_owned())
            }
            _ => ServerError::Database(e),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        // Log the full error chain before discarding it so that diagnostic
        // detail is preserved in the server logs even though clients only see
        // a generic message.
        error!(error = ?e, "converting anyhow error to ServerError::Internal");
        ServerError::Internal(e.to_string())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
