//! Shared application state injected into every Axum handler.
//!
//! Everything here is constructed once in `main` and passed in explicitly,
//! so tests can assemble the same state around an in-memory store.

use std::sync::Arc;

use crate::auth::{GoogleVerifier, SessionIssuer};
use crate::completion::CompletionClient;
use crate::config::Config;
use crate::entities::SqliteStore;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Persistent user / conversation / message store.
    pub store: Arc<SqliteStore>,
    /// Session token signing and verification.
    pub sessions: SessionIssuer,
    /// Google ID-token verification.
    pub google: GoogleVerifier,
    /// Outbound completion-provider client.
    pub completions: CompletionClient,
}
