//! Google ID-token verification.
//!
//! Verification is delegated to Google's `tokeninfo` endpoint, which checks
//! the token's signature, issuer, and expiry server-side; the audience claim
//! is checked here against the configured OAuth client id.  The call is
//! read-only and never retried — an invalid token is reported to the caller
//! immediately.

use serde::Deserialize;
use tracing::debug;

use crate::error::ServerError;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Verified identity claims extracted from a Google ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleClaims {
    /// Google's stable subject identifier for the account.
    pub sub: String,
    /// Audience the token was minted for; must match our client id.
    pub aud: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Validates Google ID tokens for a single OAuth client id.
#[derive(Clone, Debug)]
pub struct GoogleVerifier {
    http: reqwest::Client,
    client_id: String,
}

impl GoogleVerifier {
    pub fn new(http: reqwest::Client, client_id: impl Into<String>) -> Self {
        Self {
            http,
            client_id: client_id.into(),
        }
    }

    /// Validate `id_token` and extract its identity claims.
    ///
    /// Malformed, expired, or wrong-audience tokens yield
    /// [`ServerError::InvalidCredential`]; a transport failure reaching
    /// Google is an internal error, not a credential problem.
    pub async fn verify(&self, id_token: &str) -> Result<GoogleClaims, ServerError> {
        let resp = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| ServerError::Internal(format!("tokeninfo request failed: {e}")))?;

        // Google answers 4xx for anything it cannot validate (bad signature,
        // expired, garbage input).
        if !resp.status().is_success() {
            debug!(status = %resp.status(), "tokeninfo rejected the id token");
            return Err(ServerError::InvalidCredential);
        }

        let claims: GoogleClaims = resp
            .json()
            .await
            .map_err(|e| ServerError::Internal(format!("tokeninfo payload unreadable: {e}")))?;

        check_audience(&claims, &self.client_id)?;
        Ok(claims)
    }
}

/// Reject tokens minted for a different OAuth client.
fn check_audience(claims: &GoogleClaims, client_id: &str) -> Result<(), ServerError> {
    if claims.aud != client_id {
        debug!(aud = %claims.aud, "id token audience mismatch");
        return Err(ServerError::InvalidCredential);
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
