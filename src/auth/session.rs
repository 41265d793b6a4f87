//! Session token signing and verification.
//!
//! Tokens are HMAC-SHA256-signed JWTs carrying only registered claims: the
//! user id as subject, issued-at, and a fixed 7-day expiry.  There is no
//! refresh mechanism — an expired token means signing in again.

use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{Claims, Header, RegisteredClaims, SignWithKey, Token, VerifyWithKey};
use sha2::Sha256;

use crate::error::ServerError;

/// Validity window for issued session tokens.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Signs and verifies session tokens with a process-wide secret.
#[derive(Clone)]
pub struct SessionIssuer {
    key: Hmac<Sha256>,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the key material.
        f.write_str("SessionIssuer")
    }
}

impl SessionIssuer {
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        let key = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid session signing secret: {e}"))?;
        Ok(Self { key })
    }

    /// Produce a signed token embedding `user_id`, valid for
    /// [`SESSION_TTL_DAYS`] from now.
    pub fn issue(&self, user_id: &str) -> Result<String, ServerError> {
        let now = Utc::now();
        let claims = Claims {
            registered: RegisteredClaims {
                subject: Some(user_id.to_owned()),
                issued_at: Some(now.timestamp() as u64),
                expiration: Some((now + Duration::days(SESSION_TTL_DAYS)).timestamp() as u64),
                ..Default::default()
            },
            private: Default::default(),
        };
        claims
            .sign_with_key(&self.key)
            .map_err(|e| ServerError::Internal(format!("failed to sign session token: {e}")))
    }

    /// Check signature and expiry, returning the embedded user id.
    pub fn verify(&self, token: &str) -> Result<String, ServerError> {
        let token: Token<Header, Claims, _> = token
            .verify_with_key(&self.key)
            .map_err(|_| ServerError::InvalidCredential)?;
        let claims = token.claims();

        let exp = claims
            .registered
            .expiration
            .ok_or(ServerError::InvalidCredential)?;
        if (exp as i64) < Utc::now().timestamp() {
            return Err(ServerError::InvalidCredential);
        }

        claims
            .registered
            .subject
            .clone()
            .ok_or(ServerError::InvalidCredential)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
