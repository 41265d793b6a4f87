//! Authentication components.
//!
//! [`google::GoogleVerifier`] validates third-party identity tokens;
//! [`session::SessionIssuer`] signs and verifies the server's own session
//! tokens.  The request-level gate lives in [`crate::middleware::auth`].

pub mod google;
pub mod session;

pub use google::GoogleVerifier;
pub use session::SessionIssuer;
