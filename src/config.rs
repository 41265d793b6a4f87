//! Server configuration, loaded from environment variables at startup.

/// Runtime configuration for parley-server.
///
/// Connection strings and credentials have no defaults: startup fails with a
/// descriptive error naming the missing variable.  Everything else falls back
/// to a value that works out-of-the-box in development.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// SQLite (or other sqlx-compatible) database URL.
    pub database_url: String,

    /// HMAC secret used to sign session tokens.
    pub session_secret: String,

    /// Google OAuth client id; inbound ID tokens must carry it as audience.
    pub google_client_id: String,

    /// Base URL of the Azure OpenAI resource, e.g. `https://acme.openai.azure.com`.
    pub openai_endpoint: String,

    /// Deployment name of the chat model within the Azure resource.
    pub openai_deployment: String,

    /// Azure OpenAI REST API version, e.g. `"2024-02-01"`.
    pub openai_api_version: String,

    /// API key sent in the `api-key` header on completion calls.
    pub openai_api_key: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated CORS origin allow-list; `None` means wildcard.
    pub cors_allowed_origins: Option<String>,

    /// Serve the Swagger UI at `/swagger-ui` (disable in production).
    pub enable_swagger: bool,
}

impl Config {
    /// Build [`Config`] from environment variables.
    ///
    /// Returns an error for each credential-bearing variable that is absent,
    /// so the process exits before binding a socket with a half-configured
    /// auth or provider stack.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bind_address: env_or("PARLEY_BIND", "0.0.0.0:3000"),
            database_url: require("PARLEY_DATABASE_URL")?,
            session_secret: require("PARLEY_SESSION_SECRET")?,
            google_client_id: require("PARLEY_GOOGLE_CLIENT_ID")?,
            openai_endpoint: require("PARLEY_OPENAI_ENDPOINT")?,
            openai_deployment: require("PARLEY_OPENAI_DEPLOYMENT")?,
            openai_api_version: require("PARLEY_OPENAI_API_VERSION")?,
            openai_api_key: require("PARLEY_OPENAI_API_KEY")?,
            log_level: env_or("PARLEY_LOG", "info"),
            log_json: env_flag("PARLEY_LOG_JSON"),
            cors_allowed_origins: std::env::var("PARLEY_CORS_ORIGINS").ok(),
            enable_swagger: std::env::var("PARLEY_ENABLE_SWAGGER")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        })
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn require(key: &str) -> anyhow::Result<String> {
    std::env::var(key)
        .map_err(|_| anyhow::anyhow!("missing required environment variable {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn require_reports_missing_variable_by_name() {
        let err = require("PARLEY_TEST_DOES_NOT_EXIST").unwrap_err();
        assert!(err.to_string().contains("PARLEY_TEST_DOES_NOT_EXIST"));
    }

    #[test]
    fn env_or_falls_back_to_default() {
        assert_eq!(env_or("PARLEY_TEST_UNSET_FALLBACK", "x"), "x");
    }

    #[test]
    fn env_flag_accepts_1_and_true() {
        // SAFETY: test-local variable names, not read anywhere else.
        unsafe {
            std::env::set_var("PARLEY_TEST_FLAG_ONE", "1");
            std::env::set_var("PARLEY_TEST_FLAG_TRUE", "TRUE");
            std::env::set_var("PARLEY_TEST_FLAG_OFF", "no");
        }
        assert!(env_flag("PARLEY_TEST_FLAG_ONE"));
        assert!(env_flag("PARLEY_TEST_FLAG_TRUE"));
        assert!(!env_flag("PARLEY_TEST_FLAG_OFF"));
        assert!(!env_flag("PARLEY_TEST_FLAG_UNSET"));
    }
}
