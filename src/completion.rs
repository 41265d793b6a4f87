//! Outbound client for the external chat-completion provider.
//!
//! Each call is a single-turn request: only the current prompt is sent, never
//! conversation history.  The one piece of resilience here is a bounded
//! retry on HTTP 429 — nothing else is ever retried.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ServerError;

/// Retries after the first attempt (4 requests total worst-case).
const MAX_RETRIES: u32 = 3;
/// First backoff delay; doubles on each subsequent retry: 2 s, 4 s, 8 s.
const INITIAL_BACKOFF_MS: u64 = 2000;

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    messages: [PromptMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct PromptMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Client for an Azure-OpenAI-style chat-completions deployment.
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the key material.
        f.debug_struct("CompletionClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl CompletionClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            config.openai_endpoint.trim_end_matches('/'),
            config.openai_deployment,
            config.openai_api_version,
        );
        Self {
            http,
            url,
            api_key: config.openai_api_key.clone(),
        }
    }

    /// Request a completion for `prompt`, retrying only while the provider
    /// answers 429 and retries remain.  5xx, transport errors, and malformed
    /// payloads propagate immediately.
    pub async fn complete(&self, prompt: &str) -> Result<String, ServerError> {
        let body = CompletionRequest {
            messages: [PromptMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut retries_left = MAX_RETRIES;
        let mut delay_ms = INITIAL_BACKOFF_MS;
        loop {
            let resp = self
                .http
                .post(&self.url)
                .header("api-key", &self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| ServerError::Provider(format!("completion request failed: {e}")))?;

            let status = resp.status();
            if should_retry(status, retries_left) {
                warn!(
                    delay_ms,
                    retries_left, "completion provider rate limited; backing off"
                );
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                retries_left -= 1;
                delay_ms *= 2;
                continue;
            }

            if !status.is_success() {
                return Err(ServerError::Provider(format!(
                    "completion provider returned {status}"
                )));
            }

            let payload: CompletionResponse = resp.json().await.map_err(|e| {
                ServerError::InvalidProviderResponse(format!("unreadable payload: {e}"))
            })?;
            let reply = extract_reply(payload)?;
            debug!(reply_len = reply.len(), "completion received");
            return Ok(reply);
        }
    }
}

/// The retry predicate, verbatim: HTTP 429 AND remaining retries > 0.
fn should_retry(status: StatusCode, retries_left: u32) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS && retries_left > 0
}

/// Pull the completion text out of the provider payload.
fn extract_reply(payload: CompletionResponse) -> Result<String, ServerError> {
    payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| {
            ServerError::InvalidProviderResponse(
                "payload lacks choices[0].message.content".to_owned(),
            )
        })
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn retries_only_on_429_with_budget() {
        assert!(should_retry(StatusCode::TOO_MANY_REQUESTS, 3));
        assert!(should_retry(StatusCode::TOO_MANY_REQUESTS, 1));
        assert!(!should_retry(StatusCode::TOO_MANY_REQUESTS, 0));
    }

    #[test]
    fn never_retries_other_failures() {
        assert!(!should_retry(StatusCode::INTERNAL_SERVER_ERROR, 3));
        assert!(!should_retry(StatusCode::BAD_GATEWAY, 3));
        assert!(!should_retry(StatusCode::BAD_REQUEST, 3));
        assert!(!should_retry(StatusCode::OK, 3));
    }

    #[test]
    fn backoff_schedule_doubles_from_two_seconds() {
        let mut delay_ms = INITIAL_BACKOFF_MS;
        let mut schedule = Vec::new();
        for _ in 0..MAX_RETRIES {
            schedule.push(delay_ms);
            delay_ms *= 2;
        }
        assert_eq!(schedule, vec![2000, 4000, 8000]);
    }

    #[test]
    fn extract_reply_returns_completion_text() {
        let payload: CompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "hello there" } }]
        }))
        .unwrap();
        assert_eq!(extract_reply(payload).unwrap(), "hello there");
    }

    #[test]
    fn missing_content_is_invalid_provider_response() {
        let payload: CompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [{ "message": { "role": "assistant" } }]
        }))
        .unwrap();
        assert!(matches!(
            extract_reply(payload).unwrap_err(),
            ServerError::InvalidProviderResponse(_)
        ));
    }

    #[test]
    fn empty_choices_is_invalid_provider_response() {
        let payload: CompletionResponse =
            serde_json::from_value(serde_json::json!({ "choices": [] })).unwrap();
        assert!(matches!(
            extract_reply(payload).unwrap_err(),
            ServerError::InvalidProviderResponse(_)
        ));
    }

    #[test]
    fn url_is_assembled_from_endpoint_deployment_and_version() {
        let config = Config {
            bind_address: "0.0.0.0:3000".into(),
            database_url: "sqlite::memory:".into(),
            session_secret: "s".into(),
            google_client_id: "c".into(),
            openai_endpoint: "https://acme.openai.azure.com/".into(),
            openai_deployment: "gpt-4o".into(),
            openai_api_version: "2024-02-01".into(),
            openai_api_key: "k".into(),
            log_level: "info".into(),
            log_json: false,
            cors_allowed_origins: None,
            enable_swagger: false,
        };
        let client = CompletionClient::new(reqwest::Client::new(), &config);
        assert_eq!(
            client.url,
            "https://acme.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-01"
        );
    }
}
