//! HTTP client for the chat-completion endpoint.
//!
//! One request in flight at a time. A 400 whose error code is
//! `unsupported_value` is retried exactly once with the minimal payload;
//! nothing else is retried.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, StatusCode};

use crate::error::{Result, ScribeError};
use crate::model::chat::{ApiErrorBody, CompletionPayload, CompletionResponse};

/// Default API root; `/chat/completions` and `/models` hang off it.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Error code that triggers the degrade-and-retry.
const UNSUPPORTED_VALUE: &str = "unsupported_value";

pub struct CompletionClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl CompletionClient {
    /// `timeout` of `None` means no client-side limit.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder =
            ClientBuilder::new().user_agent(concat!("mailscribe/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ScribeError::Http)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into().trim().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fail with a configuration error when no key is set.
    pub fn ensure_key(&self) -> Result<()> {
        self.require_key().map(|_| ())
    }

    fn require_key(&self) -> Result<&str> {
        if self.api_key.is_empty() {
            return Err(ScribeError::missing_api_key());
        }
        Ok(&self.api_key)
    }

    /// Send `payload` and return the raw success body.
    pub async fn send(&self, payload: &CompletionPayload) -> Result<String> {
        let key = self.require_key()?;
        tracing::info!(model = %payload.model, messages = payload.messages.len(), "Sending completion request");

        let (status, body) = self.post(key, payload).await?;
        if status.is_success() {
            return Ok(body);
        }

        if status == StatusCode::BAD_REQUEST && is_unsupported_value(&body) {
            tracing::debug!(model = %payload.model, "Unsupported parameter value, retrying with minimal payload");
            let (status, body) = self.post(key, &payload.minimal()).await?;
            if status.is_success() {
                return Ok(body);
            }
            return Err(remote_error(status, body));
        }

        Err(remote_error(status, body))
    }

    /// Send `payload` and return the first choice's trimmed text.
    pub async fn complete(&self, payload: &CompletionPayload) -> Result<String> {
        let raw = self.send(payload).await?;
        let response: CompletionResponse = serde_json::from_str(&raw)?;
        let text = response.first_text().ok_or(ScribeError::EmptyResponse)?;
        tracing::info!(chars = text.len(), "Completion received");
        Ok(text)
    }

    /// `GET /models` with the configured key; `Ok` means the key was accepted.
    pub async fn check_credentials(&self) -> Result<()> {
        let key = self.require_key()?;
        let resp = self
            .http
            .get(format!("{}/models", self.base_url))
            .bearer_auth(key)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            tracing::info!("API key accepted");
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(remote_error(status, body))
    }

    async fn post(&self, key: &str, payload: &CompletionPayload) -> Result<(StatusCode, String)> {
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        tracing::debug!(status = status.as_u16(), "Completion response");
        Ok((status, body))
    }
}

fn is_unsupported_value(body: &str) -> bool {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|err| err.error.code)
        .is_some_and(|code| code == UNSUPPORTED_VALUE)
}

fn remote_error(status: StatusCode, body: String) -> ScribeError {
    tracing::warn!(status = status.as_u16(), "Completion API returned an error");
    ScribeError::RemoteCall {
        status: status.as_u16(),
        body,
    }
}
