//! Messages API client: one POST, one answer.
//!
//! There is no retry and no backoff. A non-2xx status is surfaced with the
//! raw response body so the user sees exactly what the API said (invalid key,
//! overloaded, oversized image…).

use crate::config::ExtractionConfig;
use crate::error::PoExtractError;
use crate::pipeline::request::{ExtractionRequest, MessagesBody};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const API_KEY_HEADER: &str = "x-api-key";
const API_VERSION_HEADER: &str = "anthropic-version";

/// Thin client over `POST {api_base_url}/messages`.
#[derive(Debug, Clone)]
pub struct MessagesClient {
    http: reqwest::Client,
    url: String,
    config: ExtractionConfig,
}

impl MessagesClient {
    /// Build a client for one credential.
    ///
    /// The key is stored in a sensitive header value so it never shows up in
    /// `Debug` output.
    pub fn new(api_key: &str, config: &ExtractionConfig) -> Result<Self, PoExtractError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(PoExtractError::MissingCredential);
        }

        let mut key = HeaderValue::from_str(api_key).map_err(|_| {
            PoExtractError::InvalidConfig("API key contains characters not allowed in a header".into())
        })?;
        key.set_sensitive(true);

        let version = HeaderValue::from_str(&config.api_version).map_err(|_| {
            PoExtractError::InvalidConfig(format!("invalid API version '{}'", config.api_version))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);
        headers.insert(API_VERSION_HEADER, version);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| PoExtractError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: config.messages_url(),
            config: config.clone(),
        })
    }

    /// Send the request and return the parsed JSON body unmodified.
    pub async fn create_message(&self, request: &ExtractionRequest) -> Result<Value, PoExtractError> {
        let body = MessagesBody::new(request, &self.config);
        let start = Instant::now();
        info!(
            "POST {} (model={}, images={})",
            self.url,
            self.config.model,
            request.image_count()
        );

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = status_body(response.text().await);
            warn!("Messages API returned {}", status);
            return Err(PoExtractError::ApiStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let value: Value = response.json().await.map_err(|e| self.transport_error(e))?;
        debug!("Messages API answered in {:?}", start.elapsed());
        Ok(value)
    }

    fn transport_error(&self, e: reqwest::Error) -> PoExtractError {
        if e.is_timeout() {
            PoExtractError::ApiTimeout {
                secs: self.config.api_timeout_secs,
            }
        } else {
            PoExtractError::Transport(e.to_string())
        }
    }
}

/// Body text for an [`PoExtractError::ApiStatus`], or why it could not be read.
fn status_body<E: std::fmt::Display>(read: Result<String, E>) -> String {
    match read {
        Ok(text) => text,
        Err(e) => format!("<response body unreadable: {e}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_status_body_keeps_the_read_error() {
        assert_eq!(status_body::<String>(Ok("overloaded".into())), "overloaded");
        let body = status_body(Err("connection reset"));
        assert_eq!(body, "<response body unreadable: connection reset>");
    }

    #[test]
    fn blank_key_is_rejected() {
        let err = MessagesClient::new("   ", &ExtractionConfig::default()).unwrap_err();
        assert!(matches!(err, PoExtractError::MissingCredential));
    }

    #[test]
    fn key_with_newline_is_rejected() {
        let err = MessagesClient::new("sk-ant\nx", &ExtractionConfig::default()).unwrap_err();
        assert!(matches!(err, PoExtractError::InvalidConfig(_)));
    }

    #[test]
    fn debug_does_not_leak_key() {
        let client = MessagesClient::new("sk-ant-secret", &ExtractionConfig::default()).unwrap();
        assert!(!format!("{client:?}").contains("sk-ant-secret"));
    }
}
