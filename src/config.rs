//! Configuration types for purchase-order extraction and the web form.
//!
//! Extraction behaviour is controlled through [`ExtractionConfig`], built via
//! [`ExtractionConfigBuilder`]. The web form has its own small
//! [`ServerConfig`]. The API key is deliberately *not* part of either: it is
//! supplied per extraction, by the user of the form or by the CLI.

use crate::error::PoExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Default Anthropic API base URL; `/messages` is appended per call.
pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Value sent in the `anthropic-version` header.
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";

/// Configuration for one purchase-order extraction.
///
/// # Example
/// ```rust
/// use po_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .max_pages(5)
///     .model("claude-3-7-sonnet-20250219")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_pages, 5);
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum number of pages rendered and sent. Default: 10.
    ///
    /// Pages past this bound are dropped without an error.
    pub max_pages: usize,

    /// Linear zoom applied to the native page size when rendering. Default: 2.0.
    pub zoom: f32,

    /// Model identifier sent in the request body.
    pub model: String,

    /// Token budget for the reply. Default: 4000.
    pub max_tokens: u32,

    /// Sampling temperature. Default: 0.0.
    pub temperature: f32,

    /// Base URL of the Messages API, without the trailing `/messages`.
    pub api_base_url: String,

    /// `anthropic-version` header value.
    pub api_version: String,

    /// Timeout for the single API call, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, the prompt is chosen by [`ExtractionMode`].
    pub system_prompt: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            zoom: 2.0,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4000,
            temperature: 0.0,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_timeout_secs: 120,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_pages", &self.max_pages)
            .field("zoom", &self.zoom)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("api_base_url", &self.api_base_url)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "system_prompt",
                &self.system_prompt.as_ref().map(|p| format!("<{} chars>", p.len())),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the Messages endpoint.
    pub fn messages_url(&self) -> String {
        format!("{}/messages", self.api_base_url.trim_end_matches('/'))
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn zoom(mut self, zoom: f32) -> Self {
        self.config.zoom = zoom;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, PoExtractError> {
        let c = &self.config;
        if c.max_pages == 0 {
            return Err(PoExtractError::InvalidConfig(
                "max_pages must be ≥ 1".into(),
            ));
        }
        if !(0.25..=8.0).contains(&c.zoom) {
            return Err(PoExtractError::InvalidConfig(format!(
                "zoom must be 0.25–8.0, got {}",
                c.zoom
            )));
        }
        if !(0.0..=1.0).contains(&c.temperature) {
            return Err(PoExtractError::InvalidConfig(format!(
                "temperature must be 0.0–1.0, got {}",
                c.temperature
            )));
        }
        if c.max_tokens == 0 {
            return Err(PoExtractError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(PoExtractError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if !(c.api_base_url.starts_with("http://") || c.api_base_url.starts_with("https://")) {
            return Err(PoExtractError::InvalidConfig(format!(
                "api_base_url must be an HTTP(S) URL, got '{}'",
                c.api_base_url
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which rule set the system prompt carries.
///
/// | Mode | Fields |
/// |------|--------|
/// | `basic` | PO header, customer, vendor, line-item tables |
/// | `advanced` | basic + shipping, payment terms, discounts, tax, notes |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    #[default]
    Basic,
    Advanced,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMode::Basic => "basic",
            ExtractionMode::Advanced => "advanced",
        }
    }

    /// Label shown next to the radio button in the web form.
    pub fn label(&self) -> &'static str {
        match self {
            ExtractionMode::Basic => "Basic (Standard Fields)",
            ExtractionMode::Advanced => "Advanced (All Fields)",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMode {
    type Err = PoExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(ExtractionMode::Basic),
            "advanced" => Ok(ExtractionMode::Advanced),
            other => Err(PoExtractError::InvalidMode(other.to_string())),
        }
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Settings for the web form.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to. Default: 127.0.0.1:8501.
    pub bind: SocketAddr,

    /// Largest accepted PDF upload in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,

    /// Idle time after which a session and its document are dropped.
    /// Default: one hour.
    pub session_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
            max_upload_bytes: 20 * 1024 * 1024,
            session_ttl: crate::session::DEFAULT_SESSION_TTL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_messages_api_contract() {
        let c = ExtractionConfig::default();
        assert_eq!(c.max_pages, 10);
        assert_eq!(c.zoom, 2.0);
        assert_eq!(c.max_tokens, 4000);
        assert_eq!(c.temperature, 0.0);
        assert_eq!(c.api_timeout_secs, 120);
        assert_eq!(c.messages_url(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn messages_url_tolerates_trailing_slash() {
        let c = ExtractionConfig::builder()
            .api_base_url("http://127.0.0.1:9999/v1/")
            .build()
            .unwrap();
        assert_eq!(c.messages_url(), "http://127.0.0.1:9999/v1/messages");
    }

    #[test]
    fn builder_rejects_zero_pages() {
        let err = ExtractionConfig::builder().max_pages(0).build().unwrap_err();
        assert!(err.to_string().contains("max_pages"));
    }

    #[test]
    fn builder_rejects_out_of_range_temperature() {
        for t in [1.5, -0.1, f32::NAN] {
            let err = ExtractionConfig::builder().temperature(t).build().unwrap_err();
            assert!(matches!(err, PoExtractError::InvalidConfig(_)), "t = {t}");
            assert!(err.to_string().contains("temperature"));
        }
        let c = ExtractionConfig::builder().temperature(0.7).build().unwrap();
        assert_eq!(c.temperature, 0.7);
    }

    #[test]
    fn server_defaults_include_session_ttl() {
        let s = ServerConfig::default();
        assert_eq!(s.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(s.session_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn builder_rejects_non_http_base_url() {
        assert!(ExtractionConfig::builder()
            .api_base_url("ftp://example.com")
            .build()
            .is_err());
    }

    #[test]
    fn mode_parsing_is_a_closed_choice() {
        assert_eq!("basic".parse::<ExtractionMode>().unwrap(), ExtractionMode::Basic);
        assert_eq!(
            " Advanced ".parse::<ExtractionMode>().unwrap(),
            ExtractionMode::Advanced
        );
        assert!("full".parse::<ExtractionMode>().is_err());
        assert!("".parse::<ExtractionMode>().is_err());
    }

    #[test]
    fn debug_hides_prompt_text() {
        let c = ExtractionConfig::builder()
            .system_prompt("secret rules")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret rules"));
        assert!(dbg.contains("12 chars"));
    }
}
