//! Pipeline configuration.
//!
//! Connection parameters for the hosted inference endpoint are owned by
//! the caller and passed in explicitly; there are no process-wide
//! globals. Build a [`PipelineConfig`] with the builder or from
//! environment variables.
//!
//! # Example
//!
//! ```rust,ignore
//! use relic::PipelineConfig;
//!
//! // From environment variables
//! let config = PipelineConfig::from_env()?;
//!
//! // With explicit settings
//! let config = PipelineConfig::builder()
//!     .api_key("sk-...")
//!     .vision_model("gpt-4o")
//!     .timeout_secs(60)
//!     .build()?;
//! ```

use crate::error::{PipelineError, Result};

/// Default chat-completions API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default vision-capable model used by the detection pipeline.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";

/// Default text model used by the research pipeline.
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4-turbo";

/// Default number of search results requested per research query.
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 5;

/// Connection and model parameters for the pipeline.
#[derive(Clone)]
pub struct PipelineConfig {
    /// API key for the inference endpoint.
    pub api_key: String,
    /// Base URL of the chat-completions API.
    pub base_url: String,
    /// Model identifier used for image analysis.
    pub vision_model: String,
    /// Model identifier used for research synthesis.
    pub text_model: String,
    /// Request timeout in seconds. `None` leaves the client default.
    pub timeout_secs: Option<u64>,
    /// Maximum number of results per web-search query.
    pub max_search_results: usize,
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("vision_model", &self.vision_model)
            .field("text_model", &self.text_model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_search_results", &self.max_search_results)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a config with the given API key and all other settings at
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Create a new config builder.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Create a config from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RELIC_API_KEY` (or `OPENAI_API_KEY` as a fallback, required)
    /// - `RELIC_BASE_URL` (optional)
    /// - `RELIC_VISION_MODEL` (optional)
    /// - `RELIC_TEXT_MODEL` (optional)
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if no API key variable is set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("RELIC_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                PipelineError::config("RELIC_API_KEY or OPENAI_API_KEY must be set")
            })?;

        let mut builder = Self::builder().api_key(api_key);

        if let Ok(base_url) = std::env::var("RELIC_BASE_URL") {
            builder = builder.base_url(base_url);
        }
        if let Ok(model) = std::env::var("RELIC_VISION_MODEL") {
            builder = builder.vision_model(model);
        }
        if let Ok(model) = std::env::var("RELIC_TEXT_MODEL") {
            builder = builder.text_model(model);
        }

        builder.build()
    }

    /// Build a `reqwest` client honouring the configured timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client fails to build.
    #[must_use]
    pub fn http_client(&self) -> reqwest::Client {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(timeout));
        }
        builder.build().expect("Failed to build HTTP client")
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    vision_model: Option<String>,
    text_model: Option<String>,
    timeout_secs: Option<u64>,
    max_search_results: Option<usize>,
}

impl PipelineConfigBuilder {
    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set a custom base URL (proxies, compatible APIs, local models).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the vision model identifier.
    #[must_use]
    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = Some(model.into());
        self
    }

    /// Set the text model identifier.
    #[must_use]
    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = Some(model.into());
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub const fn timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = Some(timeout);
        self
    }

    /// Set the maximum number of results per web-search query.
    #[must_use]
    pub const fn max_search_results(mut self, max: usize) -> Self {
        self.max_search_results = Some(max);
        self
    }

    /// Build the config.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the API key is missing or
    /// empty.
    pub fn build(self) -> Result<PipelineConfig> {
        let api_key = self
            .api_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| PipelineError::config("API key is required"))?;

        Ok(PipelineConfig {
            api_key,
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            vision_model: self
                .vision_model
                .unwrap_or_else(|| DEFAULT_VISION_MODEL.to_owned()),
            text_model: self
                .text_model
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_owned()),
            timeout_secs: self.timeout_secs,
            max_search_results: self.max_search_results.unwrap_or(DEFAULT_MAX_SEARCH_RESULTS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = PipelineConfig::new("test-key").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.vision_model, DEFAULT_VISION_MODEL);
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.max_search_results, DEFAULT_MAX_SEARCH_RESULTS);
        assert!(config.timeout_secs.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::builder()
            .api_key("test-key")
            .base_url("https://llm.example.com/v1")
            .vision_model("pixtral-large")
            .text_model("mistral-large")
            .timeout_secs(30)
            .max_search_results(3)
            .build()
            .unwrap();

        assert_eq!(config.base_url, "https://llm.example.com/v1");
        assert_eq!(config.vision_model, "pixtral-large");
        assert_eq!(config.text_model, "mistral-large");
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.max_search_results, 3);
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        assert!(PipelineConfig::builder().build().is_err());
        assert!(PipelineConfig::builder().api_key("").build().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = PipelineConfig::new("super-secret").unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
