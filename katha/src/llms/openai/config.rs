//! OpenAI-compatible client configuration.

use std::fmt;

/// Configuration for the OpenAI-compatible client.
#[derive(Clone)]
pub struct OpenAIConfig {
    /// Bearer credential for authentication.
    pub api_key: String,
    /// Base URL for the API (defaults to the Hugging Face router).
    pub base_url: String,
    /// Default chat model.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl OpenAIConfig {
    /// Default base URL: the Hugging Face inference router.
    pub const DEFAULT_BASE_URL: &'static str = "https://router.huggingface.co/v1";
    /// OpenAI's own API base URL.
    pub const OPENAI_BASE_URL: &'static str = "https://api.openai.com/v1";
    /// Default chat model.
    pub const DEFAULT_MODEL: &'static str = "meta-llama/Meta-Llama-3-8B-Instruct";

    /// Creates a new configuration with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Sets the base URL. A trailing slash is dropped.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Sets the default model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            model: Self::DEFAULT_MODEL.to_owned(),
            timeout_secs: Some(120),
        }
    }
}

impl fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_router_defaults() {
        let config = OpenAIConfig::new("hf_test");
        assert_eq!(config.api_key, "hf_test");
        assert_eq!(config.base_url, OpenAIConfig::DEFAULT_BASE_URL);
        assert_eq!(config.model, OpenAIConfig::DEFAULT_MODEL);
        assert_eq!(config.timeout_secs, Some(120));
    }

    #[test]
    fn builder_trims_base_url() {
        let config = OpenAIConfig::new("key")
            .with_base_url("http://localhost:8080/v1/")
            .with_model("gpt-4o-mini")
            .with_timeout(30);

        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout_secs, Some(30));
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", OpenAIConfig::new("hf_secret"));
        assert!(!rendered.contains("hf_secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
