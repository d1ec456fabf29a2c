//! Google Translate TTS configuration.

/// Configuration for [`GoogleTts`](super::GoogleTts).
#[derive(Debug, Clone)]
pub struct GoogleTtsConfig {
    /// Translate host, e.g. `https://translate.google.com`.
    pub base_url: String,
    /// Default spoken language (IETF tag understood by Translate).
    pub lang: String,
    /// Maximum characters per synthesized chunk.
    pub max_chunk_chars: usize,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl GoogleTtsConfig {
    /// Default Translate host.
    pub const DEFAULT_BASE_URL: &'static str = "https://translate.google.com";
    /// Default language.
    pub const DEFAULT_LANG: &'static str = "en";
    /// Translate rejects longer inputs on this endpoint.
    pub const DEFAULT_MAX_CHUNK_CHARS: usize = 100;

    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a regional Translate domain (e.g. `co.in`, `co.uk`).
    #[must_use]
    pub fn tld(mut self, tld: &str) -> Self {
        self.base_url = format!("https://translate.google.{}", tld.trim_matches('.'));
        self
    }

    /// Sets the base URL directly. A trailing slash is dropped.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Sets the default language.
    #[must_use]
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

impl Default for GoogleTtsConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            lang: Self::DEFAULT_LANG.to_owned(),
            max_chunk_chars: Self::DEFAULT_MAX_CHUNK_CHARS,
            timeout_secs: Some(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tld_rewrites_host() {
        let config = GoogleTtsConfig::new().tld("co.in");
        assert_eq!(config.base_url, "https://translate.google.co.in");
    }

    #[test]
    fn defaults() {
        let config = GoogleTtsConfig::default();
        assert_eq!(config.lang, "en");
        assert_eq!(config.max_chunk_chars, 100);
    }
}
