//! Configuration schema definitions.
//!
//! A config file only needs the keys it changes; every section has defaults
//! matching a local-first setup with Google narration.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KathaConfig {
    /// Chat backend settings.
    #[serde(default)]
    pub llm: LlmSettings,

    /// Narration settings.
    #[serde(default)]
    pub speech: SpeechSettings,

    /// Web server settings.
    #[serde(default)]
    pub server: ServerSettings,
}

/// Which chat backend writes the stories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// OpenAI-compatible hosted endpoint (Hugging Face router by default).
    #[serde(alias = "openai", alias = "huggingface")]
    Hosted,
    /// Local Ollama server.
    #[default]
    #[serde(alias = "ollama")]
    Local,
}

impl Backend {
    /// Config-file spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hosted => "hosted",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosted" | "openai" | "huggingface" => Ok(Self::Hosted),
            "local" | "ollama" => Ok(Self::Local),
            other => Err(format!("unknown backend '{other}' (expected hosted or local)")),
        }
    }
}

/// Chat backend settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Backend kind.
    #[serde(default)]
    pub backend: Backend,
    /// Model override; the backend default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Model offered as "Fine-Tuned Model" on the form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fine_tuned_model: Option<String>,
    /// Endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Bearer credential for the hosted backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Token limit for every story request.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Request timeout; 120s hosted, 300s local when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

const fn default_max_output_tokens() -> u32 {
    1500
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model: None,
            fine_tuned_model: None,
            base_url: None,
            api_key: None,
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: None,
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("fine_tuned_model", &self.fine_tuned_model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Which speech backend reads stories aloud.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackend {
    /// Google Translate voice, no credential needed.
    #[default]
    Google,
    /// OpenAI-compatible `/audio/speech`.
    OpenAI,
    /// No narration; the Listen button is hidden.
    #[serde(rename = "none", alias = "disabled", alias = "off")]
    Disabled,
}

/// Narration settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// Backend kind.
    #[serde(default)]
    pub backend: SpeechBackend,
    /// Spoken language.
    #[serde(default = "default_language")]
    pub language: String,
    /// Regional Translate domain (e.g. `co.in`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tld: Option<String>,
    /// Voice for the OpenAI backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Speech model for the OpenAI backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Endpoint override for the OpenAI backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Bearer credential for the OpenAI backend. Never shared with `llm`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Speaking speed, 0.25 to 4.0. Google only distinguishes slow (< 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    /// Request timeout.
    #[serde(default = "default_speech_timeout")]
    pub timeout_secs: u64,
}

fn default_language() -> String {
    "en".to_owned()
}

const fn default_speech_timeout() -> u64 {
    60
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            backend: SpeechBackend::default(),
            language: default_language(),
            tld: None,
            voice: None,
            model: None,
            base_url: None,
            api_key: None,
            speed: None,
            timeout_secs: default_speech_timeout(),
        }
    }
}

impl fmt::Debug for SpeechSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechSettings")
            .field("backend", &self.backend)
            .field("language", &self.language)
            .field("tld", &self.tld)
            .field("voice", &self.voice)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("speed", &self.speed)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Web server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen address.
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Idle time after which a visitor's story is forgotten.
    #[serde(default = "default_session_idle")]
    pub session_idle_secs: u64,
}

fn default_addr() -> String {
    "127.0.0.1:8501".to_owned()
}

const fn default_session_idle() -> u64 {
    3600
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            session_idle_secs: default_session_idle(),
        }
    }
}

impl KathaConfig {
    /// Validate the configuration and return any issues found.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let is_set = |key: Option<&str>| key.is_some_and(|k| !k.trim().is_empty());

        if self.llm.backend == Backend::Hosted && !is_set(self.llm.api_key.as_deref()) {
            issues.push(ConfigIssue::error(
                "llm.api_key",
                "The hosted backend needs a credential. Set KATHA_API_KEY or HF_TOKEN.",
            ));
        }

        if self.speech.backend == SpeechBackend::OpenAI && !is_set(self.speech.api_key.as_deref())
        {
            issues.push(ConfigIssue::error(
                "speech.api_key",
                "OpenAI narration needs its own credential. Set OPENAI_API_KEY.",
            ));
        }

        if self.speech.speed.is_some_and(|s| !(0.25..=4.0).contains(&s)) {
            issues.push(ConfigIssue::error(
                "speech.speed",
                "Speaking speed must be between 0.25 and 4.0",
            ));
        }

        if self.llm.max_output_tokens == 0 {
            issues.push(ConfigIssue::error(
                "llm.max_output_tokens",
                "Max output tokens must be at least 1",
            ));
        }

        if self
            .llm
            .fine_tuned_model
            .as_deref()
            .is_some_and(|m| m.trim().is_empty())
        {
            issues.push(ConfigIssue::warning(
                "llm.fine_tuned_model",
                "Fine-tuned model is blank, the model choice will be hidden",
            ));
        }

        if self.llm.timeout_secs == Some(0) || self.speech.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                "timeout_secs",
                "A timeout of 0 makes every request fail immediately",
            ));
        }

        if self.server.session_idle_secs == 0 {
            issues.push(ConfigIssue::warning(
                "server.session_idle_secs",
                "Stories are forgotten as soon as another visitor arrives",
            ));
        }

        if self.server.addr.parse::<SocketAddr>().is_err() {
            issues.push(ConfigIssue::error(
                "server.addr",
                format!("'{}' is not a socket address", self.server.addr),
            ));
        }

        issues
    }

    /// Check if the configuration is valid (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|issue| issue.level != IssueLevel::Error)
    }

    /// Merge process environment variables into the configuration.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Merge variables from `lookup` into the configuration.
    ///
    /// For the chat backend `KATHA_API_KEY` wins over `HF_TOKEN`, then the
    /// `hugging_key` name older `.env` files use, then `OPENAI_API_KEY`. OpenAI narration reads `KATHA_SPEECH_API_KEY`,
    /// then `OPENAI_API_KEY`, and never the Hugging Face token. Any of them
    /// replaces a key from the file.
    #[must_use]
    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var("KATHA_API_KEY")
            .or_else(|| var("HF_TOKEN"))
            .or_else(|| var("hugging_key"))
            .or_else(|| var("OPENAI_API_KEY"))
        {
            self.llm.api_key = Some(key);
        }

        if let Some(key) = var("KATHA_SPEECH_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            self.speech.api_key = Some(key);
        }

        if let Some(backend) = var("KATHA_BACKEND") {
            match backend.parse() {
                Ok(backend) => self.llm.backend = backend,
                Err(e) => tracing::warn!(error = %e, "ignoring KATHA_BACKEND"),
            }
        }

        if let Some(model) = var("KATHA_MODEL") {
            self.llm.model = Some(model);
        }

        if let Some(url) = var("KATHA_BASE_URL") {
            self.llm.base_url = Some(url);
        }

        if let Some(addr) = var("KATHA_ADDR") {
            self.server.addr = addr;
        }

        self
    }
}

/// Configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    /// Issue severity level.
    pub level: IssueLevel,
    /// Configuration path (e.g., "llm.api_key").
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ConfigIssue {
    /// Create an error-level issue.
    #[must_use]
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning-level issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.level {
            IssueLevel::Error => "ERROR",
            IssueLevel::Warning => "WARN",
        };
        write!(f, "[{prefix}] {}: {}", self.path, self.message)
    }
}

/// Severity level for configuration issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// The app cannot start with this setting.
    Error,
    /// Works, but probably not as intended.
    Warning,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod defaults {
        use super::*;

        #[test]
        fn local_first() {
            let config = KathaConfig::default();
            assert_eq!(config.llm.backend, Backend::Local);
            assert_eq!(config.llm.max_output_tokens, 1500);
            assert_eq!(config.speech.backend, SpeechBackend::Google);
            assert_eq!(config.speech.language, "en");
            assert_eq!(config.speech.timeout_secs, 60);
            assert_eq!(config.server.addr, "127.0.0.1:8501");
        }

        #[test]
        fn default_config_is_valid() {
            let config = KathaConfig::default();
            assert!(config.validate().is_empty());
            assert!(config.is_valid());
        }

        #[test]
        fn serialization_round_trip() {
            let config = KathaConfig::default();
            let toml_str = toml::to_string_pretty(&config).unwrap();
            let parsed: KathaConfig = toml::from_str(&toml_str).unwrap();
            assert_eq!(parsed.llm.backend, config.llm.backend);
            assert_eq!(parsed.server.addr, config.server.addr);
        }
    }

    mod parsing {
        use super::*;

        #[test]
        fn sample_config() {
            let toml_str = r#"
[llm]
backend = "huggingface"
model = "meta-llama/Meta-Llama-3-8B-Instruct"
fine_tuned_model = "me/indian-tales"
api_key = "hf_xxx"

[speech]
backend = "none"

[server]
addr = "0.0.0.0:8080"
"#;
            let config: KathaConfig = toml::from_str(toml_str).unwrap();
            assert_eq!(config.llm.backend, Backend::Hosted);
            assert_eq!(config.llm.fine_tuned_model.as_deref(), Some("me/indian-tales"));
            assert_eq!(config.speech.backend, SpeechBackend::Disabled);
            assert_eq!(config.server.addr, "0.0.0.0:8080");
            assert!(config.is_valid());
        }

        #[test]
        fn unknown_section_is_rejected() {
            assert!(toml::from_str::<KathaConfig>("[channels]\nenabled = true").is_err());
        }

        #[test]
        fn backend_from_str() {
            assert_eq!("Ollama".parse::<Backend>().unwrap(), Backend::Local);
            assert_eq!("openai".parse::<Backend>().unwrap(), Backend::Hosted);
            assert!("gemini".parse::<Backend>().is_err());
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn hosted_without_key_is_error() {
            let mut config = KathaConfig::default();
            config.llm.backend = Backend::Hosted;
            let issues = config.validate();
            assert!(!config.is_valid());
            assert!(issues.iter().any(|i| i.path == "llm.api_key"));
        }

        #[test]
        fn openai_speech_without_key_is_error() {
            let mut config = KathaConfig::default();
            config.speech.backend = SpeechBackend::OpenAI;
            assert!(!config.is_valid());
        }

        #[test]
        fn openai_speech_ignores_chat_key() {
            let mut config = KathaConfig::default();
            config.llm.backend = Backend::Hosted;
            config.llm.api_key = Some("hf_x".to_owned());
            config.speech.backend = SpeechBackend::OpenAI;
            let issues = config.validate();
            assert!(issues.iter().any(|i| i.path == "speech.api_key"));

            config.speech.api_key = Some("sk_y".to_owned());
            assert!(config.is_valid());
        }

        #[test]
        fn speed_out_of_range_is_error() {
            let mut config = KathaConfig::default();
            config.speech.speed = Some(0.8);
            assert!(config.is_valid());
            config.speech.speed = Some(5.0);
            assert!(!config.is_valid());
        }

        #[test]
        fn bad_addr_is_error() {
            let mut config = KathaConfig::default();
            config.server.addr = "localhost".to_owned();
            let issues = config.validate();
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].level, IssueLevel::Error);
        }

        #[test]
        fn blank_fine_tuned_model_is_warning() {
            let mut config = KathaConfig::default();
            config.llm.fine_tuned_model = Some(" ".to_owned());
            let issues = config.validate();
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].level, IssueLevel::Warning);
            assert!(config.is_valid());
        }
    }

    mod environment {
        use super::*;

        #[test]
        fn katha_key_wins() {
            let config = KathaConfig::default().with_env_from(env(&[
                ("KATHA_API_KEY", "k1"),
                ("HF_TOKEN", "k2"),
                ("OPENAI_API_KEY", "k3"),
            ]));
            assert_eq!(config.llm.api_key.as_deref(), Some("k1"));
        }

        #[test]
        fn hf_token_before_openai_key() {
            let config = KathaConfig::default()
                .with_env_from(env(&[("HF_TOKEN", "k2"), ("OPENAI_API_KEY", "k3")]));
            assert_eq!(config.llm.api_key.as_deref(), Some("k2"));
        }

        #[test]
        fn speech_key_never_takes_hf_token() {
            let config = KathaConfig::default()
                .with_env_from(env(&[("HF_TOKEN", "hf_x"), ("OPENAI_API_KEY", "sk_y")]));
            assert_eq!(config.llm.api_key.as_deref(), Some("hf_x"));
            assert_eq!(config.speech.api_key.as_deref(), Some("sk_y"));

            let config = KathaConfig::default().with_env_from(env(&[("HF_TOKEN", "hf_x")]));
            assert!(config.speech.api_key.is_none());
        }

        #[test]
        fn legacy_hugging_key_is_read() {
            let config = KathaConfig::default().with_env_from(env(&[("hugging_key", "hf_old")]));
            assert_eq!(config.llm.api_key.as_deref(), Some("hf_old"));
        }

        #[test]
        fn dedicated_speech_key_wins() {
            let config = KathaConfig::default().with_env_from(env(&[
                ("KATHA_SPEECH_API_KEY", "sk_speech"),
                ("OPENAI_API_KEY", "sk_y"),
            ]));
            assert_eq!(config.speech.api_key.as_deref(), Some("sk_speech"));
        }

        #[test]
        fn overrides_backend_model_url_and_addr() {
            let config = KathaConfig::default().with_env_from(env(&[
                ("KATHA_BACKEND", "hosted"),
                ("KATHA_MODEL", "mistralai/Mistral-7B-Instruct-v0.3"),
                ("KATHA_BASE_URL", "http://localhost:8000/v1"),
                ("KATHA_ADDR", "0.0.0.0:9000"),
            ]));
            assert_eq!(config.llm.backend, Backend::Hosted);
            assert_eq!(
                config.llm.model.as_deref(),
                Some("mistralai/Mistral-7B-Instruct-v0.3")
            );
            assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:8000/v1"));
            assert_eq!(config.server.addr, "0.0.0.0:9000");
        }

        #[test]
        fn bad_backend_is_ignored() {
            let config = KathaConfig::default().with_env_from(env(&[("KATHA_BACKEND", "gpt")]));
            assert_eq!(config.llm.backend, Backend::Local);
        }

        #[test]
        fn blank_values_are_ignored() {
            let config = KathaConfig::default().with_env_from(env(&[("KATHA_API_KEY", "  ")]));
            assert!(config.llm.api_key.is_none());
        }
    }

    #[test]
    fn debug_redacts_key() {
        let mut config = KathaConfig::default();
        config.llm.api_key = Some("hf_secret".to_owned());
        config.speech.api_key = Some("sk_secret".to_owned());
        let debug = format!("{config:?}");
        assert!(!debug.contains("hf_secret"));
        assert!(!debug.contains("sk_secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
