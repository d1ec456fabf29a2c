//! Builds the configured chat and speech backends.

use std::fmt;
use std::sync::Arc;

use katha::prelude::*;

use crate::config::{Backend, KathaConfig, SpeechBackend};
use crate::error::{AppError, Result};

const HOSTED_TIMEOUT_SECS: u64 = 120;
const LOCAL_TIMEOUT_SECS: u64 = 300;

/// Everything a story session needs, built once at startup and shared.
#[derive(Clone)]
pub struct Backends {
    /// Writes and revises stories.
    pub chat: SharedChatProvider,
    /// Reads stories aloud, if narration is enabled.
    pub narrator: Option<Narrator>,
    /// Model offered as "Fine-Tuned Model".
    pub fine_tuned_model: Option<String>,
    /// Token limit for every story request.
    pub max_output_tokens: u32,
}

impl Backends {
    /// Create backends from already-built providers.
    #[must_use]
    pub fn new(chat: SharedChatProvider) -> Self {
        Self {
            chat,
            narrator: None,
            fine_tuned_model: None,
            max_output_tokens: StorySession::DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    /// Enable narration.
    #[must_use]
    pub fn with_narrator(mut self, narrator: Narrator) -> Self {
        self.narrator = Some(narrator);
        self
    }

    /// Offer a fine-tuned model next to the base model.
    #[must_use]
    pub fn with_fine_tuned_model(mut self, model: impl Into<String>) -> Self {
        self.fine_tuned_model = Some(model.into()).filter(|m| !m.trim().is_empty());
        self
    }

    /// Sets the token limit.
    #[must_use]
    pub const fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Build every backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when the hosted backend (or OpenAI
    /// narration) has no credential, or an HTTP client cannot be created.
    pub fn from_config(config: &KathaConfig) -> Result<Self> {
        let mut backends = Self::new(build_chat(config)?)
            .with_max_output_tokens(config.llm.max_output_tokens);

        if let Some(model) = &config.llm.fine_tuned_model {
            backends = backends.with_fine_tuned_model(model.clone());
        }
        if let Some(narrator) = build_narrator(config)? {
            backends = backends.with_narrator(narrator);
        }

        tracing::info!(
            provider = backends.chat.provider_name(),
            model = backends.chat.default_model(),
            narration = backends.narrator.as_ref().map_or("off", Narrator::provider_name),
            "backends ready"
        );
        Ok(backends)
    }

    /// The model used when the user picks "Base Model".
    #[must_use]
    pub fn base_model(&self) -> &str {
        self.chat.default_model()
    }

    /// Whether the form should offer a model choice.
    #[must_use]
    pub const fn offers_model_choice(&self) -> bool {
        self.fine_tuned_model.is_some()
    }

    /// A fresh, empty story session.
    #[must_use]
    pub fn session(&self) -> StorySession {
        StorySession::new(Arc::clone(&self.chat)).with_max_output_tokens(self.max_output_tokens)
    }

    /// Resolve a form's model choice to a model identifier.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the fine-tuned model is chosen but none
    /// is configured.
    pub fn resolve_model(&self, choice: ModelChoice) -> katha::Result<&str> {
        choice.resolve(self.base_model(), self.fine_tuned_model.as_deref())
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends")
            .field("chat", &self.chat.provider_name())
            .field("model", &self.base_model())
            .field("narrator", &self.narrator)
            .field("fine_tuned_model", &self.fine_tuned_model)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

fn credential(key: Option<&str>) -> Option<&str> {
    key.filter(|k| !k.trim().is_empty())
}

fn build_chat(config: &KathaConfig) -> Result<SharedChatProvider> {
    let llm = &config.llm;

    match llm.backend {
        Backend::Hosted => {
            let key = credential(llm.api_key.as_deref()).ok_or_else(|| {
                AppError::config(
                    "no API key for the hosted backend; set KATHA_API_KEY or HF_TOKEN, \
                     or llm.api_key in the config file",
                )
            })?;

            let mut openai = OpenAIConfig::new(key)
                .with_timeout(llm.timeout_secs.unwrap_or(HOSTED_TIMEOUT_SECS));
            if let Some(url) = &llm.base_url {
                openai = openai.with_base_url(url.as_str());
            }
            if let Some(model) = &llm.model {
                openai = openai.with_model(model.as_str());
            }
            Ok(Arc::new(OpenAI::new(openai)?))
        }
        Backend::Local => {
            let mut ollama =
                OllamaConfig::new().timeout(llm.timeout_secs.unwrap_or(LOCAL_TIMEOUT_SECS));
            if let Some(url) = &llm.base_url {
                ollama = ollama.base_url(url.as_str());
            }
            if let Some(model) = &llm.model {
                ollama = ollama.model(model.as_str());
            }
            Ok(Arc::new(Ollama::new(ollama)?))
        }
    }
}

fn build_narrator(config: &KathaConfig) -> Result<Option<Narrator>> {
    let speech = &config.speech;

    let narrator = match speech.backend {
        SpeechBackend::Disabled => return Ok(None),
        SpeechBackend::Google => {
            let mut google = GoogleTtsConfig::new()
                .lang(speech.language.as_str())
                .timeout(speech.timeout_secs);
            if let Some(tld) = &speech.tld {
                google = google.tld(tld);
            }
            if let Some(url) = &speech.base_url {
                google = google.base_url(url.as_str());
            }
            Narrator::new(Arc::new(GoogleTts::new(google)?))
        }
        SpeechBackend::OpenAI => {
            let key = credential(speech.api_key.as_deref()).ok_or_else(|| {
                AppError::config("OpenAI narration needs speech.api_key or OPENAI_API_KEY")
            })?;
            let openai = OpenAIConfig::new(key)
                .with_base_url(
                    speech
                        .base_url
                        .as_deref()
                        .unwrap_or(OpenAIConfig::OPENAI_BASE_URL),
                )
                .with_timeout(speech.timeout_secs);

            Narrator::new(Arc::new(OpenAI::new(openai)?))
                .with_model(speech.model.as_deref().unwrap_or(OpenAI::DEFAULT_SPEECH_MODEL))
                .with_voice(speech.voice.as_deref().unwrap_or(OpenAI::DEFAULT_VOICE))
        }
    };

    let narrator = narrator.with_language(speech.language.as_str());
    Ok(Some(match speech.speed {
        Some(speed) => narrator.with_speed(speed),
        None => narrator,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn hosted() -> KathaConfig {
        let mut config = KathaConfig::default();
        config.llm.backend = Backend::Hosted;
        config
    }

    mod chat {
        use super::*;

        #[test]
        fn hosted_without_key_fails_at_startup() {
            let err = Backends::from_config(&hosted()).unwrap_err();
            assert!(matches!(err, AppError::Config(_)));
            assert!(err.to_string().contains("KATHA_API_KEY"));
        }

        #[test]
        fn hosted_with_key_uses_openai_client() {
            let mut config = hosted();
            config.llm.api_key = Some("hf_test".to_owned());
            let backends = Backends::from_config(&config).unwrap();
            assert_eq!(backends.chat.provider_name(), "openai");
            assert_eq!(backends.base_model(), OpenAIConfig::DEFAULT_MODEL);
        }

        #[test]
        fn local_needs_no_key() {
            let mut config = KathaConfig::default();
            config.llm.model = Some("mistral".to_owned());
            let backends = Backends::from_config(&config).unwrap();
            assert_eq!(backends.chat.provider_name(), "ollama");
            assert_eq!(backends.base_model(), "mistral");
        }
    }

    mod speech {
        use super::*;

        #[test]
        fn google_by_default() {
            let backends = Backends::from_config(&KathaConfig::default()).unwrap();
            let narrator = backends.narrator.unwrap();
            assert_eq!(narrator.provider_name(), "google");
            assert_eq!(narrator.request_for("hi").language.as_deref(), Some("en"));
        }

        #[test]
        fn disabled_has_no_narrator() {
            let mut config = KathaConfig::default();
            config.speech.backend = SpeechBackend::Disabled;
            assert!(Backends::from_config(&config).unwrap().narrator.is_none());
        }

        #[test]
        fn openai_narration_uses_fable() {
            let mut config = KathaConfig::default();
            config.speech.api_key = Some("sk-test".to_owned());
            config.speech.backend = SpeechBackend::OpenAI;
            let narrator = Backends::from_config(&config).unwrap().narrator.unwrap();
            let request = narrator.request_for("hi");
            assert_eq!(request.voice.id, "fable");
            assert_eq!(request.model, "tts-1");
        }

        #[test]
        fn openai_narration_never_borrows_chat_key() {
            let mut config = hosted();
            config.llm.api_key = Some("hf_x".to_owned());
            config.speech.backend = SpeechBackend::OpenAI;
            let err = Backends::from_config(&config).unwrap_err();
            assert!(err.to_string().contains("OPENAI_API_KEY"));
        }

        #[test]
        fn speed_reaches_requests() {
            let mut config = KathaConfig::default();
            config.speech.speed = Some(0.8);
            let narrator = Backends::from_config(&config).unwrap().narrator.unwrap();
            assert_eq!(narrator.request_for("hi").speed, Some(0.8));
        }
    }

    mod models {
        use super::*;

        #[test]
        fn fine_tuned_choice() {
            let mut config = KathaConfig::default();
            config.llm.fine_tuned_model = Some("me/indian-tales".to_owned());
            let backends = Backends::from_config(&config).unwrap();

            assert!(backends.offers_model_choice());
            assert_eq!(
                backends.resolve_model(ModelChoice::FineTuned).unwrap(),
                "me/indian-tales"
            );
            assert_eq!(backends.resolve_model(ModelChoice::Base).unwrap(), "llama3");
        }

        #[test]
        fn blank_fine_tuned_model_is_not_offered() {
            let mut config = KathaConfig::default();
            config.llm.fine_tuned_model = Some("  ".to_owned());
            let backends = Backends::from_config(&config).unwrap();
            assert!(!backends.offers_model_choice());
            assert!(backends.resolve_model(ModelChoice::FineTuned).is_err());
        }

        #[test]
        fn sessions_carry_token_limit() {
            let mut config = KathaConfig::default();
            config.llm.max_output_tokens = 800;
            let session = Backends::from_config(&config).unwrap().session();
            assert_eq!(session.max_output_tokens(), 800);
            assert!(!session.has_story());
        }
    }
}
