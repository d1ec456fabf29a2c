//! Reads stories aloud through a speech backend.

use std::fmt;

use crate::audio::{SharedSpeechProvider, SpeechRequest, SpeechResponse, Voice};
use crate::error::{Error, LlmError, Result};

/// Turns story text into audio held in memory.
#[derive(Clone)]
pub struct Narrator {
    provider: SharedSpeechProvider,
    model: String,
    voice: Voice,
    language: Option<String>,
    speed: Option<f32>,
}

impl Narrator {
    /// Create a narrator with backend defaults for model, voice and language.
    #[must_use]
    pub fn new(provider: SharedSpeechProvider) -> Self {
        Self {
            provider,
            model: String::new(),
            voice: Voice::new(""),
            language: None,
            speed: None,
        }
    }

    /// Sets the speech model (backends without models ignore it).
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the voice (backends without voices ignore it).
    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<Voice>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Sets the spoken language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the speaking speed. Google only honours a slow/normal switch.
    #[must_use]
    pub const fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Name of the underlying speech backend.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Build the request `narrate` sends for `text`.
    #[must_use]
    pub fn request_for(&self, text: &str) -> SpeechRequest {
        let mut request = SpeechRequest::new(self.model.clone(), text, self.voice.clone());
        request.language.clone_from(&self.language);
        request.speed = self.speed;
        request
    }

    /// Synthesize `text`.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for blank text
    /// - [`Error::Synthesis`] when the backend fails or returns no audio
    pub async fn narrate(&self, text: &str) -> Result<SpeechResponse> {
        if text.trim().is_empty() {
            return Err(Error::validation("text", "a story to read aloud"));
        }

        let provider = self.provider_name();
        tracing::info!(provider, chars = text.len(), "generating audio");

        let response = self
            .provider
            .speech(&self.request_for(text))
            .await
            .map_err(|e| match e {
                Error::Llm(inner) => Error::synthesis(inner.with_provider(provider)),
                other => Error::synthesis(LlmError::internal(other.to_string()).with_provider(provider)),
            })?;

        if response.audio.is_empty() {
            return Err(Error::synthesis(
                LlmError::response_format("audio", "an empty clip").with_provider(provider),
            ));
        }

        tracing::debug!(provider, bytes = response.audio.len(), "audio ready");
        Ok(response)
    }
}

impl fmt::Debug for Narrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Narrator")
            .field("provider", &self.provider_name())
            .field("model", &self.model)
            .field("voice", &self.voice.id)
            .field("language", &self.language)
            .field("speed", &self.speed)
            .finish_non_exhaustive()
    }
}
