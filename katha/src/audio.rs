//! Text-to-speech types and provider trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use katha::prelude::*;
//!
//! let request = SpeechRequest::new("tts-1", "Once upon a time...", "fable")
//!     .format(AudioFormat::Mp3);
//! let response = provider.speech(&request).await?;
//! response.save("story.mp3")?;
//! ```

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Audio container produced by a speech backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MP3 format. The only format Google Translate returns.
    #[default]
    Mp3,
    /// WAV format.
    Wav,
    /// Opus format.
    Opus,
    /// AAC format.
    Aac,
    /// FLAC format.
    Flac,
    /// Raw PCM.
    Pcm,
}

impl AudioFormat {
    /// Get the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Pcm => "pcm",
        }
    }

    /// Get the MIME type for this format.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Opus => "audio/opus",
            Self::Aac => "audio/aac",
            Self::Flac => "audio/flac",
            Self::Pcm => "audio/pcm",
        }
    }

    /// Get the format string for API requests.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.extension()
    }

}

/// A voice offered by a speech backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Voice identifier (e.g., "fable", "nova").
    pub id: String,
}

impl Voice {
    /// Create a new voice with the given ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl<S: Into<String>> From<S> for Voice {
    fn from(s: S) -> Self {
        Self::new(s)
    }
}

/// Request for generating speech from text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Backend model (e.g., "tts-1"). Ignored by backends without models.
    pub model: String,
    /// Text to speak.
    pub input: String,
    /// Voice to use. Ignored by backends without voices.
    pub voice: Voice,
    /// Output audio format.
    pub response_format: AudioFormat,
    /// Speaking speed (0.25 to 4.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    /// Language code (e.g., "en", "hi").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl SpeechRequest {
    /// Create a new speech request.
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        input: impl Into<String>,
        voice: impl Into<Voice>,
    ) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            voice: voice.into(),
            response_format: AudioFormat::Mp3,
            speed: None,
            language: None,
        }
    }

    /// Set the output format.
    #[must_use]
    pub const fn format(mut self, format: AudioFormat) -> Self {
        self.response_format = format;
        self
    }

    /// Set the speaking speed.
    #[must_use]
    pub const fn speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Set the spoken language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Response from a speech synthesis request.
#[derive(Debug, Clone)]
pub struct SpeechResponse {
    /// The generated audio data.
    pub audio: Vec<u8>,
    /// The format of the audio data.
    pub format: AudioFormat,
}

impl SpeechResponse {
    /// Create a new speech response.
    #[must_use]
    pub const fn new(audio: Vec<u8>, format: AudioFormat) -> Self {
        Self { audio, format }
    }

    /// Save the audio to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        std::fs::write(path, &self.audio)
    }

    /// Encode the audio as a `data:` URL suitable for an `<audio>` element.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.audio);
        format!("data:{};base64,{encoded}", self.format.mime_type())
    }
}

/// Trait for backends that turn text into audio.
#[async_trait]
pub trait TextToSpeechProvider: Send + Sync {
    /// Generate speech from text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Llm`](crate::Error::Llm) on network or backend failure.
    async fn speech(&self, request: &SpeechRequest) -> Result<SpeechResponse>;

    /// Name of this backend, for logs and errors.
    fn provider_name(&self) -> &'static str;
}

/// Type alias for an Arc-wrapped TextToSpeechProvider.
pub type SharedSpeechProvider = std::sync::Arc<dyn TextToSpeechProvider>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    mod audio_format {
        use super::*;

        #[test]
        fn default_is_mp3() {
            assert_eq!(AudioFormat::default(), AudioFormat::Mp3);
        }

        #[test]
        fn mime_types() {
            assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
            assert_eq!(AudioFormat::Wav.mime_type(), "audio/wav");
        }

        #[test]
        fn api_names_match_serde() {
            for format in [AudioFormat::Mp3, AudioFormat::Wav, AudioFormat::Opus, AudioFormat::Flac] {
                let json = serde_json::to_value(format).unwrap();
                assert_eq!(json, format.as_str());
            }
        }
    }

    mod speech_request {
        use super::*;

        #[test]
        fn new_sets_defaults() {
            let req = SpeechRequest::new("tts-1", "Hello", "fable");
            assert_eq!(req.model, "tts-1");
            assert_eq!(req.voice.id, "fable");
            assert_eq!(req.response_format, AudioFormat::Mp3);
            assert!(req.speed.is_none());
            assert!(req.language.is_none());
        }

        #[test]
        fn builder_chain() {
            let req = SpeechRequest::new("", "Namaste", "")
                .language("hi")
                .speed(0.9)
                .format(AudioFormat::Wav);
            assert_eq!(req.language.as_deref(), Some("hi"));
            assert_eq!(req.speed, Some(0.9));
            assert_eq!(req.response_format, AudioFormat::Wav);
        }
    }

    mod speech_response {
        use super::*;

        #[test]
        fn data_url_has_mime_and_base64() {
            let resp = SpeechResponse::new(b"abc".to_vec(), AudioFormat::Mp3);
            assert_eq!(resp.to_data_url(), "data:audio/mpeg;base64,YWJj");
        }

        #[test]
        fn save_writes_file() {
            let audio = b"fake audio data".to_vec();
            let resp = SpeechResponse::new(audio.clone(), AudioFormat::Mp3);
            let path = std::env::temp_dir().join("katha_audio_save_test.mp3");

            resp.save(&path).unwrap();
            assert_eq!(std::fs::read(&path).unwrap(), audio);
            std::fs::remove_file(path).ok();
        }
    }
}
