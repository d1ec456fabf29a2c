//! OpenAI Audio API implementation (TTS).

use async_trait::async_trait;

use crate::audio::{SpeechRequest, SpeechResponse, TextToSpeechProvider};
use crate::error::{LlmError, Result};
use crate::llms::chunk_text;

use super::client::OpenAI;
use super::types::OpenAISpeechRequest;

impl OpenAI {
    /// Default speech model.
    pub const DEFAULT_SPEECH_MODEL: &'static str = "tts-1";
    /// Default narration voice.
    pub const DEFAULT_VOICE: &'static str = "fable";
    /// Longest `input` the speech endpoint accepts.
    pub const MAX_SPEECH_CHARS: usize = 4096;

    fn speech_body(request: &SpeechRequest, input: &str) -> OpenAISpeechRequest {
        let model = if request.model.is_empty() {
            Self::DEFAULT_SPEECH_MODEL
        } else {
            request.model.as_str()
        };
        let voice = if request.voice.id.is_empty() {
            Self::DEFAULT_VOICE
        } else {
            request.voice.id.as_str()
        };

        OpenAISpeechRequest {
            model: model.to_owned(),
            input: input.to_owned(),
            voice: voice.to_owned(),
            response_format: request.response_format.as_str().to_owned(),
            speed: request.speed,
        }
    }

    async fn synthesize_chunk(&self, request: &SpeechRequest, input: &str) -> Result<Vec<u8>> {
        let body = Self::speech_body(request, input);

        let response = self
            .build_request(&self.speech_url())
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &error_text).into());
        }

        let audio = response.bytes().await.map_err(LlmError::from)?.to_vec();
        if audio.is_empty() {
            return Err(LlmError::response_format("audio bytes", "empty body")
                .with_provider("openai")
                .into());
        }
        Ok(audio)
    }
}

#[async_trait]
impl TextToSpeechProvider for OpenAI {
    async fn speech(&self, request: &SpeechRequest) -> Result<SpeechResponse> {
        let chunks = chunk_text(&request.input, Self::MAX_SPEECH_CHARS);
        if chunks.is_empty() {
            return Err(LlmError::invalid_request("openai", "No text to speak").into());
        }

        tracing::debug!(model = %request.model, voice = %request.voice.id, chunks = chunks.len(), "sending speech request");

        let mut audio = Vec::new();
        for chunk in &chunks {
            audio.extend(self.synthesize_chunk(request, chunk).await?);
        }

        Ok(SpeechResponse::new(audio, request.response_format))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
