//! Google Translate `batchexecute` TTS client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use regex::Regex;
use reqwest::Client;

use crate::audio::{AudioFormat, SpeechRequest, SpeechResponse, TextToSpeechProvider};
use crate::error::{LlmError, Result};
use crate::llms::chunk_text;

use super::config::GoogleTtsConfig;

/// RPC id of the Translate "listen" call.
const TTS_RPC: &str = "jQ1olc";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Google Translate speech client.
#[derive(Debug, Clone)]
pub struct GoogleTts {
    config: Arc<GoogleTtsConfig>,
    client: Client,
    audio_pattern: Regex,
}

impl GoogleTts {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built.
    pub fn new(config: GoogleTtsConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::internal(format!("Failed to create HTTP client: {e}")))?;

        let audio_pattern = Regex::new(r#"jQ1olc","\[\\"(.*)\\"]"#)
            .map_err(|e| LlmError::internal(format!("Invalid audio pattern: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
            audio_pattern,
        })
    }

    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// See [`GoogleTts::new`].
    pub fn with_defaults() -> Result<Self> {
        Self::new(GoogleTtsConfig::default())
    }

    /// Default spoken language.
    #[must_use]
    pub fn lang(&self) -> &str {
        &self.config.lang
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/_/TranslateWebserverUi/data/batchexecute",
            self.config.base_url
        )
    }

    /// Build the form-encoded `f.req` body for one chunk.
    pub(crate) fn package_rpc(text: &str, lang: &str, slow: bool) -> String {
        let parameter = serde_json::json!([text, lang, slow.then_some(true), "null"]).to_string();
        let rpc = serde_json::json!([[[TTS_RPC, parameter, null, "generic"]]]).to_string();
        let encoded: String = url::form_urlencoded::byte_serialize(rpc.as_bytes()).collect();
        format!("f.req={encoded}&")
    }

    /// Pull the base64 audio payload out of a `batchexecute` response.
    pub(crate) fn extract_audio(&self, body: &str) -> std::result::Result<Vec<u8>, LlmError> {
        let mut audio = Vec::new();

        for line in body.lines().filter(|l| l.contains(TTS_RPC)) {
            let captures = self.audio_pattern.captures(line).ok_or_else(|| {
                LlmError::provider("google", "Translate answered without audio for this text")
            })?;
            let payload = captures.get(1).map_or("", |m| m.as_str());
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|e| {
                    LlmError::response_format("base64 audio", e.to_string()).with_provider("google")
                })?;
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(LlmError::response_format("audio payload", "no audio in response")
                .with_provider("google"));
        }
        Ok(audio)
    }

    async fn synthesize_chunk(&self, chunk: &str, lang: &str, slow: bool) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.endpoint())
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded;charset=utf-8",
            )
            .header("User-Agent", USER_AGENT)
            .header("Referer", format!("{}/", self.config.base_url))
            .body(Self::package_rpc(chunk, lang, slow))
            .send()
            .await
            .map_err(|e| LlmError::from(e).with_provider("google"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = if status.as_u16() == 429 {
                LlmError::rate_limited("google")
            } else {
                LlmError::http_status(status.as_u16(), body).with_provider("google")
            };
            return Err(err.into());
        }

        let body = response.text().await.map_err(LlmError::from)?;
        Ok(self.extract_audio(&body)?)
    }
}

#[async_trait]
impl TextToSpeechProvider for GoogleTts {
    async fn speech(&self, request: &SpeechRequest) -> Result<SpeechResponse> {
        let lang = request.language.as_deref().unwrap_or(&self.config.lang);
        let slow = request.speed.is_some_and(|s| s < 1.0);
        let chunks = chunk_text(&request.input, self.config.max_chunk_chars);
        if chunks.is_empty() {
            return Err(LlmError::invalid_request("google", "No text to speak").into());
        }

        tracing::debug!(lang, chunks = chunks.len(), "synthesizing speech");

        let mut audio = Vec::new();
        for chunk in &chunks {
            audio.extend(self.synthesize_chunk(chunk, lang, slow).await?);
        }

        Ok(SpeechResponse::new(audio, AudioFormat::Mp3))
    }

    fn provider_name(&self) -> &'static str {
        "google"
    }
}
