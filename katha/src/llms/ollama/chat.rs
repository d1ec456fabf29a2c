//! Ollama ChatProvider implementation.

use async_trait::async_trait;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse, StopReason};
use crate::error::{LlmError, Result};
use crate::message::Message;
use crate::usage::Usage;

use super::client::Ollama;
use super::types::OllamaChatResponse;

impl Ollama {
    /// Parse the response into ChatResponse.
    pub(crate) fn parse_response(response: OllamaChatResponse) -> ChatResponse {
        let stop_reason = response
            .done_reason
            .as_deref()
            .map_or(StopReason::Stop, StopReason::parse);

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (Some(input), Some(output)) => Some(Usage::new(input, output)),
            _ => None,
        };

        ChatResponse {
            message: Message::assistant(response.message.content),
            stop_reason,
            usage,
            model: response.model,
            id: None,
        }
    }
}

#[async_trait]
impl ChatProvider for Ollama {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.chat_url();
        let body = self.build_body(request);

        tracing::debug!(model = %body.model, url = %url, "sending chat request");

        let response = self.client().post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "chat request failed");
            return Err(Self::parse_error(status.as_u16(), &error_text).into());
        }

        let response_text = response.text().await?;
        let parsed: OllamaChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::debug!(body = %response_text, "unparseable chat response");
            LlmError::response_format("valid Ollama response", format!("parse error: {e}"))
                .with_provider("ollama")
        })?;

        Ok(Self::parse_response(parsed))
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        self.model()
    }
}
