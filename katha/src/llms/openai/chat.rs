//! OpenAI ChatProvider implementation.

use async_trait::async_trait;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse, StopReason};
use crate::error::{LlmError, Result};
use crate::message::Message;

use super::client::OpenAI;
use super::types::OpenAIChatResponse;

impl OpenAI {
    /// Parse the response into ChatResponse.
    pub(crate) fn parse_response(response: OpenAIChatResponse) -> Result<ChatResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::response_format("at least one choice", "empty choices"))?;

        let stop_reason = choice
            .finish_reason
            .as_deref()
            .map_or(StopReason::Stop, StopReason::parse);

        let message = Message::assistant(choice.message.content.unwrap_or_default());

        Ok(ChatResponse {
            message,
            stop_reason,
            usage: response.usage,
            model: response.model,
            id: response.id,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAI {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.chat_url();
        let body = self.build_body(request);

        tracing::debug!(model = %body.model, messages = body.messages.len(), "sending chat request");

        let response = self.build_request(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "chat request failed");
            return Err(Self::parse_error(status.as_u16(), &error_text).into());
        }

        let response_text = response.text().await?;
        let parsed: OpenAIChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::debug!(body = %response_text, "unparseable chat response");
            LlmError::response_format("valid OpenAI response", format!("parse error: {e}"))
                .with_provider("openai")
        })?;

        let response = Self::parse_response(parsed)?;
        if let Some(usage) = response.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "chat request completed"
            );
        }
        Ok(response)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> &str {
        self.model()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parse_response_extracts_first_choice() {
        let json = r#"{
            "id": "chatcmpl-1",
            "model": "meta-llama/Meta-Llama-3-8B-Instruct",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Once..."}, "finish_reason": "length"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 1500, "total_tokens": 1510}
        }"#;
        let parsed: OpenAIChatResponse = serde_json::from_str(json).unwrap();
        let resp = OpenAI::parse_response(parsed).unwrap();

        assert_eq!(resp.text(), "Once...");
        assert!(resp.is_truncated());
        assert_eq!(resp.id.as_deref(), Some("chatcmpl-1"));
        assert_eq!(resp.usage.unwrap().output_tokens, 1500);
    }

    #[test]
    fn parse_response_rejects_empty_choices() {
        let parsed: OpenAIChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(OpenAI::parse_response(parsed).is_err());
    }

    #[test]
    fn null_content_becomes_empty_text() {
        let parsed: OpenAIChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        let resp = OpenAI::parse_response(parsed).unwrap();
        assert_eq!(resp.text(), "");
    }
}
