//! OpenAI-compatible API client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::chat::ChatRequest;
use crate::error::{LlmError, Result, excerpt};
use crate::message::Message;

use super::config::OpenAIConfig;
use super::types::{OpenAIChatRequest, OpenAIErrorBody, OpenAIErrorResponse, OpenAIMessage};

/// OpenAI-compatible API client.
#[derive(Debug, Clone)]
pub struct OpenAI {
    pub(crate) config: Arc<OpenAIConfig>,
    pub(crate) client: Client,
}

impl OpenAI {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an auth error for an empty API key, or an internal error if the
    /// HTTP client cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::auth("openai", "API key is required").into());
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let client = builder
            .build()
            .map_err(|e| LlmError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the default model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub(crate) fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    pub(crate) fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.config.base_url)
    }

    /// Build an authenticated JSON POST.
    pub(crate) fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
    }

    pub(crate) fn convert_message(msg: &Message) -> OpenAIMessage {
        OpenAIMessage {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }

    /// Build the request body. An empty model falls back to the configured one.
    pub(crate) fn build_body(&self, request: &ChatRequest) -> OpenAIChatRequest {
        let model = if request.model.is_empty() {
            self.config.model.clone()
        } else {
            request.model.clone()
        };

        OpenAIChatRequest {
            model,
            messages: request.messages.iter().map(Self::convert_message).collect(),
            max_tokens: request.max_tokens,
            stream: false,
        }
    }

    /// Parse an error response.
    pub(crate) fn parse_error(status: u16, body: &str) -> LlmError {
        let parsed = serde_json::from_str::<OpenAIErrorResponse>(body).ok();

        let (message, code) = match parsed.map(|r| r.error) {
            Some(OpenAIErrorBody::Detailed {
                message,
                error_type,
                code,
            }) => {
                let code = code
                    .map(|c| match c {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .or(error_type);
                (message, code)
            }
            Some(OpenAIErrorBody::Plain(message)) => (message, None),
            None => return Self::status_error(status, body),
        };

        match status {
            401 | 403 => LlmError::auth("openai", message),
            429 => LlmError::rate_limited("openai"),
            _ => match code {
                Some(code) => LlmError::provider_code("openai", code, message),
                None => LlmError::provider("openai", message),
            },
        }
    }

    fn status_error(status: u16, body: &str) -> LlmError {
        match status {
            401 | 403 => LlmError::auth("openai", format!("HTTP {status}: {}", excerpt(body))),
            429 => LlmError::rate_limited("openai"),
            _ => LlmError::http_status(status, body.to_owned()).with_provider("openai"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::LlmErrorKind;

    fn client() -> OpenAI {
        OpenAI::new(OpenAIConfig::new("hf_test")).unwrap()
    }

    mod construction {
        use super::*;

        #[test]
        fn empty_key_is_rejected() {
            let err = OpenAI::new(OpenAIConfig::new("  ")).unwrap_err();
            assert!(err.to_string().contains("API key"));
        }

        #[test]
        fn urls_use_base() {
            let c = OpenAI::new(OpenAIConfig::new("k").with_base_url("http://x/v1")).unwrap();
            assert_eq!(c.chat_url(), "http://x/v1/chat/completions");
            assert_eq!(c.speech_url(), "http://x/v1/audio/speech");
        }
    }

    mod body {
        use super::*;

        #[test]
        fn empty_model_uses_default() {
            let body = client().build_body(&ChatRequest::default().user("hi"));
            assert_eq!(body.model, OpenAIConfig::DEFAULT_MODEL);
            assert_eq!(body.messages[0].role, "user");
            assert_eq!(body.messages[0].content, "hi");
        }

        #[test]
        fn explicit_model_and_limit_pass_through() {
            let req = ChatRequest::new("my-fine-tune").max_tokens(1500);
            let body = client().build_body(&req);
            assert_eq!(body.model, "my-fine-tune");
            assert_eq!(body.max_tokens, Some(1500));
            assert!(!body.stream);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn unauthorized_maps_to_auth() {
            let err = OpenAI::parse_error(401, r#"{"error": {"message": "Invalid token"}}"#);
            assert_eq!(err.kind, LlmErrorKind::Auth);
            assert!(err.message.contains("Invalid token"));
        }

        #[test]
        fn rate_limit_maps_to_rate_limited() {
            let err = OpenAI::parse_error(429, "slow down");
            assert_eq!(err.kind, LlmErrorKind::RateLimited);
        }

        #[test]
        fn code_is_carried() {
            let err = OpenAI::parse_error(
                404,
                r#"{"error": {"message": "no such model", "type": "invalid_request_error", "code": "model_not_found"}}"#,
            );
            assert_eq!(err.kind, LlmErrorKind::Provider);
            assert_eq!(err.code.as_deref(), Some("model_not_found"));
        }

        #[test]
        fn plain_string_error() {
            let err = OpenAI::parse_error(503, r#"{"error": "Model is currently loading"}"#);
            assert_eq!(err.kind, LlmErrorKind::Provider);
            assert!(err.message.contains("loading"));
        }

        #[test]
        fn non_json_body_is_http_status() {
            let err = OpenAI::parse_error(502, "<html>Bad Gateway</html>");
            assert_eq!(err.kind, LlmErrorKind::HttpStatus);
            assert_eq!(err.code.as_deref(), Some("502"));
        }
    }
}
