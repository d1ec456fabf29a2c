//! Chat types, traits, and utilities for LLM operations.
//!
//! This module provides:
//! - [`ChatRequest`]: Request parameters for chat completions
//! - [`ChatResponse`]: Response from chat completions
//! - [`ChatProvider`]: Core trait for inference backends
//!
//! # Example
//!
//! ```rust,ignore
//! use katha::prelude::*;
//!
//! let request = ChatRequest::new("meta-llama/Meta-Llama-3-8B-Instruct")
//!     .system("You are a master Indian storyteller.")
//!     .user("A hidden temple in the Himalayas")
//!     .max_tokens(1500);
//!
//! let response = provider.chat(&request).await?;
//! println!("{}", response.text());
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::usage::Usage;

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural stop (end of response).
    #[default]
    Stop,
    /// Maximum token limit reached.
    Length,
    /// Content was filtered by safety systems.
    ContentFilter,
}

impl StopReason {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ContentFilter => "content_filter",
        }
    }

    /// Parse a provider finish reason (case-insensitive).
    ///
    /// - OpenAI: "stop", "length", "content_filter"
    /// - Ollama: "stop", "length"
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "length" | "max_tokens" => Self::Length,
            "content_filter" => Self::ContentFilter,
            _ => Self::Stop,
        }
    }

    /// Returns `true` if the model was cut off due to length.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self, Self::Length)
    }
}

/// A chat completion request to an LLM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier. Empty means "use the provider's default model".
    #[serde(default)]
    pub model: String,

    /// Conversation messages.
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

}

impl ChatRequest {
    /// Creates a new request with the specified model.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Adds a system message.
    #[must_use]
    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Adds a user message.
    #[must_use]
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Sets max tokens.
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

}

/// A chat completion response from an LLM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated message.
    pub message: Message,

    /// Why the model stopped generating.
    pub stop_reason: StopReason,

    /// Token usage statistics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Model identifier used for this response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Unique completion ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ChatResponse {
    /// Creates a new response with a message.
    #[must_use]
    pub const fn new(message: Message) -> Self {
        Self {
            message,
            stop_reason: StopReason::Stop,
            usage: None,
            model: None,
            id: None,
        }
    }

    /// Creates a response from text content.
    #[must_use]
    pub fn from_text(content: impl Into<String>) -> Self {
        Self::new(Message::assistant(content))
    }

    /// Sets the stop reason.
    #[must_use]
    pub const fn with_stop_reason(mut self, reason: StopReason) -> Self {
        self.stop_reason = reason;
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Returns the text content of the response.
    #[must_use]
    pub fn text(&self) -> &str {
        self.message.text()
    }

    /// Consumes the response, returning the text content.
    #[must_use]
    pub fn into_text(self) -> String {
        self.message.content
    }

    /// Returns `true` if the response was truncated due to length.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.stop_reason.is_truncated()
    }
}

/// Trait for inference backends that support chat completions.
///
/// Both the hosted OpenAI-compatible backend and the local Ollama backend
/// implement this trait; the story core only ever talks to `dyn ChatProvider`.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a chat completion request and receive a complete response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Llm`](crate::Error::Llm) on network failure,
    /// authentication failure, or a malformed response.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Get the name of this provider.
    ///
    /// Used for error messages and logging.
    fn provider_name(&self) -> &'static str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;
}

/// Extension trait for `ChatProvider` with convenience methods.
#[async_trait]
pub trait ChatProviderExt: ChatProvider {
    /// Send a system prompt and user prompt, returning the response text.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`ChatProvider::chat`].
    async fn complete(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        let model = self.default_model().to_owned();
        self.complete_with_model(&model, system, prompt, max_tokens)
            .await
    }

    /// Same as [`complete`](Self::complete) but targeting a specific model.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`ChatProvider::chat`].
    async fn complete_with_model(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String> {
        let request = ChatRequest::new(model)
            .system(system)
            .user(prompt)
            .max_tokens(max_tokens);
        let response = self.chat(&request).await?;
        if response.is_truncated() {
            tracing::warn!(
                provider = self.provider_name(),
                max_tokens,
                "response was truncated by the token limit"
            );
        }
        Ok(response.into_text())
    }
}

impl<T: ChatProvider + ?Sized> ChatProviderExt for T {}

/// Type alias for an Arc-wrapped ChatProvider.
pub type SharedChatProvider = std::sync::Arc<dyn ChatProvider>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::message::Role;
    use std::sync::Mutex;

    /// Records the last request and answers with a fixed text.
    struct Recorder {
        last: Mutex<Option<ChatRequest>>,
        reply: ChatResponse,
    }

    #[async_trait]
    impl ChatProvider for Recorder {
        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
            *self.last.lock().unwrap() = Some(request.clone());
            Ok(self.reply.clone())
        }

        fn provider_name(&self) -> &'static str {
            "recorder"
        }

        fn default_model(&self) -> &str {
            "default-model"
        }
    }

    mod chat_request {
        use super::*;

        #[test]
        fn builder_chain() {
            let req = ChatRequest::new("llama3")
                .system("sys")
                .user("hi")
                .max_tokens(1500);

            assert_eq!(req.model, "llama3");
            assert_eq!(req.messages.len(), 2);
            assert_eq!(req.messages[0].role, Role::System);
            assert_eq!(req.max_tokens, Some(1500));
        }

        #[test]
        fn serde_skips_none_values() {
            let json = serde_json::to_string(&ChatRequest::new("m")).unwrap();
            assert!(!json.contains("max_tokens"));
        }
    }

    mod stop_reason {
        use super::*;

        #[test]
        fn parse_known_values() {
            assert_eq!(StopReason::parse("stop"), StopReason::Stop);
            assert_eq!(StopReason::parse("LENGTH"), StopReason::Length);
            assert_eq!(StopReason::parse("content_filter"), StopReason::ContentFilter);
            assert_eq!(StopReason::parse("whatever"), StopReason::Stop);
        }

        #[test]
        fn truncated_only_for_length() {
            assert!(StopReason::Length.is_truncated());
            assert!(!StopReason::Stop.is_truncated());
        }
    }

    mod chat_response {
        use super::*;

        #[test]
        fn from_text_is_assistant() {
            let resp = ChatResponse::from_text("Once upon a time");
            assert_eq!(resp.message.role, Role::Assistant);
            assert_eq!(resp.text(), "Once upon a time");
            assert!(!resp.is_truncated());
        }
    }

    mod provider_ext {
        use super::*;

        #[tokio::test]
        async fn complete_sends_system_user_and_limit() {
            let provider = Recorder {
                last: Mutex::new(None),
                reply: ChatResponse::from_text("story"),
            };

            let text = provider.complete("rules", "topic", 1500).await.unwrap();
            assert_eq!(text, "story");

            let req = provider.last.lock().unwrap().clone().unwrap();
            assert_eq!(req.model, "default-model");
            assert_eq!(req.messages[0], Message::system("rules"));
            assert_eq!(req.messages[1], Message::user("topic"));
            assert_eq!(req.max_tokens, Some(1500));
        }

        #[tokio::test]
        async fn complete_with_model_overrides_default() {
            let provider = Recorder {
                last: Mutex::new(None),
                reply: ChatResponse::from_text("x").with_stop_reason(StopReason::Length),
            };

            let text = provider
                .complete_with_model("fine-tuned", "s", "u", 10)
                .await
                .unwrap();
            assert_eq!(text, "x");
            let req = provider.last.lock().unwrap().clone().unwrap();
            assert_eq!(req.model, "fine-tuned");
        }
    }
}
