//! OpenAI API request and response types.
//!
//! Internal types that map directly onto the Chat Completions and Audio APIs.

use serde::{Deserialize, Serialize};

use crate::usage::Usage;

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIChatRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

/// Request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: String,
}

/// Chat completion response body.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChatResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Response choice.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Response message.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Text-to-speech request body.
#[derive(Debug, Clone, Serialize)]
pub struct OpenAISpeechRequest {
    pub model: String,
    pub input: String,
    pub voice: String,
    pub response_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

/// Error envelope. Hugging Face returns `error` as a bare string.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIErrorResponse {
    pub error: OpenAIErrorBody,
}

/// Error details.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OpenAIErrorBody {
    Detailed {
        message: String,
        #[serde(rename = "type", default)]
        error_type: Option<String>,
        #[serde(default)]
        code: Option<serde_json::Value>,
    },
    Plain(String),
}
