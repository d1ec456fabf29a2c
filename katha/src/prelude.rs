//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use katha::prelude::*;
//! ```

pub use crate::llms::{GoogleTts, GoogleTtsConfig, Ollama, OllamaConfig, OpenAI, OpenAIConfig};

pub use crate::error::{Error, LlmError, LlmErrorKind, Result};

pub use crate::audio::{
    AudioFormat, SharedSpeechProvider, SpeechRequest, SpeechResponse, TextToSpeechProvider, Voice,
};
pub use crate::chat::{
    ChatProvider, ChatProviderExt, ChatRequest, ChatResponse, SharedChatProvider, StopReason,
};
pub use crate::message::{Message, Role};
pub use crate::story::{
    Genre, Length, ModelChoice, Narrator, Prompt, SessionState, StoryParameters, StorySession,
    Tone, build_generation_prompt, build_revision_prompt,
};
pub use crate::usage::Usage;
