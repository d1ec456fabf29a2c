//! Inference and speech backend implementations.
//!
//! Each backend is organized into its own submodule.
//!
//! # Available Backends
//!
//! - [`openai`] - OpenAI-compatible chat and speech (Hugging Face router by default)
//! - [`ollama`] - Ollama local LLM server
//! - [`google`] - Google Translate text-to-speech

mod chunker;

pub mod google;
pub mod ollama;
pub mod openai;

pub use chunker::chunk_text;
pub use google::{GoogleTts, GoogleTtsConfig};
pub use ollama::{Ollama, OllamaConfig};
pub use openai::{OpenAI, OpenAIConfig};
