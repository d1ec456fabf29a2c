//! OpenAI-compatible API client.
//!
//! Talks to any server that speaks the Chat Completions protocol. The default
//! base URL is the Hugging Face inference router, which serves open models
//! such as Llama 3 behind an OpenAI-compatible surface. Supports:
//! - Chat completions
//! - Text-to-Speech (`/audio/speech`)

mod audio;
mod chat;
mod client;
mod config;
mod types;

pub use client::OpenAI;
pub use config::OpenAIConfig;
