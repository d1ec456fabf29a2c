//! Ollama local LLM server client.
//!
//! Sends non-streaming requests to `/api/chat` on a local Ollama instance.

mod chat;
mod client;
mod config;
mod types;

pub use client::Ollama;
pub use config::OllamaConfig;
