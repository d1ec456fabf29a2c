//! Katha - an AI storyteller steeped in Indian settings and folklore.
//!
//! This crate holds the story core and the backend clients it talks to:
//! a story session that generates and revises one tale at a time, the prompt
//! builder behind it, and chat and speech providers for hosted and local
//! models.

pub mod audio;
pub mod chat;
pub mod error;
pub mod llms;
pub mod message;
pub mod prelude;
pub mod prompts;
pub mod story;
pub mod usage;

pub use error::{Error, LlmError, Result};
