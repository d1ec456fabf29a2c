//! The storyteller core.
//!
//! - [`StoryParameters`] with [`Genre`], [`Tone`] and [`Length`]
//! - the Prompt Builder ([`build_generation_prompt`], [`build_revision_prompt`])
//! - [`StorySession`], which owns the current story
//! - [`Narrator`], which reads a story aloud
//!
//! # Example
//!
//! ```rust,ignore
//! use katha::prelude::*;
//!
//! let mut session = StorySession::new(provider);
//! let params = StoryParameters::new("A hidden temple in the Himalayas")
//!     .genre(Genre::Mystery)
//!     .tone(Tone::Suspenseful);
//!
//! session.generate(&params).await?;
//! session.revise("Now introduce a villain who steals the jewel.").await?;
//! ```

mod narrator;
mod params;
mod prompt;
mod session;

pub use narrator::Narrator;
pub use params::{Genre, Length, ModelChoice, StoryParameters, Tone};
pub use prompt::{Prompt, build_generation_prompt, build_revision_prompt};
pub use session::{SessionState, StorySession};
