//! Prompt template system.
//!
//! - [`PromptEngine`] - Jinja2-compatible template rendering engine
//! - [`builtin`] - The storyteller and editor templates, embedded at compile time
//!
//! # Example
//!
//! ```rust,ignore
//! use katha::prompts::{builtin, PromptEngine};
//! use minijinja::context;
//!
//! let engine = PromptEngine::new();
//! let system = engine.render(builtin::EDITOR, context! { story => "Once..." })?;
//! ```

mod engine;

pub use engine::{PromptEngine, RenderError};

/// Built-in templates embedded at compile time.
pub mod builtin {
    /// Storyteller persona and story requirements.
    ///
    /// Variables: `genre`, `tone`, `length`, `characters` (may be none).
    pub const STORYTELLER: &str = include_str!("storyteller.j2");

    /// Story editor persona with the current story as context.
    ///
    /// Variables: `story`.
    pub const EDITOR: &str = include_str!("editor.j2");
}
