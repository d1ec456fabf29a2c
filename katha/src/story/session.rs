//! The per-user story session.

use std::fmt;

use crate::chat::{ChatProviderExt, SharedChatProvider};
use crate::error::{Error, LlmError, Result};

use super::params::StoryParameters;
use super::prompt::{Prompt, build_generation_prompt, build_revision_prompt};

/// Whether a session currently holds a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing generated yet, or reset.
    Empty,
    /// A story is available for display, narration and revision.
    HasStory,
}

/// Holds at most one story and mediates every call to the chat backend.
///
/// `generate` and `revise` take `&mut self`, so a session can only have one
/// request in flight. A failed call never changes the stored story.
pub struct StorySession {
    provider: SharedChatProvider,
    story: Option<String>,
    model: Option<String>,
    max_output_tokens: u32,
}

impl StorySession {
    /// Output token limit used when none is configured.
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1500;

    /// Create an empty session backed by `provider`.
    #[must_use]
    pub fn new(provider: SharedChatProvider) -> Self {
        Self {
            provider,
            story: None,
            model: None,
            max_output_tokens: Self::DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    /// Sets the output token limit.
    #[must_use]
    pub const fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Sets a model override.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.set_model(Some(model.into()));
        self
    }

    /// Replace the model override. `None` or a blank name uses the provider default.
    pub fn set_model(&mut self, model: Option<String>) {
        self.model = model.filter(|m| !m.trim().is_empty());
    }

    /// Model that the next request will use.
    #[must_use]
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Output token limit.
    #[must_use]
    pub const fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    /// The current story, if any.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.story.as_deref()
    }

    /// Returns `true` if a story is stored.
    #[must_use]
    pub const fn has_story(&self) -> bool {
        self.story.is_some()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.has_story() {
            SessionState::HasStory
        } else {
            SessionState::Empty
        }
    }

    /// Write a new story, replacing any existing one.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for a blank topic (the backend is not called)
    /// - [`Error::Llm`] when the backend fails or returns no text
    pub async fn generate(&mut self, params: &StoryParameters) -> Result<&str> {
        let prompt = build_generation_prompt(params)?;
        tracing::info!(
            genre = params.genre.slug(),
            tone = params.tone.slug(),
            length = params.length.slug(),
            "weaving a new tale"
        );

        let text = self.ask(&prompt).await?;
        Ok(self.story.insert(text).as_str())
    }

    /// Rewrite or extend the current story following `instruction`.
    ///
    /// # Errors
    ///
    /// - [`Error::NoStory`] when nothing has been generated (the backend is not called)
    /// - [`Error::Validation`] for a blank instruction
    /// - [`Error::Llm`] when the backend fails or returns no text
    pub async fn revise(&mut self, instruction: &str) -> Result<&str> {
        let Some(story) = self.story.as_deref() else {
            return Err(Error::NoStory);
        };
        let prompt = build_revision_prompt(story, instruction)?;
        tracing::info!(story_chars = story.len(), "reimagining the tale");

        let text = self.ask(&prompt).await?;
        Ok(self.story.insert(text).as_str())
    }

    /// Forget the current story.
    pub fn reset(&mut self) {
        if self.story.take().is_some() {
            tracing::debug!("story cleared");
        }
    }

    async fn ask(&self, prompt: &Prompt) -> Result<String> {
        let provider = self.provider.provider_name();
        let model = self.model();

        let text = self
            .provider
            .complete_with_model(model, &prompt.system, &prompt.user, self.max_output_tokens)
            .await
            .inspect_err(|e| tracing::warn!(provider, model, error = %e, "story request failed"))?;

        if text.trim().is_empty() {
            return Err(LlmError::response_format("non-empty story text", "an empty reply")
                .with_provider(provider)
                .into());
        }

        tracing::debug!(provider, model, chars = text.len(), "story received");
        Ok(text)
    }
}

impl fmt::Debug for StorySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorySession")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.model())
            .field("state", &self.state())
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}
