//! Template rendering engine using minijinja (Jinja2-compatible).

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

/// Jinja2-compatible template rendering engine.
///
/// Templates rendered from strings are never auto-escaped, so user text such
/// as a story or a character description is interpolated verbatim.
///
/// # Example
///
/// ```rust,ignore
/// let engine = PromptEngine::new();
/// let result = engine.render("Topic: {{ topic }}", context! { topic => "A temple" })?;
/// ```
#[derive(Debug, Clone)]
pub struct PromptEngine {
    env: Environment<'static>,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    /// Create a new template engine.
    ///
    /// Referencing a variable that was not supplied is an error rather than
    /// an empty string.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(false);
        env.set_lstrip_blocks(false);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env }
    }

    /// Render a template string with the given context.
    ///
    /// # Errors
    ///
    /// Returns an error if the template syntax is invalid or rendering fails.
    pub fn render<S: Serialize>(&self, template: &str, context: S) -> Result<String, RenderError> {
        let tmpl = self
            .env
            .template_from_str(template)
            .map_err(|e| RenderError::Template(e.to_string()))?;

        tmpl.render(context)
            .map_err(|e| RenderError::Render(e.to_string()))
    }
}

/// Error type for template rendering operations.
#[derive(Debug, Clone)]
pub enum RenderError {
    /// Template parsing/compilation error.
    Template(String),
    /// Runtime rendering error.
    Render(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template(msg) => write!(f, "Template error: {msg}"),
            Self::Render(msg) => write!(f, "Render error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<RenderError> for crate::Error {
    fn from(err: RenderError) -> Self {
        Self::Template(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn simple_render() {
        let engine = PromptEngine::new();
        let result = engine
            .render("Topic: {{ topic }}", context! { topic => "A hidden temple" })
            .unwrap();
        assert_eq!(result, "Topic: A hidden temple");
    }

    #[test]
    fn conditional_on_none() {
        let engine = PromptEngine::new();
        let template = "{% if characters %}{{ characters }}{% else %}none{% endif %}";

        assert_eq!(
            engine.render(template, context! { characters => "Vikram" }).unwrap(),
            "Vikram"
        );
        assert_eq!(
            engine.render(template, context! { characters => Option::<String>::None }).unwrap(),
            "none"
        );
    }

    #[test]
    fn no_html_escaping() {
        let engine = PromptEngine::new();
        let result = engine
            .render("{{ text }}", context! { text => "Dark & Gritty <tale>" })
            .unwrap();
        assert_eq!(result, "Dark & Gritty <tale>");
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let engine = PromptEngine::new();
        let err = engine.render("{{ missing }}", context! {}).unwrap_err();
        assert!(matches!(err, RenderError::Render(_)));
    }

    #[test]
    fn syntax_error_is_template_error() {
        let engine = PromptEngine::new();
        let err = engine.render("{% if %}", context! {}).unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));
        assert!(crate::Error::from(err).to_string().starts_with("Template error"));
    }
}
