//! HTML rendering of the storyteller page.

use axum::http::StatusCode;
use katha::Error;
use katha::story::{Genre, Length, ModelChoice, Tone};
use minijinja::Environment;
use serde::Serialize;

use crate::backend::Backends;

use super::error::status_for;

const PAGE: &str = "page.html";

/// Renders [`PageView`]s with the built-in template.
///
/// The template name ends in `.html`, so every interpolated value is
/// HTML-escaped.
#[derive(Debug)]
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    /// Compile the page template.
    ///
    /// # Errors
    ///
    /// Fails if the template has a syntax error.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(PAGE, include_str!("templates/page.html"))?;
        Ok(Self { env })
    }

    /// Render `view` to a full HTML document.
    ///
    /// # Errors
    ///
    /// Fails if rendering hits an undefined filter or similar template bug.
    pub fn render(&self, view: &PageView) -> Result<String, minijinja::Error> {
        self.env.get_template(PAGE)?.render(view)
    }
}

/// One `<option>` or radio button.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Choice {
    value: &'static str,
    label: &'static str,
}

macro_rules! choices {
    ($ty:ty) => {
        <$ty>::ALL
            .iter()
            .map(|v| Choice {
                value: v.slug(),
                label: v.label(),
            })
            .collect::<Vec<_>>()
    };
}

/// Last submitted form values, echoed back so the form stays filled in.
#[derive(Debug, Clone, Serialize)]
pub struct FormValues {
    pub(super) topic: String,
    pub(super) genre: String,
    pub(super) tone: String,
    pub(super) length: String,
    pub(super) characters: String,
    pub(super) model: String,
    pub(super) instruction: String,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            topic: String::new(),
            genre: Genre::default().slug().to_owned(),
            tone: Tone::default().slug().to_owned(),
            length: Length::default().slug().to_owned(),
            characters: String::new(),
            model: ModelChoice::default().slug().to_owned(),
            instruction: String::new(),
        }
    }
}

/// A message shown above the story.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    level: &'static str,
    text: String,
}

/// Everything the page template shows.
#[derive(Debug, Serialize)]
pub struct PageView {
    genres: Vec<Choice>,
    tones: Vec<Choice>,
    lengths: Vec<Choice>,
    models: Vec<Choice>,
    base_model: String,
    fine_tuned_model: Option<String>,
    narration: bool,
    pub(super) form: FormValues,
    pub(super) story: Option<String>,
    pub(super) audio_url: Option<String>,
    notice: Option<Notice>,
    #[serde(skip)]
    status: StatusCode,
}

impl PageView {
    /// An empty page for the configured backends.
    #[must_use]
    pub fn new(backends: &Backends) -> Self {
        let models = if backends.offers_model_choice() {
            choices!(ModelChoice)
        } else {
            Vec::new()
        };

        Self {
            genres: choices!(Genre),
            tones: choices!(Tone),
            lengths: choices!(Length),
            models,
            base_model: backends.base_model().to_owned(),
            fine_tuned_model: backends.fine_tuned_model.clone(),
            narration: backends.narrator.is_some(),
            form: FormValues::default(),
            story: None,
            audio_url: None,
            notice: None,
            status: StatusCode::OK,
        }
    }

    /// Show `err` and answer with its status code.
    pub fn fail(&mut self, err: &Error) {
        let level = if err.is_user_error() { "warning" } else { "error" };
        self.notice = Some(Notice {
            level,
            text: err.to_string(),
        });
        self.status = status_for(err);
    }

    /// Show an informational message without changing the status.
    pub fn inform(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            level: "info",
            text: text.into(),
        });
    }

    /// Answer with `status`.
    pub const fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// HTTP status for this page.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}
