//! Story parameters collected from the form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Declares a form option enum with a display label and a URL-safe slug.
///
/// Parsing accepts either, case-insensitively. Serde uses the slug. The first
/// variant is the default.
macro_rules! form_option {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $first:ident => ($first_slug:literal, $first_label:literal),
            $($variant:ident => ($slug:literal, $label:literal)),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            #[serde(rename = $first_slug, alias = $first_label)]
            $first,
            $(
                #[serde(rename = $slug, alias = $label)]
                $variant,
            )*
        }

        impl $name {
            /// Every option, in form order.
            pub const ALL: &'static [Self] = &[Self::$first, $(Self::$variant),*];

            /// Label shown to users and interpolated into prompts.
            #[must_use]
            pub const fn label(&self) -> &'static str {
                match self {
                    Self::$first => $first_label,
                    $(Self::$variant => $label,)*
                }
            }

            /// Stable identifier used in forms and config files.
            #[must_use]
            pub const fn slug(&self) -> &'static str {
                match self {
                    Self::$first => $first_slug,
                    $(Self::$variant => $slug,)*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| {
                        v.slug().eq_ignore_ascii_case(wanted) || v.label().eq_ignore_ascii_case(wanted)
                    })
                    .ok_or_else(|| {
                        let known: Vec<&str> = Self::ALL.iter().map(Self::slug).collect();
                        Error::validation(
                            $field,
                            format!("unknown {} '{wanted}' (expected one of: {})", $field, known.join(", ")),
                        )
                    })
            }
        }
    };
}

form_option! {
    /// Story genre.
    Genre, "genre" {
        Folktale => ("folktale", "Folktale"),
        Fantasy => ("fantasy", "Fantasy"),
        Mystery => ("mystery", "Mystery"),
        SciFi => ("sci-fi", "Sci-Fi"),
        Romance => ("romance", "Romance"),
        Horror => ("horror", "Horror"),
    }
}

form_option! {
    /// Narrative tone.
    Tone, "tone" {
        Heartwarming => ("heartwarming", "Heartwarming"),
        Funny => ("funny", "Funny"),
        DarkAndGritty => ("dark-and-gritty", "Dark & Gritty"),
        Poetic => ("poetic", "Poetic"),
        Suspenseful => ("suspenseful", "Suspenseful"),
    }
}

form_option! {
    /// Requested story length.
    Length, "length" {
        Short => ("short", "Short (~300 words)"),
        Medium => ("medium", "Medium (~600 words)"),
        Long => ("long", "Long (~1000 words)"),
    }
}

form_option! {
    /// Which model tells the story.
    ModelChoice, "model" {
        Base => ("base", "Base Model"),
        FineTuned => ("fine-tuned", "Fine-Tuned Model"),
    }
}

impl ModelChoice {
    /// Resolve the choice to a model identifier.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the fine-tuned model is chosen but
    /// none is configured.
    pub fn resolve<'a>(&self, base: &'a str, fine_tuned: Option<&'a str>) -> Result<&'a str> {
        match self {
            Self::Base => Ok(base),
            Self::FineTuned => fine_tuned
                .filter(|m| !m.trim().is_empty())
                .ok_or_else(|| Error::validation("model", "no fine-tuned model is configured")),
        }
    }
}

/// Everything the storyteller needs to write a new tale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryParameters {
    /// Main idea of the story.
    pub topic: String,
    /// Genre.
    #[serde(default)]
    pub genre: Genre,
    /// Tone.
    #[serde(default)]
    pub tone: Tone,
    /// Desired length.
    #[serde(default)]
    pub length: Length,
    /// Optional character descriptions.
    #[serde(default)]
    pub characters: Option<String>,
}

impl StoryParameters {
    /// Create parameters for a topic with default genre, tone and length.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    /// Sets the genre.
    #[must_use]
    pub const fn genre(mut self, genre: Genre) -> Self {
        self.genre = genre;
        self
    }

    /// Sets the tone.
    #[must_use]
    pub const fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    /// Sets the length.
    #[must_use]
    pub const fn length(mut self, length: Length) -> Self {
        self.length = length;
        self
    }

    /// Sets the character descriptions. Blank text means "none".
    #[must_use]
    pub fn characters(mut self, characters: impl Into<String>) -> Self {
        self.characters = Some(characters.into());
        self
    }

    /// Character descriptions, trimmed, or `None` when absent or blank.
    #[must_use]
    pub fn character_hints(&self) -> Option<&str> {
        self.characters
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Check that the topic is present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank topic.
    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(Error::validation("topic", "a topic for your story"));
        }
        Ok(())
    }
}
