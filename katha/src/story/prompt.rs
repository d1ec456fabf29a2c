//! Prompt Builder: turns story parameters into a (system, user) pair.
//!
//! Both builders are pure. They render the built-in templates and do no I/O.

use std::sync::LazyLock;

use minijinja::context;

use crate::error::{Error, Result};
use crate::prompts::{PromptEngine, builtin};

use super::params::StoryParameters;

static ENGINE: LazyLock<PromptEngine> = LazyLock::new(PromptEngine::new);

/// A rendered prompt ready to send to a chat backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Persona and requirements.
    pub system: String,
    /// The user's request.
    pub user: String,
}

/// Build the prompt for a brand-new story.
///
/// The user prompt is the topic, verbatim.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the topic is blank.
pub fn build_generation_prompt(params: &StoryParameters) -> Result<Prompt> {
    params.validate()?;

    let system = ENGINE.render(
        builtin::STORYTELLER,
        context! {
            genre => params.genre.label(),
            tone => params.tone.label(),
            length => params.length.label(),
            characters => params.character_hints(),
        },
    )?;

    Ok(Prompt {
        system,
        user: params.topic.clone(),
    })
}

/// Build the prompt that rewrites or extends `current_story`.
///
/// The story is embedded verbatim in the system prompt and the instruction is
/// the user prompt, verbatim.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the instruction is blank.
pub fn build_revision_prompt(current_story: &str, instruction: &str) -> Result<Prompt> {
    if instruction.trim().is_empty() {
        return Err(Error::validation(
            "instruction",
            "instructions to update the story",
        ));
    }

    let system = ENGINE.render(builtin::EDITOR, context! { story => current_story })?;

    Ok(Prompt {
        system,
        user: instruction.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::story::params::{Genre, Length, Tone};

    mod generation {
        use super::*;

        #[test]
        fn mentions_every_parameter() {
            let params = StoryParameters::new("A hidden temple in the Himalayas")
                .genre(Genre::Mystery)
                .tone(Tone::Suspenseful)
                .length(Length::Short)
                .characters("");
            let prompt = build_generation_prompt(&params).unwrap();

            assert!(prompt.system.contains("Mystery"));
            assert!(prompt.system.contains("Suspenseful"));
            assert!(prompt.system.contains("Short (~300 words)"));
            assert!(prompt.system.contains("create your own"));
            assert_eq!(prompt.user, "A hidden temple in the Himalayas");
        }

        #[test]
        fn labels_are_not_escaped() {
            let params = StoryParameters::new("x").tone(Tone::DarkAndGritty);
            let prompt = build_generation_prompt(&params).unwrap();
            assert!(prompt.system.contains("Dark & Gritty"));
        }

        #[test]
        fn characters_are_quoted_when_present() {
            let params = StoryParameters::new("x").characters("  Meera, a clever weaver  ");
            let prompt = build_generation_prompt(&params).unwrap();
            assert!(prompt.system.contains("'Meera, a clever weaver'"));
            assert!(!prompt.system.contains("create your own"));
        }

        #[test]
        fn is_deterministic() {
            let params = StoryParameters::new("Monsoon").genre(Genre::Romance);
            assert_eq!(
                build_generation_prompt(&params).unwrap(),
                build_generation_prompt(&params).unwrap()
            );
        }

        #[test]
        fn blank_topic_is_rejected() {
            let err = build_generation_prompt(&StoryParameters::new("   ")).unwrap_err();
            assert!(matches!(err, Error::Validation { field: "topic", .. }));
        }
    }

    mod revision {
        use super::*;

        #[test]
        fn embeds_story_and_instruction_verbatim() {
            let story = "Once, in Varanasi, {{ a lamp }} & a <river> spoke.\n\nThe end.";
            let instruction = "Make the ending happier.";
            let prompt = build_revision_prompt(story, instruction).unwrap();

            assert!(prompt.system.contains("master story editor"));
            assert!(prompt.system.contains(story));
            assert_eq!(prompt.user, instruction);
        }

        #[test]
        fn blank_instruction_is_rejected() {
            let err = build_revision_prompt("story", " \t").unwrap_err();
            assert!(matches!(err, Error::Validation { field: "instruction", .. }));
        }
    }
}
