//! Prompt templates for question generation and reconciliation.
//!
//! Templates are plain text with `{{placeholder}}` markers. The built-in
//! defaults can be replaced from a YAML file:
//!
//! ```yaml
//! generation: |
//!   ... {{schema}} ... {{limit}} ...
//! reconciliation: |
//!   ... {{conversational}} ... {{survey}} ... {{history}} ...
//! ```

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::domain::conversation::{ChatMessage, ChatMessageKind, ConversationTurn};
use crate::domain::survey::Schema;

/// Errors from loading or rendering templates.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("could not read prompt file {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid prompt file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{template} template is missing the {placeholder} placeholder")]
    MissingPlaceholder {
        template: &'static str,
        placeholder: &'static str,
    },

    #[error("could not serialize prompt input: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The two prompt templates used by the survey loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    generation: String,
    reconciliation: String,
}

#[derive(Debug, Deserialize)]
struct PromptFile {
    generation: Option<String>,
    reconciliation: Option<String>,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            generation: GENERATION_TEMPLATE.to_string(),
            reconciliation: RECONCILIATION_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Parses YAML overrides. Templates left out keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, PromptError> {
        let file: PromptFile = serde_yaml::from_str(yaml)?;
        let defaults = Self::default();
        let templates = Self {
            generation: file.generation.unwrap_or(defaults.generation),
            reconciliation: file.reconciliation.unwrap_or(defaults.reconciliation),
        };
        templates.validate()?;
        Ok(templates)
    }

    /// Loads YAML overrides from disk.
    pub fn from_yaml_file(path: &Path) -> Result<Self, PromptError> {
        let yaml = std::fs::read_to_string(path).map_err(|e| PromptError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&yaml)
    }

    fn validate(&self) -> Result<(), PromptError> {
        let required: [(&'static str, &str, &'static str); 3] = [
            ("generation", &self.generation, "{{schema}}"),
            ("reconciliation", &self.reconciliation, "{{conversational}}"),
            ("reconciliation", &self.reconciliation, "{{survey}}"),
        ];
        for (template, text, placeholder) in required {
            if !text.contains(placeholder) {
                return Err(PromptError::MissingPlaceholder {
                    template,
                    placeholder,
                });
            }
        }
        Ok(())
    }

    /// Renders the generation prompt for the still-open fields.
    pub fn render_generation(&self, open: &Schema, limit: usize) -> Result<String, PromptError> {
        let schema = serde_json::to_string_pretty(open)?;
        Ok(self
            .generation
            .replace("{{schema}}", &schema)
            .replace("{{limit}}", &limit.to_string()))
    }

    /// Renders the reconciliation prompt.
    pub fn render_reconciliation(
        &self,
        survey: &Schema,
        batch: &[ConversationTurn],
        history: &[ChatMessage],
    ) -> Result<String, PromptError> {
        let conversational = serde_json::to_string_pretty(batch)?;
        let survey = serde_json::to_string_pretty(survey)?;
        Ok(self
            .reconciliation
            .replace("{{conversational}}", &conversational)
            .replace("{{survey}}", &survey)
            .replace("{{history}}", &render_history(history)))
    }
}

/// One line per transcript entry, loading notices left out.
fn render_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .filter_map(|m| {
            let speaker = match m.kind() {
                ChatMessageKind::BotNotice | ChatMessageKind::Question => "Assistant",
                ChatMessageKind::UserAnswer => "User",
                ChatMessageKind::LoadingNotice => return None,
            };
            Some(format!("{}: {}", speaker, m.content()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ════════════════════════════════════════════════════════════════════════════
// Default templates
// ════════════════════════════════════════════════════════════════════════════

const GENERATION_TEMPLATE: &str = r#"You are helping a person fill out a survey through a friendly conversation.

Below is the part of the survey that still needs answers, as JSON:

{{schema}}

Write at most {{limit}} conversational questions that together collect the missing answers. Prefer one question per field. You may combine closely related fields or add a short clarifying question when a field is ambiguous.

Respond with JSON only, in this exact shape:

```json
{
  "questions": [
    {
      "fieldId": "<id of the field this question is for, or null>",
      "question": "<the question to ask the user>",
      "intent": "<what this question is trying to learn>",
      "description": "<short hint shown under the question>"
    }
  ]
}
```"#;

const RECONCILIATION_TEMPLATE: &str = r#"You are completing a survey from a conversation with the user.

Current survey, with answers recorded so far:

{{survey}}

Questions asked in this round and the user's answers:

{{conversational}}

Full conversation so far:

{{history}}

Using only the newly answered questions and the answers already recorded, fill in every survey field you can. Keep existing answers unless the new answers clearly replace them. For choice and scale fields the answer must be one of the listed options. Leave "answer" null when the user has not given enough information.

If a new answer conflicts with an earlier one, list it under "contradictionsFound".

Respond with JSON only, in this exact shape:

```json
{
  "questions": [
    { "id": "<field id>", "label": "<field label>", "type": "<field type>", "required": true, "answer": "<answer or null>" }
  ],
  "contradictionsFound": [
    { "fieldId": "<field id>", "description": "<what conflicts>" }
  ],
  "surveyComplete": false
}
```"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::FieldId;
    use crate::domain::survey::{Field, FieldKind};

    fn schema() -> Schema {
        Schema::new(
            "Feedback",
            None,
            vec![Field::new(FieldId::new("q1").unwrap(), "Your name", FieldKind::ShortText, true, vec![])
                .unwrap()],
        )
        .unwrap()
    }

    mod rendering {
        use super::*;

        #[test]
        fn generation_fills_schema_and_limit() {
            let prompt = PromptTemplates::default()
                .render_generation(&schema(), 5)
                .unwrap();
            assert!(prompt.contains("\"Your name\""));
            assert!(prompt.contains("at most 5"));
            assert!(!prompt.contains("{{"));
        }

        #[test]
        fn reconciliation_includes_batch_and_history() {
            let turn = ConversationTurn::new("What is your name?", Some(FieldId::new("q1").unwrap()));
            let history = vec![
                ChatMessage::question("What is your name?"),
                ChatMessage::user_answer("Ada"),
                ChatMessage::loading("Working..."),
            ];

            let prompt = PromptTemplates::default()
                .render_reconciliation(&schema(), &[turn], &history)
                .unwrap();

            assert!(prompt.contains("\"questionText\": \"What is your name?\""));
            assert!(prompt.contains("User: Ada"));
            assert!(!prompt.contains("Working..."));
            assert!(!prompt.contains("{{"));
        }
    }

    mod overrides {
        use super::*;

        #[test]
        fn yaml_replaces_only_given_templates() {
            let templates = PromptTemplates::from_yaml("generation: \"Ask about {{schema}}\"\n").unwrap();
            assert!(templates
                .render_generation(&schema(), 3)
                .unwrap()
                .starts_with("Ask about {"));
            assert_eq!(templates.reconciliation, RECONCILIATION_TEMPLATE);
        }

        #[test]
        fn rejects_template_without_placeholder() {
            let result = PromptTemplates::from_yaml("reconciliation: \"merge {{survey}}\"\n");
            assert!(matches!(
                result,
                Err(PromptError::MissingPlaceholder {
                    placeholder: "{{conversational}}",
                    ..
                })
            ));
        }

        #[test]
        fn loads_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("prompts.yaml");
            std::fs::write(&path, "generation: \"List {{schema}}\"\n").unwrap();

            let templates = PromptTemplates::from_yaml_file(&path).unwrap();
            assert!(templates.generation.starts_with("List"));
        }

        #[test]
        fn missing_file_is_io_error() {
            let result = PromptTemplates::from_yaml_file(Path::new("/nonexistent/prompts.yaml"));
            assert!(matches!(result, Err(PromptError::Io { .. })));
        }
    }
}
