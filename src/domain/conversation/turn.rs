//! ConversationTurn - one generated question and its collected answer.

use serde::Serialize;
use serde_json::Value;

use crate::domain::foundation::FieldId;

/// One question/metadata/answer triple within a single iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    /// Field this question targets, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_hint: Option<FieldId>,
    pub question_text: String,
    /// Advisory rationale from the generator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
}

impl ConversationTurn {
    /// Creates an unanswered turn.
    pub fn new(question_text: impl Into<String>, field_hint: Option<FieldId>) -> Self {
        Self {
            field_hint,
            question_text: question_text.into(),
            intent: None,
            description: None,
            answer_text: None,
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Reads one element of a generated `questions` array.
    ///
    /// Accepts either a bare string or an object. The question text is taken
    /// from `question`, `questionText`, `text` or `label`; the field hint from
    /// `fieldHint`, `fieldId` or `id`. Returns `None` when no question text
    /// can be found.
    pub fn from_generated(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| Self::new(text, None))
            }
            Value::Object(map) => {
                let text = ["question", "questionText", "text", "label"]
                    .iter()
                    .find_map(|k| non_blank(map.get(*k)))?;

                let field_hint = ["fieldHint", "fieldId", "field_id", "id"]
                    .iter()
                    .find_map(|k| match map.get(*k) {
                        Some(Value::Number(n)) => Some(n.to_string()),
                        other => non_blank(other),
                    })
                    .and_then(|s| FieldId::new(s).ok());

                Some(Self {
                    field_hint,
                    question_text: text,
                    intent: non_blank(map.get("intent")),
                    description: non_blank(map.get("description")),
                    answer_text: None,
                })
            }
            _ => None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.answer_text.is_some()
    }
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_object_with_metadata() {
        let turn = ConversationTurn::from_generated(&json!({
            "id": "q2",
            "question": "What's the best email to reach you?",
            "intent": "collect email",
            "description": "Email Address"
        }))
        .unwrap();

        assert_eq!(turn.field_hint.as_ref().unwrap().as_str(), "q2");
        assert_eq!(turn.question_text, "What's the best email to reach you?");
        assert_eq!(turn.intent.as_deref(), Some("collect email"));
        assert_eq!(turn.description.as_deref(), Some("Email Address"));
        assert!(!turn.is_answered());
    }

    #[test]
    fn falls_back_to_label_as_question_text() {
        let turn = ConversationTurn::from_generated(&json!({"id": "q1", "label": "Name?"})).unwrap();
        assert_eq!(turn.question_text, "Name?");
    }

    #[test]
    fn reads_bare_string_without_hint() {
        let turn = ConversationTurn::from_generated(&json!("Anything else to add?")).unwrap();
        assert!(turn.field_hint.is_none());
    }

    #[test]
    fn numeric_ids_become_hints() {
        let turn = ConversationTurn::from_generated(&json!({"fieldId": 3, "text": "Age?"})).unwrap();
        assert_eq!(turn.field_hint.unwrap().as_str(), "3");
    }

    #[test]
    fn rejects_entries_without_text() {
        assert!(ConversationTurn::from_generated(&json!({"id": "q1"})).is_none());
        assert!(ConversationTurn::from_generated(&json!("  ")).is_none());
        assert!(ConversationTurn::from_generated(&json!(42)).is_none());
    }

    #[test]
    fn serializes_in_camel_case() {
        let turn = ConversationTurn::new("Name?", Some(FieldId::new("q1").unwrap()));
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["fieldHint"], "q1");
        assert_eq!(value["questionText"], "Name?");
        assert!(value.get("answerText").is_none());
    }
}
