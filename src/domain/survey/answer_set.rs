//! AnswerSet - the exported result of a completed session.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::Schema;

/// One (question, answer) pair of the final result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

/// Ordered question/answer pairs taken from the final schema snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub title: String,
    pub answers: Vec<QuestionAnswer>,
    pub completed_at: Timestamp,
}

impl AnswerSet {
    /// Collects every answered field in schema order.
    pub fn from_schema(schema: &Schema) -> Self {
        let answers = schema
            .fields()
            .iter()
            .filter_map(|field| {
                field.answer().map(|answer| QuestionAnswer {
                    question: field.label().to_string(),
                    answer: answer.to_string(),
                })
            })
            .collect();

        Self {
            title: schema.title().to_string(),
            answers,
            completed_at: Timestamp::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Renders the JSON document offered for download.
    pub fn to_json_document(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::FieldId;
    use crate::domain::survey::{Field, FieldKind};

    fn field(id: &str, label: &str, answer: Option<&str>) -> Field {
        Field::new(FieldId::new(id).unwrap(), label, FieldKind::ShortText, false, vec![])
            .unwrap()
            .with_answer(answer.map(String::from))
    }

    #[test]
    fn keeps_schema_order() {
        let schema = Schema::new(
            "Feedback",
            None,
            vec![field("q2", "Email", Some("a@b.c")), field("q1", "Name", Some("Ada"))],
        )
        .unwrap();

        let set = AnswerSet::from_schema(&schema);
        let questions: Vec<&str> = set.answers.iter().map(|qa| qa.question.as_str()).collect();
        assert_eq!(questions, vec!["Email", "Name"]);
        assert_eq!(set.title, "Feedback");
    }

    #[test]
    fn skips_unanswered_fields() {
        let schema = Schema::new(
            "Feedback",
            None,
            vec![field("q1", "Name", Some("Ada")), field("q2", "Email", None)],
        )
        .unwrap();
        assert_eq!(AnswerSet::from_schema(&schema).len(), 1);
    }

    #[test]
    fn json_document_lists_pairs() {
        let schema = Schema::new("Feedback", None, vec![field("q1", "Name", Some("Ada"))]).unwrap();
        let doc = AnswerSet::from_schema(&schema).to_json_document().unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(value["answers"][0]["question"], "Name");
        assert_eq!(value["answers"][0]["answer"], "Ada");
    }
}
