//! HTTP DTOs for survey session endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{ChatMessage, ChatMessageKind};
use crate::domain::session::{SessionState, SurveySession};
use crate::domain::survey::{AnswerSet, Contradiction};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to start a session for a form.
#[derive(Debug, Clone, Deserialize)]
pub struct StartSurveyRequest {
    pub form_link: String,
    #[serde(default)]
    pub consent: bool,
}

/// Answer to one question of the current batch.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswerRequest {
    pub turn_index: usize,
    pub answer: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Full session view returned by every session endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub state: SessionState,
    pub iteration: u32,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<CurrentQuestionResponse>,
    pub transcript: Vec<ChatMessageResponse>,
    pub contradictions: Vec<ContradictionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<AnswerSet>,
    pub updated_at: String,
}

/// The question waiting for an answer.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentQuestionResponse {
    pub turn_index: usize,
    pub batch_len: usize,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageResponse {
    pub id: String,
    pub kind: ChatMessageKind,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContradictionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    pub description: String,
}

impl From<&SurveySession> for SessionResponse {
    fn from(session: &SurveySession) -> Self {
        Self {
            session_id: session.id().to_string(),
            state: session.state(),
            iteration: session.iteration(),
            progress: session.progress().value(),
            survey_title: session.schema().map(|s| s.title().to_string()),
            current_question: session.current_question().map(|current| CurrentQuestionResponse {
                turn_index: current.index,
                batch_len: current.batch_len,
                question: current.turn.question_text.clone(),
                description: current.turn.description.clone(),
                field_id: current.turn.field_hint.as_ref().map(|id| id.to_string()),
            }),
            transcript: session
                .transcript()
                .messages()
                .iter()
                .map(ChatMessageResponse::from)
                .collect(),
            contradictions: session
                .contradictions()
                .iter()
                .map(ContradictionResponse::from)
                .collect(),
            answers: session.answer_set().cloned(),
            updated_at: session.updated_at().to_rfc3339(),
        }
    }
}

impl From<&ChatMessage> for ChatMessageResponse {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id().to_string(),
            kind: message.kind(),
            content: message.content().to_string(),
            timestamp: message.timestamp().to_rfc3339(),
        }
    }
}

impl From<&Contradiction> for ContradictionResponse {
    fn from(contradiction: &Contradiction) -> Self {
        Self {
            field_id: contradiction.field_id.as_ref().map(|id| id.to_string()),
            description: contradiction.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::{AccessToken, SessionContext};
    use crate::domain::survey::FormReference;

    #[test]
    fn start_request_defaults_consent_to_false() {
        let req: StartSurveyRequest =
            serde_json::from_str(r#"{"form_link": "https://forms.gle/abc"}"#).unwrap();
        assert_eq!(req.form_link, "https://forms.gle/abc");
        assert!(!req.consent);
    }

    #[test]
    fn answer_request_deserializes() {
        let req: SubmitAnswerRequest =
            serde_json::from_str(r#"{"turn_index": 2, "answer": "Blue"}"#).unwrap();
        assert_eq!(req.turn_index, 2);
        assert_eq!(req.answer, "Blue");
    }

    #[test]
    fn fresh_session_view() {
        let session = SurveySession::new(SessionContext::new(
            FormReference::FormId("abc".to_string()),
            AccessToken::new("t"),
        ));

        let response = SessionResponse::from(&session);
        assert_eq!(response.state, SessionState::Initializing);
        assert_eq!(response.progress, 0);
        assert!(response.current_question.is_none());
        assert!(response.answers.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["state"]["status"], "initializing");
        assert!(json.get("survey_title").is_none());
    }
}
