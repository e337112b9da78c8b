//! Transcript sink that writes events to the tracing pipeline.

use async_trait::async_trait;
use tracing::info;

use crate::domain::conversation::TranscriptEvent;
use crate::domain::foundation::SessionId;
use crate::domain::survey::AnswerSet;
use crate::ports::TranscriptSink;

#[derive(Debug, Clone, Default)]
pub struct TracingTranscriptSink;

impl TracingTranscriptSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TranscriptSink for TracingTranscriptSink {
    async fn publish(&self, session_id: SessionId, events: Vec<TranscriptEvent>) {
        for event in events {
            match event {
                TranscriptEvent::Appended(message) => info!(
                    target: "transcript",
                    session_id = %session_id,
                    message_id = %message.id(),
                    kind = ?message.kind(),
                    chars = message.content().len(),
                    "Message appended"
                ),
                TranscriptEvent::Replaced { id, message } => info!(
                    target: "transcript",
                    session_id = %session_id,
                    message_id = %id,
                    kind = ?message.kind(),
                    "Placeholder replaced"
                ),
            }
        }
    }

    async fn completed(&self, session_id: SessionId, answers: &AnswerSet) {
        info!(
            target: "transcript",
            session_id = %session_id,
            title = %answers.title,
            answers = answers.len(),
            "Survey answers ready"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ChatMessage;
    use crate::domain::foundation::Timestamp;

    #[tokio::test]
    async fn accepts_events_and_results() {
        let sink = TracingTranscriptSink::new();
        let message = ChatMessage::bot_notice("Hello");
        sink.publish(
            SessionId::new(),
            vec![
                TranscriptEvent::Appended(message.clone()),
                TranscriptEvent::Replaced {
                    id: message.id(),
                    message,
                },
            ],
        )
        .await;
        sink.completed(
            SessionId::new(),
            &AnswerSet {
                title: "Survey".to_string(),
                answers: vec![],
                completed_at: Timestamp::now(),
            },
        )
        .await;
    }
}
