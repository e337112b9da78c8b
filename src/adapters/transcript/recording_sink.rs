//! Transcript sink that remembers everything it receives.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::conversation::TranscriptEvent;
use crate::domain::foundation::SessionId;
use crate::domain::survey::AnswerSet;
use crate::ports::TranscriptSink;

#[derive(Debug, Clone, Default)]
pub struct RecordingTranscriptSink {
    events: Arc<Mutex<Vec<(SessionId, TranscriptEvent)>>>,
    completed: Arc<Mutex<Vec<(SessionId, AnswerSet)>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingTranscriptSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events received, in arrival order.
    pub fn events(&self) -> Vec<(SessionId, TranscriptEvent)> {
        lock(&self.events).clone()
    }

    /// Events received for one session.
    pub fn events_for(&self, session_id: SessionId) -> Vec<TranscriptEvent> {
        lock(&self.events)
            .iter()
            .filter(|(id, _)| *id == session_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Final answer sets received.
    pub fn completed(&self) -> Vec<(SessionId, AnswerSet)> {
        lock(&self.completed).clone()
    }
}

#[async_trait]
impl TranscriptSink for RecordingTranscriptSink {
    async fn publish(&self, session_id: SessionId, events: Vec<TranscriptEvent>) {
        lock(&self.events).extend(events.into_iter().map(|e| (session_id, e)));
    }

    async fn completed(&self, session_id: SessionId, answers: &AnswerSet) {
        lock(&self.completed).push((session_id, answers.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ChatMessage;

    #[tokio::test]
    async fn records_events_per_session_in_order() {
        let sink = RecordingTranscriptSink::new();
        let a = SessionId::new();
        let b = SessionId::new();

        sink.publish(a, vec![TranscriptEvent::Appended(ChatMessage::bot_notice("one"))]).await;
        sink.publish(b, vec![TranscriptEvent::Appended(ChatMessage::bot_notice("other"))]).await;
        sink.publish(a, vec![TranscriptEvent::Appended(ChatMessage::question("two"))]).await;

        let contents: Vec<String> = sink
            .events_for(a)
            .into_iter()
            .map(|e| match e {
                TranscriptEvent::Appended(m) => m.content().to_string(),
                TranscriptEvent::Replaced { message, .. } => message.content().to_string(),
            })
            .collect();
        assert_eq!(contents, vec!["one", "two"]);
        assert_eq!(sink.events().len(), 3);
    }
}
