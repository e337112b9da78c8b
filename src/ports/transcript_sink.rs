//! Transcript sink port - receives chat transcript changes in order.

use async_trait::async_trait;

use crate::domain::conversation::TranscriptEvent;
use crate::domain::foundation::SessionId;
use crate::domain::survey::AnswerSet;

/// Receives ordered transcript appends, placeholder replacements and the
/// final answer set.
///
/// Delivery is best effort: a sink cannot fail a session.
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    /// Publishes events in the order they occurred.
    async fn publish(&self, session_id: SessionId, events: Vec<TranscriptEvent>);

    /// Called once when a session completes.
    async fn completed(&self, session_id: SessionId, answers: &AnswerSet);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_sink_is_object_safe() {
        fn _accepts_dyn(_sink: &dyn TranscriptSink) {}
    }
}
