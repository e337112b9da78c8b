//! Transcript - the append-only chat history of one session.
//!
//! The only permitted mutation is the "pending placeholder": a loading
//! notice that the next appended message replaces in place.

use serde::Serialize;

use crate::domain::foundation::{MessageId, Timestamp};

/// What a transcript entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChatMessageKind {
    BotNotice,
    Question,
    UserAnswer,
    LoadingNotice,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    id: MessageId,
    kind: ChatMessageKind,
    content: String,
    timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(kind: ChatMessageKind, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            kind,
            content: content.into(),
            timestamp: Timestamp::now(),
        }
    }

    pub fn bot_notice(content: impl Into<String>) -> Self {
        Self::new(ChatMessageKind::BotNotice, content)
    }

    pub fn question(content: impl Into<String>) -> Self {
        Self::new(ChatMessageKind::Question, content)
    }

    pub fn user_answer(content: impl Into<String>) -> Self {
        Self::new(ChatMessageKind::UserAnswer, content)
    }

    pub fn loading(content: impl Into<String>) -> Self {
        Self::new(ChatMessageKind::LoadingNotice, content)
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn kind(&self) -> ChatMessageKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Change notifications for a transcript sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    Appended(ChatMessage),
    /// The pending placeholder `id` now shows `message`.
    Replaced { id: MessageId, message: ChatMessage },
}

/// Ordered chat history with at most one pending placeholder.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    pending: Option<usize>,
    events: Vec<TranscriptEvent>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, or resolves the pending placeholder with it.
    ///
    /// A resolved placeholder keeps its id and position so a display can
    /// swap the bubble in place.
    pub fn append(&mut self, message: ChatMessage) {
        match self.pending.take() {
            Some(index) => {
                let id = self.messages[index].id;
                let message = ChatMessage { id, ..message };
                self.messages[index] = message.clone();
                self.events.push(TranscriptEvent::Replaced { id, message });
            }
            None => {
                self.messages.push(message.clone());
                self.events.push(TranscriptEvent::Appended(message));
            }
        }
    }

    /// Appends a loading notice that the next message will replace.
    pub fn push_placeholder(&mut self, content: impl Into<String>) {
        self.append(ChatMessage::loading(content));
        self.pending = Some(self.messages.len() - 1);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Drains events produced since the last call.
    pub fn take_events(&mut self) -> Vec<TranscriptEvent> {
        std::mem::take(&mut self.events)
    }
}
