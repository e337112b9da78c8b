//! Conversation domain module.
//!
//! Question batches, the answer collector that walks them, the chat
//! transcript, and tolerant extraction of JSON from model output.

mod collector;
mod extractor;
mod transcript;
mod turn;

pub use collector::{Advance, AnswerCollector, CollectorError, CollectorState};
pub use extractor::{
    DataExtractor, ExtractionError, ResponseSanitizer, SanitizationError, MAX_FIELD_LENGTH,
    MAX_RESPONSE_LENGTH, QUESTIONS_KEY,
};
pub use transcript::{ChatMessage, ChatMessageKind, Transcript, TranscriptEvent};
pub use turn::ConversationTurn;
