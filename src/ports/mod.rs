//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the survey loop and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - prompt text in, raw model text out
//! - `FormSource` - loads a form as a `Schema`
//! - `TokenExchanger` - OAuth authorization code exchange
//! - `SessionRepository` - live session storage
//! - `TranscriptSink` - ordered transcript delivery
//! - `ResultExporter` - persists the final answer set

mod ai_provider;
mod form_source;
mod result_exporter;
mod session_repository;
mod token_exchanger;
mod transcript_sink;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, RequestPurpose, TokenUsage,
};
pub use form_source::{FormSource, FormSourceError};
pub use result_exporter::{ExportError, ResultExporter};
pub use session_repository::{RepositoryError, SessionRepository, SharedSession};
pub use token_exchanger::{TokenExchangeError, TokenExchanger};
pub use transcript_sink::TranscriptSink;
