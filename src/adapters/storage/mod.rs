//! Storage adapters.
//!
//! - `InMemorySessionRepository` - live sessions, one lock per session
//! - `FileResultExporter` - final answer sets as JSON or YAML files

mod file_result_exporter;
mod in_memory_session_repository;

pub use file_result_exporter::{ExportFormat, FileResultExporter};
pub use in_memory_session_repository::InMemorySessionRepository;
