//! Transcript sink adapters.
//!
//! - `TracingTranscriptSink` - logs every transcript event (default sink)
//! - `RecordingTranscriptSink` - keeps events in memory for tests and polling

mod recording_sink;
mod tracing_sink;

pub use recording_sink::RecordingTranscriptSink;
pub use tracing_sink::TracingTranscriptSink;
