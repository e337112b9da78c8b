//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the survey loop to external systems:
//! - `ai` - LLM providers (Anthropic, OpenAI-compatible, mock)
//! - `forms` - form sources (Google Forms, built-in demo form)
//! - `auth` - OAuth code exchange
//! - `storage` - session repository and result export
//! - `transcript` - transcript delivery
//! - `http` - axum REST API

pub mod ai;
pub mod auth;
pub mod forms;
pub mod http;
pub mod storage;
pub mod transcript;
