//! HTTP adapters - REST API implementations.
//!
//! - `survey` - session start, answers, view and export
//! - `auth` - OAuth authorization code exchange
//! - `middleware` - bearer token extractor

pub mod auth;
mod error;
pub mod middleware;
mod router;
pub mod survey;

pub use auth::AuthHandlers;
pub use error::{handle_session_error, session_error_status, ErrorResponse};
pub use router::{api_router, health};
pub use survey::SurveyHandlers;
