//! HTTP extractors for axum.
//!
//! - `bearer` - form-service access token from the Authorization header

pub mod bearer;

pub use bearer::{BearerRejection, BearerToken};
