//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `survey` - Form schema, fields, reconciliation outcomes and results
//! - `conversation` - Question batches, answer collection, transcript, extraction
//! - `session` - The survey session state machine

pub mod conversation;
pub mod foundation;
pub mod session;
pub mod survey;
