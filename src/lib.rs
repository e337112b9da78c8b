//! Survey Sherpa - Conversational survey filling
//!
//! This crate turns a web form into a chat: an LLM asks the form's questions
//! conversationally, then reconciles the free-text answers back into the
//! form's fields, repeating until every field has an answer.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
