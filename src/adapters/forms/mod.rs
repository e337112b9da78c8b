//! Form source adapters.
//!
//! - `GoogleFormsSource` - Google Forms REST API
//! - `DemoFormSource` - built-in "Customer Feedback Survey" for local runs

mod demo_form;
mod google_forms;

pub use demo_form::DemoFormSource;
pub use google_forms::{GoogleFormsConfig, GoogleFormsSource};
