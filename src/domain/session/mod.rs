//! Session domain module.
//!
//! A `SurveySession` drives one form through repeated rounds of question
//! generation, answer collection and reconciliation:
//!
//! ```text
//! Initializing -> GeneratingQuestions -> CollectingAnswers -> Reconciling
//!                        ^                                        |
//!                        +------------ incomplete ----------------+
//!                                                                 |
//!                                      Completed <---- filled ----+
//! ```
//!
//! Any waiting state may end in `Failed(reason)`.

mod aggregate;
mod context;
mod errors;
pub mod notices;
mod state;

pub use aggregate::{
    AnswerOutcome, AnswerRejection, CurrentQuestion, ReconcileStep, SurveySession,
};
pub use context::{AccessToken, SessionContext};
pub use errors::SessionError;
pub use state::{FailureReason, SessionState};
