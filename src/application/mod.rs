//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer drives the survey loop through the ports. Commands start
//! sessions and submit answers; queries read snapshots and final results.

pub mod handlers;

pub use handlers::auth::{ExchangeCodeCommand, ExchangeCodeHandler};
pub use handlers::survey::{
    ExportResultsHandler, ExportResultsQuery, GetSessionHandler, GetSessionQuery,
    OrchestratorConfig, PromptTemplates, QuestionGenerator, Reconciler, StartSurveyCommand,
    StartSurveyHandler, SubmitAnswerCommand, SubmitAnswerHandler, SubmitAnswerResult,
    SurveyOrchestrator,
};
