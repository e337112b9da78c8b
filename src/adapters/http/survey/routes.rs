//! HTTP routes for survey session endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{export_results, get_session, start_session, submit_answer, SurveyHandlers};

/// Creates the session router with all endpoints.
pub fn survey_routes(handlers: SurveyHandlers) -> Router {
    Router::new()
        .route("/", post(start_session))
        .route("/:id", get(get_session))
        .route("/:id/answers", post(submit_answer))
        .route("/:id/export", get(export_results))
        .with_state(handlers)
}
