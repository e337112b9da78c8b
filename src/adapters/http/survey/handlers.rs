//! HTTP handlers for survey session endpoints.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::{handle_session_error, ErrorResponse};
use crate::adapters::http::middleware::BearerToken;
use crate::application::handlers::survey::{
    ExportResultsHandler, ExportResultsQuery, GetSessionHandler, GetSessionQuery,
    StartSurveyCommand, StartSurveyHandler, SubmitAnswerCommand, SubmitAnswerHandler,
};
use crate::domain::foundation::{ErrorCode, SessionId};
use crate::domain::session::{AnswerOutcome, AnswerRejection, SessionError};

use super::dto::{SessionResponse, StartSurveyRequest, SubmitAnswerRequest};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SurveyHandlers {
    start_handler: Arc<StartSurveyHandler>,
    submit_handler: Arc<SubmitAnswerHandler>,
    get_handler: Arc<GetSessionHandler>,
    export_handler: Arc<ExportResultsHandler>,
}

impl SurveyHandlers {
    pub fn new(
        start_handler: Arc<StartSurveyHandler>,
        submit_handler: Arc<SubmitAnswerHandler>,
        get_handler: Arc<GetSessionHandler>,
        export_handler: Arc<ExportResultsHandler>,
    ) -> Self {
        Self {
            start_handler,
            submit_handler,
            get_handler,
            export_handler,
        }
    }
}

/// Runs a command on its own task so a dropped connection cannot cancel a
/// session step halfway through.
async fn detached<T, F>(work: F) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| SessionError::infrastructure(format!("session task aborted: {}", e)))?
}

fn parse_session_id(raw: &str) -> Result<SessionId, Response> {
    raw.parse::<SessionId>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("Invalid session ID")),
        )
            .into_response()
    })
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/sessions - Start a session for a form
pub async fn start_session(
    State(handlers): State<SurveyHandlers>,
    BearerToken(access_token): BearerToken,
    Json(req): Json<StartSurveyRequest>,
) -> Response {
    let cmd = StartSurveyCommand {
        form_link: req.form_link,
        consent: req.consent,
        access_token,
    };

    let handler = handlers.start_handler.clone();
    match detached(async move { handler.handle(cmd).await }).await {
        Ok(session) => (StatusCode::CREATED, Json(SessionResponse::from(&session))).into_response(),
        Err(e) => handle_session_error(e),
    }
}

/// GET /api/sessions/:id - Current session view
pub async fn get_session(
    State(handlers): State<SurveyHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.get_handler.handle(GetSessionQuery { session_id }).await {
        Ok(session) => (StatusCode::OK, Json(SessionResponse::from(&session))).into_response(),
        Err(e) => handle_session_error(e),
    }
}

/// POST /api/sessions/:id/answers - Answer the current question
///
/// Rejected answers return the unchanged session under `details`: 422 for a
/// blank answer, 409 for an index that is not the current question.
pub async fn submit_answer(
    State(handlers): State<SurveyHandlers>,
    Path(session_id): Path<String>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = SubmitAnswerCommand {
        session_id,
        turn_index: req.turn_index,
        answer: req.answer,
    };

    let handler = handlers.submit_handler.clone();
    let result = match detached(async move { handler.handle(cmd).await }).await {
        Ok(result) => result,
        Err(e) => return handle_session_error(e),
    };

    let view = SessionResponse::from(&result.session);
    let rejection = match result.outcome {
        AnswerOutcome::NextQuestion(_) | AnswerOutcome::BatchComplete => {
            return (StatusCode::OK, Json(view)).into_response();
        }
        AnswerOutcome::Rejected(rejection) => rejection,
    };

    let (status, error) = match rejection {
        AnswerRejection::EmptyAnswer => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorResponse::new(ErrorCode::EmptyAnswer, "Please enter an answer"),
        ),
        AnswerRejection::Stale { submitted, awaiting } => (
            StatusCode::CONFLICT,
            ErrorResponse::new(
                ErrorCode::StaleSubmission,
                match awaiting {
                    Some(current) => format!(
                        "Question {} is not awaiting an answer; the current question is {}",
                        submitted, current
                    ),
                    None => format!("Question {} is not awaiting an answer", submitted),
                },
            ),
        ),
    };

    match serde_json::to_value(&view) {
        Ok(details) => (status, Json(error.with_details(details))).into_response(),
        Err(_) => (status, Json(error)).into_response(),
    }
}

/// GET /api/sessions/:id/export - Download the completed answer set
pub async fn export_results(
    State(handlers): State<SurveyHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let answer_set = match handlers.export_handler.handle(ExportResultsQuery { session_id }).await {
        Ok(answer_set) => answer_set,
        Err(e) => return handle_session_error(e),
    };

    match answer_set.to_json_document() {
        Ok(document) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"survey-responses.json\"",
                ),
            ],
            document,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::internal(format!("Could not render answers: {}", e))),
        )
            .into_response(),
    }
}
