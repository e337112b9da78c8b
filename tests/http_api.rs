//! HTTP API tests against the assembled router.
//!
//! Uses the demo form, a static token exchanger and a scripted model, so no
//! network access is needed.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use survey_sherpa::adapters::ai::MockAIProvider;
use survey_sherpa::adapters::auth::StaticTokenExchanger;
use survey_sherpa::adapters::forms::DemoFormSource;
use survey_sherpa::adapters::http::{api_router, AuthHandlers, SurveyHandlers};
use survey_sherpa::adapters::storage::{ExportFormat, FileResultExporter, InMemorySessionRepository};
use survey_sherpa::adapters::transcript::TracingTranscriptSink;
use survey_sherpa::application::{
    ExchangeCodeHandler, ExportResultsHandler, GetSessionHandler, OrchestratorConfig,
    PromptTemplates, QuestionGenerator, Reconciler, StartSurveyHandler, SubmitAnswerHandler,
    SurveyOrchestrator,
};
use survey_sherpa::ports::{AIProvider, RequestPurpose};

// =============================================================================
// Test Infrastructure
// =============================================================================

const FORM_LINK: &str = "https://docs.google.com/forms/d/demo-form/viewform";

fn app(provider: MockAIProvider) -> (Router, TempDir) {
    let ai: Arc<dyn AIProvider> = Arc::new(provider);
    let templates = Arc::new(PromptTemplates::default());
    let exports = tempfile::tempdir().unwrap();
    let orchestrator = Arc::new(SurveyOrchestrator::new(
        QuestionGenerator::new(ai.clone(), templates.clone(), 5, 4000),
        Reconciler::new(ai, templates, 4000),
        Arc::new(TracingTranscriptSink::new()),
        Arc::new(FileResultExporter::new(exports.path(), ExportFormat::Json)),
        OrchestratorConfig {
            llm_timeout: Duration::from_secs(5),
            ..OrchestratorConfig::default()
        },
    ));
    let repository = Arc::new(InMemorySessionRepository::new());

    let survey = SurveyHandlers::new(
        Arc::new(StartSurveyHandler::new(
            Arc::new(DemoFormSource::new()),
            repository.clone(),
            orchestrator.clone(),
        )),
        Arc::new(SubmitAnswerHandler::new(repository.clone(), orchestrator)),
        Arc::new(GetSessionHandler::new(repository.clone())),
        Arc::new(ExportResultsHandler::new(repository)),
    );
    let auth = AuthHandlers::new(Arc::new(ExchangeCodeHandler::new(Arc::new(
        StaticTokenExchanger::new("demo-access-token"),
    ))));

    (api_router(survey, auth), exports)
}

fn scripted() -> MockAIProvider {
    MockAIProvider::new().with_response_for(
        RequestPurpose::QuestionGeneration,
        json!({
            "questions": [
                {"fieldId": "q1", "question": "What's your full name?"},
                {"fieldId": "q2", "question": "Which email can we reach you at?"}
            ]
        })
        .to_string(),
    )
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn start(router: &Router) -> Value {
    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/api/sessions",
            json!({"form_link": FORM_LINK, "consent": true}),
            Some("demo-access-token"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

// =============================================================================
// Health and auth
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let (router, _exports) = app(MockAIProvider::new());
    let (status, body) = send(&router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "survey-sherpa");
}

#[tokio::test]
async fn exchange_code_returns_token() {
    let (router, _exports) = app(MockAIProvider::new());
    let (status, body) = send(
        &router,
        json_request("POST", "/api/auth/exchange-code", json!({"code": "4/abc"}), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_token"], "demo-access-token");
}

#[tokio::test]
async fn exchange_code_rejects_blank_code() {
    let (router, _exports) = app(MockAIProvider::new());
    let (status, _) = send(
        &router,
        json_request("POST", "/api/auth/exchange-code", json!({"code": "  "}), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn start_requires_bearer_token() {
    let (router, _exports) = app(scripted());
    let (status, body) = send(
        &router,
        json_request("POST", "/api/sessions", json!({"form_link": FORM_LINK, "consent": true}), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn start_requires_consent() {
    let (router, _exports) = app(scripted());
    let (status, _) = send(
        &router,
        json_request("POST", "/api/sessions", json!({"form_link": FORM_LINK}), Some("demo-access-token")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn start_asks_the_first_question() {
    let (router, _exports) = app(scripted());
    let body = start(&router).await;

    assert_eq!(body["state"]["status"], "collecting_answers");
    assert_eq!(body["iteration"], 1);
    assert_eq!(body["survey_title"], "Customer Feedback Survey");
    assert_eq!(body["current_question"]["turn_index"], 0);
    assert_eq!(body["current_question"]["batch_len"], 2);
    assert_eq!(body["current_question"]["question"], "What's your full name?");
}

#[tokio::test]
async fn answers_advance_and_blank_answers_are_rejected() {
    let (router, _exports) = app(scripted());
    let session = start(&router).await;
    let id = session["session_id"].as_str().unwrap();
    let answers_uri = format!("/api/sessions/{}/answers", id);

    let (status, body) = send(
        &router,
        json_request("POST", &answers_uri, json!({"turn_index": 0, "answer": " "}), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "EMPTY_ANSWER");

    let (status, body) = send(
        &router,
        json_request("POST", &answers_uri, json!({"turn_index": 1, "answer": "early"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "STALE_SUBMISSION");

    let (status, body) = send(
        &router,
        json_request("POST", &answers_uri, json!({"turn_index": 0, "answer": "Ada Lovelace"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_question"]["turn_index"], 1);

    let (status, view) = send(&router, get(&format!("/api/sessions/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["current_question"]["turn_index"], 1);
}

#[tokio::test]
async fn export_before_completion_conflicts() {
    let (router, _exports) = app(scripted());
    let session = start(&router).await;
    let id = session["session_id"].as_str().unwrap();

    let (status, _) = send(&router, get(&format!("/api/sessions/{}/export", id))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let (router, _exports) = app(scripted());

    let (status, _) = send(&router, get("/api/sessions/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &router,
        get("/api/sessions/00000000-0000-4000-8000-000000000000"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SESSION_NOT_FOUND");
}
