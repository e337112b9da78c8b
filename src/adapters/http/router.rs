//! Application router: API routes plus the health check.

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use super::auth::{auth_routes, AuthHandlers};
use super::survey::{survey_routes, SurveyHandlers};

/// Builds the full API router. Cross-cutting layers are added by the binary.
pub fn api_router(survey: SurveyHandlers, auth: AuthHandlers) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/sessions", survey_routes(survey))
        .nest("/api/auth", auth_routes(auth))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
