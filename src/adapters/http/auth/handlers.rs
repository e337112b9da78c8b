//! POST /api/auth/exchange-code

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::adapters::http::error::handle_session_error;
use crate::application::handlers::auth::{ExchangeCodeCommand, ExchangeCodeHandler};

#[derive(Clone)]
pub struct AuthHandlers {
    exchange_handler: Arc<ExchangeCodeHandler>,
}

impl AuthHandlers {
    pub fn new(exchange_handler: Arc<ExchangeCodeHandler>) -> Self {
        Self { exchange_handler }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeCodeRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExchangeCodeResponse {
    pub access_token: String,
}

/// POST /api/auth/exchange-code - Trade an OAuth code for an access token
pub async fn exchange_code(
    State(handlers): State<AuthHandlers>,
    Json(req): Json<ExchangeCodeRequest>,
) -> Response {
    match handlers
        .exchange_handler
        .handle(ExchangeCodeCommand { code: req.code })
        .await
    {
        Ok(token) => (
            StatusCode::OK,
            Json(ExchangeCodeResponse {
                access_token: token.expose().to_string(),
            }),
        )
            .into_response(),
        Err(e) => handle_session_error(e),
    }
}

pub fn auth_routes(handlers: AuthHandlers) -> Router {
    Router::new()
        .route("/exchange-code", post(exchange_code))
        .with_state(handlers)
}
