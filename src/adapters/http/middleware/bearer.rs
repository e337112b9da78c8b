//! Bearer token extractor.
//!
//! Reads the form-service access token the browser obtained through the
//! OAuth exchange:
//!
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! The token is passed through to the form source; it is not validated here.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::ErrorResponse;
use crate::domain::session::AccessToken;

/// Extractor that requires a non-blank bearer token.
#[derive(Debug, Clone)]
pub struct BearerToken(pub AccessToken);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = BearerRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(BearerRejection::Missing)?
            .to_str()
            .map_err(|_| BearerRejection::Malformed)?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .ok_or(BearerRejection::Malformed)?;

        if token.is_empty() {
            return Err(BearerRejection::Missing);
        }
        Ok(BearerToken(AccessToken::new(token)))
    }
}

/// Rejection type for missing or unreadable tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerRejection {
    Missing,
    Malformed,
}

impl IntoResponse for BearerRejection {
    fn into_response(self) -> Response {
        let message = match self {
            BearerRejection::Missing => "Access token required",
            BearerRejection::Malformed => "Authorization header must be 'Bearer <token>'",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("UNAUTHORIZED", message)),
        )
            .into_response()
    }
}
