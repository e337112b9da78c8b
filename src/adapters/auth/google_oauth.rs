//! Google OAuth adapter - trades an authorization code for an access token.
//!
//! The browser completes the consent screen and posts the resulting code
//! to the backend; the client secret never leaves the server.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::session::AccessToken;
use crate::ports::{TokenExchangeError, TokenExchanger};

/// Configuration for the Google OAuth client.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    client_secret: Secret<String>,
    pub redirect_uri: String,
    /// Token endpoint (default: https://oauth2.googleapis.com/token).
    pub token_url: String,
    pub timeout: Duration,
}

impl GoogleOAuthConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret.into()),
            redirect_uri: redirect_uri.into(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// True when both client credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.expose_secret().trim().is_empty()
    }
}

/// Exchanges codes with Google's OAuth 2.0 token endpoint.
pub struct GoogleOAuthExchanger {
    config: GoogleOAuthConfig,
    client: Client,
}

impl GoogleOAuthExchanger {
    /// # Errors
    ///
    /// - `Upstream` if the HTTP client cannot be built
    pub fn new(config: GoogleOAuthConfig) -> Result<Self, TokenExchangeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TokenExchangeError::Upstream(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[async_trait]
impl TokenExchanger for GoogleOAuthExchanger {
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, TokenExchangeError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(TokenExchangeError::EmptyCode);
        }
        if !self.config.is_configured() {
            return Err(TokenExchangeError::NotConfigured);
        }

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret().as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| TokenExchangeError::Upstream(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TokenExchangeError::Upstream(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Authorization code exchange failed");
            return Err(map_token_error(status.as_u16(), &body));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| TokenExchangeError::Upstream(format!("unexpected token response: {}", e)))?;
        debug!(expires_in = ?token.expires_in, "Authorization code exchanged");
        Ok(AccessToken::new(token.access_token))
    }
}

/// Google answers bad codes with 400 `invalid_grant`; anything else is upstream trouble.
fn map_token_error(status: u16, body: &str) -> TokenExchangeError {
    let parsed = serde_json::from_str::<TokenErrorResponse>(body).ok();
    match (status, parsed) {
        (400 | 401, Some(err)) => TokenExchangeError::Rejected(
            err.error_description.unwrap_or(err.error),
        ),
        (400 | 401, None) => TokenExchangeError::Rejected(format!("HTTP {}", status)),
        (_, _) => TokenExchangeError::Upstream(format!("HTTP {}: {}", status, body)),
    }
}
