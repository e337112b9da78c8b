//! Static token exchanger for the demo form and tests.

use async_trait::async_trait;

use crate::domain::session::AccessToken;
use crate::ports::{TokenExchangeError, TokenExchanger};

/// Accepts any non-blank code and returns the same token every time.
#[derive(Debug, Clone)]
pub struct StaticTokenExchanger {
    token: String,
}

impl StaticTokenExchanger {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl Default for StaticTokenExchanger {
    fn default() -> Self {
        Self::new("demo-access-token")
    }
}

#[async_trait]
impl TokenExchanger for StaticTokenExchanger {
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, TokenExchangeError> {
        if code.trim().is_empty() {
            return Err(TokenExchangeError::EmptyCode);
        }
        Ok(AccessToken::new(self.token.clone()))
    }
}
