//! Token exchanger port - trades an OAuth authorization code for an access
//! token the form source accepts.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::session::AccessToken;

/// Errors from the authorization code exchange.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenExchangeError {
    #[error("authorization code is empty")]
    EmptyCode,

    #[error("authorization code was rejected: {0}")]
    Rejected(String),

    #[error("OAuth client is not configured")]
    NotConfigured,

    #[error("token endpoint error: {0}")]
    Upstream(String),
}

/// Exchanges authorization codes for bearer tokens.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, TokenExchangeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_exchanger_is_object_safe() {
        fn _accepts_dyn(_exchanger: &dyn TokenExchanger) {}
    }
}
