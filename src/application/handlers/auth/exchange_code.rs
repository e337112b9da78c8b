//! ExchangeCodeHandler - trades an OAuth authorization code for a token.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::session::{AccessToken, SessionError};
use crate::ports::{TokenExchangeError, TokenExchanger};

#[derive(Debug, Clone)]
pub struct ExchangeCodeCommand {
    pub code: String,
}

pub struct ExchangeCodeHandler {
    exchanger: Arc<dyn TokenExchanger>,
}

impl ExchangeCodeHandler {
    pub fn new(exchanger: Arc<dyn TokenExchanger>) -> Self {
        Self { exchanger }
    }

    pub async fn handle(&self, cmd: ExchangeCodeCommand) -> Result<AccessToken, SessionError> {
        let code = cmd.code.trim();
        if code.is_empty() {
            return Err(SessionError::validation("code", "must not be empty"));
        }

        match self.exchanger.exchange_code(code).await {
            Ok(token) => {
                info!("Authorization code exchanged");
                Ok(token)
            }
            Err(err) => {
                warn!(error = %err, "Authorization code exchange failed");
                Err(match err {
                    TokenExchangeError::EmptyCode => SessionError::validation("code", "must not be empty"),
                    TokenExchangeError::Rejected(_) => SessionError::unauthorized(),
                    TokenExchangeError::NotConfigured | TokenExchangeError::Upstream(_) => {
                        SessionError::infrastructure(err.to_string())
                    }
                })
            }
        }
    }
}
