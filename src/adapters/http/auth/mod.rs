//! HTTP adapter for the OAuth code exchange.

mod handlers;

pub use handlers::{auth_routes, exchange_code, AuthHandlers, ExchangeCodeRequest, ExchangeCodeResponse};
