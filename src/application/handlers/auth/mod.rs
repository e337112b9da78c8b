//! Auth handlers.

mod exchange_code;

pub use exchange_code::{ExchangeCodeCommand, ExchangeCodeHandler};
