//! OAuth adapters.
//!
//! Implementations of the `TokenExchanger` port:
//!
//! - `GoogleOAuthExchanger` - authorization code exchange against Google's token endpoint
//! - `StaticTokenExchanger` - hands out a fixed token, for the demo form and tests

mod google_oauth;
mod mock;

pub use google_oauth::{GoogleOAuthConfig, GoogleOAuthExchanger};
pub use mock::StaticTokenExchanger;
