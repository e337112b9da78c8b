//! SessionContext - everything a session needs from the outside world,
//! passed in explicitly at construction.

use secrecy::{ExposeSecret, Secret};
use std::fmt;

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::survey::FormReference;

/// Opaque bearer credential for the form service.
#[derive(Clone)]
pub struct AccessToken(Secret<String>);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Secret::new(token.into()))
    }

    /// Exposes the raw token for an outgoing request header.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_blank(&self) -> bool {
        self.0.expose_secret().trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Per-session identity, target form and credential.
#[derive(Debug, Clone)]
pub struct SessionContext {
    session_id: SessionId,
    form: FormReference,
    access_token: AccessToken,
    started_at: Timestamp,
}

impl SessionContext {
    pub fn new(form: FormReference, access_token: AccessToken) -> Self {
        Self {
            session_id: SessionId::new(),
            form,
            access_token,
            started_at: Timestamp::now(),
        }
    }

    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn form(&self) -> &FormReference {
        &self.form
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }
}
