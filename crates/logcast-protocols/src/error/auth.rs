//! Authentication errors.

use thiserror::Error;

/// Outcome of a login attempt that did not grant access.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The predicate evaluated the credentials and said no.
    #[error("Credentials rejected")]
    Rejected,

    /// The login payload could not be decoded.
    #[error("Invalid credentials payload: {0}")]
    InvalidPayload(String),

    /// The predicate itself failed.
    #[error("Authenticator failed: {0}")]
    Failed(String),
}

impl AuthError {
    /// Short reason code placed in `LOGIN_RESPONSE.error`.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::Rejected => "AUTH_FAILED",
            AuthError::InvalidPayload(_) => "INVALID_CREDENTIALS",
            AuthError::Failed(_) => "AUTH_ERROR",
        }
    }
}
