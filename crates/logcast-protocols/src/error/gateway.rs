//! Gateway errors.

use thiserror::Error;

use super::AuthError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Failed to bind {target}: {message}")]
    Bind { target: String, message: String },

    #[error("Failed to attach to external host: {0}")]
    Attach(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("Invalid payload for {kind}: {message}")]
    InvalidPayload { kind: String, message: String },

    #[error("Connection closed")]
    Disconnected,

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn bind(target: impl Into<String>, message: impl ToString) -> Self {
        GatewayError::Bind {
            target: target.into(),
            message: message.to_string(),
        }
    }
}
