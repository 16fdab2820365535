//! Error types for the logcast gateway.

mod auth;
mod gateway;

pub use auth::AuthError;
pub use gateway::GatewayError;
