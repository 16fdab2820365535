//! # Logcast Protocols
//!
//! Wire types and collaborator traits for the logcast gateway.
//! Contains only interface definitions and the envelope codec - no transports.
//!
//! ## Core Traits
//!
//! - [`Hub`] - Upstream record source with a backlog snapshot
//! - [`FilterStore`] - Server-side log filter configuration
//! - [`Authenticator`] - Credential predicate consulted on login

pub mod auth;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod hub;
pub mod record;

pub use auth::{async_authenticator_fn, authenticator_fn, Authenticator, Credentials};
pub use envelope::{
    Envelope, LoginRequiredData, LoginResponseData, MessageType, ResultCode, ServerFilterData,
};
pub use error::{AuthError, GatewayError};
pub use filter::FilterStore;
pub use hub::Hub;
pub use record::{LogLevel, Record};
