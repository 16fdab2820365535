//! # Logcast Gateway
//!
//! Real-time log broadcast over WebSocket.
//!
//! Records handed to [`LogGateway::process`] are buffered and broadcast in
//! throttled `RECORDS` frames to every viewer in the `authenticated` room.
//! Viewers connect at `/ws/logcast`, either on the gateway's own listener,
//! on a host application's server, or both at once.
//!
//! ```text
//!  pipeline ──process──▶ BroadcastBuffer ──Throttle──▶ TransportHost ──▶ viewers
//!                                                        │
//!  viewers ──frames──▶ Namespace ──▶ MessageRouter ──▶ ConnectionGate / Hub / FilterStore
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use logcast_gateway::{GatewayConfig, LogGateway, MemoryFilterStore, RecordHub};
//!
//! let hub = Arc::new(RecordHub::default());
//! let gateway = Arc::new(LogGateway::new(
//!     GatewayConfig::default(),
//!     hub.clone(),
//!     Arc::new(MemoryFilterStore::default()),
//! ));
//! gateway.init().await;
//! gateway.attach_to_hub(&hub);
//! ```

pub mod buffer;
pub mod config;
pub mod credentials;
pub mod filters;
pub mod gate;
pub mod gateway;
pub mod hub;
pub mod router;
pub mod throttle;
pub mod transport;

pub use buffer::BroadcastBuffer;
pub use config::{GatewayConfig, DEFAULT_PORT, DEFAULT_THROTTLE};
pub use credentials::StaticCredentials;
pub use filters::{MemoryFilterStore, DEFAULT_FILTER};
pub use gate::{ConnectionGate, LoginOutcome};
pub use gateway::LogGateway;
pub use hub::{RecordHub, DEFAULT_BACKLOG};
pub use router::{FollowUps, MessageRouter, Routed};
pub use throttle::Throttle;
pub use transport::{
    AttachedChannel, Channel, ChannelKind, Connection, ConnectionHandler, ExternalHost, HttpHost,
    Namespace, SharedHttpServer, SocketServer, StandaloneChannel, TransportHost,
};

/// Namespace viewers connect to.
pub const WS_NAMESPACE: &str = "logcast";

/// Room that receives broadcasts.
pub const AUTH_ROOM: &str = "authenticated";

/// Source tag for the gateway's own log lines.
pub const LOG_SRC: &str = "logcast";
