//! Transport hosting.
//!
//! The gateway can be reached through up to two channels at once:
//!
//! - a [`StandaloneChannel`] that owns its own listener, and
//! - an [`AttachedChannel`] living as a namespace on a host-supplied server.
//!
//! Both feed the same [`ConnectionHandler`], and [`TransportHost`] fans
//! broadcasts out over whichever of them are active.

mod attached;
mod connection;
mod http_host;
mod namespace;
mod socket_server;
mod standalone;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info};

use logcast_protocols::Envelope;

use crate::LOG_SRC;

pub use attached::{AttachedChannel, ExternalHost};
pub use connection::{Connection, ConnectionId};
pub use http_host::{HttpHost, SharedHttpServer};
pub use namespace::{ConnectionHandler, Namespace};
pub use socket_server::{SocketServer, WS_PREFIX};
pub use standalone::StandaloneChannel;

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// Hosting mode of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Standalone,
    Attached,
}

/// A live real-time channel.
pub trait Channel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// The namespace carrying the gateway's connections.
    fn namespace(&self) -> &Arc<Namespace>;

    /// Address viewers reach this channel on, if known.
    fn local_addr(&self) -> Option<SocketAddr>;

    /// Release the channel. Must be idempotent.
    fn close(&self);

    fn broadcast_to_room(&self, room: &str, frame: &str) -> usize {
        self.namespace().broadcast_to_room(room, frame)
    }
}

/// Owner of the gateway's zero, one or two channels.
pub struct TransportHost {
    handler: Arc<dyn ConnectionHandler>,
    channels: RwLock<Vec<Arc<dyn Channel>>>,
}

impl TransportHost {
    pub fn new(handler: Arc<dyn ConnectionHandler>) -> Self {
        Self {
            handler,
            channels: RwLock::new(Vec::new()),
        }
    }

    /// Start the standalone channel. `None` means no standalone channel.
    ///
    /// Bind failures are logged and leave the channel unavailable; they are
    /// never returned to the caller.
    pub async fn start_standalone(&self, bind: IpAddr, port: Option<u16>) -> bool {
        let Some(port) = port else {
            debug!("No port configured, standalone log server disabled");
            return false;
        };

        match StandaloneChannel::bind(bind, port, self.handler.clone()).await {
            Ok(channel) => {
                if let Some(addr) = channel.local_addr() {
                    info!(src = LOG_SRC, "Server logs available on port {}", addr.port());
                }
                self.add_channel(Arc::new(channel));
                true
            }
            Err(e) => {
                error!(
                    src = LOG_SRC,
                    error = %e,
                    "Error initialising standalone server logs on port {}",
                    port
                );
                false
            }
        }
    }

    /// Attach a namespace to an external host.
    ///
    /// Like [`start_standalone`](Self::start_standalone), failure is logged
    /// and leaves the channel unavailable.
    pub fn attach_to_external_host(&self, host: ExternalHost) -> bool {
        match AttachedChannel::attach(host, self.handler.clone()) {
            Ok(channel) => {
                match channel.local_addr() {
                    Some(addr) => info!(
                        src = LOG_SRC,
                        "Server logs available through main HTTP server on port {}",
                        addr.port()
                    ),
                    None => info!(src = LOG_SRC, "Server logs attached to main HTTP server"),
                }
                self.add_channel(Arc::new(channel));
                true
            }
            Err(e) => {
                error!(src = LOG_SRC, error = %e, "Error initialising log server adaptor");
                false
            }
        }
    }

    fn add_channel(&self, channel: Arc<dyn Channel>) {
        self.channels.write().push(channel);
    }

    /// Send `envelope` to every member of `room` on every active channel.
    /// Returns the number of connections reached.
    pub fn broadcast_to_room(&self, room: &str, envelope: &Envelope) -> usize {
        let channels = self.channels.read();
        if channels.is_empty() {
            return 0;
        }

        let frame = match envelope.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                error!(src = LOG_SRC, error = %e, "Failed to encode {} broadcast", envelope.kind);
                return 0;
            }
        };

        channels
            .iter()
            .map(|channel| channel.broadcast_to_room(room, &frame))
            .sum()
    }

    /// Close every channel. Safe to call repeatedly.
    pub fn stop(&self) {
        let channels: Vec<_> = self.channels.write().drain(..).collect();
        for channel in channels {
            channel.close();
            debug!("{:?} channel closed", channel.kind());
        }
    }

    pub fn is_active(&self) -> bool {
        !self.channels.read().is_empty()
    }

    pub fn active_kinds(&self) -> Vec<ChannelKind> {
        self.channels.read().iter().map(|c| c.kind()).collect()
    }

    /// Address of the standalone listener, when it is running.
    pub fn standalone_addr(&self) -> Option<SocketAddr> {
        self.channels
            .read()
            .iter()
            .find(|c| c.kind() == ChannelKind::Standalone)
            .and_then(|c| c.local_addr())
    }

    pub fn connection_count(&self) -> usize {
        self.channels
            .read()
            .iter()
            .map(|c| c.namespace().connection_count())
            .sum()
    }
}
