//! Channel living on a host-supplied server.

use std::net::SocketAddr;
use std::sync::Arc;

use logcast_protocols::GatewayError;

use super::http_host::HttpHost;
use super::namespace::{ConnectionHandler, Namespace};
use super::socket_server::{SocketServer, WS_PREFIX};
use super::{Channel, ChannelKind};
use crate::WS_NAMESPACE;

/// A host the gateway can attach to instead of owning a listener.
#[derive(Clone)]
pub enum ExternalHost {
    /// An initialized real-time channel host.
    Socket(Arc<SocketServer>),
    /// A raw HTTP host; a [`SocketServer`] is created and mounted on it.
    Http(Arc<dyn HttpHost>),
}

impl ExternalHost {
    /// Normalize to a real-time channel host, also handing back the HTTP
    /// host when a server had to be mounted on it.
    fn resolve(self) -> Result<(Arc<SocketServer>, Option<Arc<dyn HttpHost>>), GatewayError> {
        match self {
            ExternalHost::Socket(server) => Ok((server, None)),
            ExternalHost::Http(host) => Ok((SocketServer::attach(&host)?, Some(host))),
        }
    }
}

/// The gateway namespace on an external socket host.
pub struct AttachedChannel {
    server: Arc<SocketServer>,
    namespace: Arc<Namespace>,
    /// Set when this channel mounted `server` itself and owns the mount.
    mounted_on: Option<Arc<dyn HttpHost>>,
}

impl AttachedChannel {
    pub fn attach(
        host: ExternalHost,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<Self, GatewayError> {
        let (server, mounted_on) = host.resolve()?;
        let namespace = server.of(WS_NAMESPACE);
        namespace.on_connection(handler);
        Ok(Self {
            server,
            namespace,
            mounted_on,
        })
    }
}

impl Channel for AttachedChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Attached
    }

    fn namespace(&self) -> &Arc<Namespace> {
        &self.namespace
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr()
    }

    /// Detach from the host. The host itself keeps running, minus the
    /// socket route when this channel mounted it.
    fn close(&self) {
        self.server.detach(&self.namespace);
        if let Some(host) = &self.mounted_on {
            host.unmount(WS_PREFIX);
        }
    }
}
