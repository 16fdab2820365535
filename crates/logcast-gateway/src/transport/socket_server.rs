//! Real-time channel host.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use logcast_protocols::GatewayError;

use super::http_host::HttpHost;
use super::namespace::Namespace;

/// Path prefix claimed on an HTTP host.
pub const WS_PREFIX: &str = "ws";

/// Registry of namespaces served at `GET /ws/{namespace}`.
///
/// Applications that already run an axum server can create one, mount
/// [`SocketServer::router`] themselves and hand it to the gateway as an
/// external socket host.
#[derive(Default)]
pub struct SocketServer {
    namespaces: DashMap<String, Arc<Namespace>>,
    local_addr: RwLock<Option<SocketAddr>>,
}

impl SocketServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a socket server on top of a raw HTTP host.
    pub fn attach(host: &Arc<dyn HttpHost>) -> Result<Arc<Self>, GatewayError> {
        let server = Arc::new(Self::new());
        host.mount(WS_PREFIX, server.router())?;
        server.set_local_addr(host.local_addr());
        Ok(server)
    }

    /// Get or create the namespace called `name`. A namespace that was
    /// closed is replaced by a fresh one.
    pub fn of(&self, name: &str) -> Arc<Namespace> {
        let mut entry = self
            .namespaces
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Namespace::new(name)));
        if entry.is_closed() {
            *entry = Arc::new(Namespace::new(name));
        }
        entry.clone()
    }

    pub fn namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces.get(name).map(|ns| ns.value().clone())
    }

    /// Close and forget a namespace.
    pub fn remove(&self, name: &str) {
        if let Some((_, ns)) = self.namespaces.remove(name) {
            ns.close();
        }
    }

    /// Close `namespace` and forget it, unless it was already replaced.
    pub fn detach(&self, namespace: &Arc<Namespace>) {
        namespace.close();
        self.namespaces
            .remove_if(namespace.name(), |_, current| Arc::ptr_eq(current, namespace));
    }

    /// Close every namespace.
    pub fn close(&self) {
        for entry in self.namespaces.iter() {
            entry.value().close();
        }
        self.namespaces.clear();
    }

    /// Address of the HTTP server this host is reachable through, if known.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read()
    }

    pub fn set_local_addr(&self, addr: Option<SocketAddr>) {
        *self.local_addr.write() = addr;
    }

    /// The WebSocket upgrade route.
    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/ws/{namespace}", get(upgrade_handler))
            .with_state(self.clone())
    }
}

async fn upgrade_handler(
    ws: WebSocketUpgrade,
    Path(name): Path<String>,
    State(server): State<Arc<SocketServer>>,
) -> Response {
    match server.namespace(&name) {
        Some(ns) if !ns.is_closed() => ws.on_upgrade(move |socket| ns.serve_socket(socket)),
        _ => {
            debug!("Rejected upgrade for unknown namespace /{}", name);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_returns_same_namespace() {
        let server = SocketServer::new();
        let a = server.of("logcast");
        let b = server.of("logcast");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(server.namespace("other").is_none());
    }

    #[test]
    fn test_of_replaces_closed_namespace() {
        let server = SocketServer::new();
        let a = server.of("logcast");
        a.close();
        let b = server.of("logcast");
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!b.is_closed());
    }

    #[test]
    fn test_remove_closes_namespace() {
        let server = SocketServer::new();
        let ns = server.of("logcast");
        server.remove("logcast");
        assert!(ns.is_closed());
        assert!(server.namespace("logcast").is_none());
        server.remove("logcast");
    }

    #[test]
    fn test_detach_leaves_replacement_alone() {
        let server = SocketServer::new();
        let old = server.of("logcast");
        old.close();
        let fresh = server.of("logcast");

        server.detach(&old);
        let current = server.namespace("logcast").unwrap();
        assert!(Arc::ptr_eq(&current, &fresh));

        server.detach(&fresh);
        assert!(fresh.is_closed());
        assert!(server.namespace("logcast").is_none());
    }

    #[test]
    fn test_router_builds() {
        let server = Arc::new(SocketServer::new());
        let _router = server.router();
    }
}
