//! Channel that owns its listener.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{response::Json, routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use logcast_protocols::GatewayError;

use super::namespace::{ConnectionHandler, Namespace};
use super::socket_server::SocketServer;
use super::{Channel, ChannelKind};
use crate::WS_NAMESPACE;

/// A dedicated HTTP/WebSocket listener for viewers.
pub struct StandaloneChannel {
    server: Arc<SocketServer>,
    namespace: Arc<Namespace>,
    local_addr: SocketAddr,
    shutdown: CancellationToken,
}

impl StandaloneChannel {
    /// Bind `bind:port` and start serving. Port 0 picks an ephemeral port.
    pub async fn bind(
        bind: IpAddr,
        port: u16,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<Self, GatewayError> {
        let addr = SocketAddr::new(bind, port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::bind(addr.to_string(), e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::bind(addr.to_string(), e))?;

        let server = Arc::new(SocketServer::new());
        server.set_local_addr(Some(local_addr));
        let namespace = server.of(WS_NAMESPACE);
        namespace.on_connection(handler);

        let router = create_router(&server, namespace.clone());
        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move { signal.cancelled().await });
            if let Err(e) = serve.await {
                error!("Standalone log server error: {}", e);
            }
        });

        Ok(Self {
            server,
            namespace,
            local_addr,
            shutdown,
        })
    }
}

impl Channel for StandaloneChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Standalone
    }

    fn namespace(&self) -> &Arc<Namespace> {
        &self.namespace
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.local_addr)
    }

    fn close(&self) {
        self.server.close();
        self.shutdown.cancel();
    }
}

fn create_router(server: &Arc<SocketServer>, namespace: Arc<Namespace>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    server
        .router()
        .route(
            "/health",
            get(move || {
                let namespace = namespace.clone();
                async move {
                    Json(serde_json::json!({
                        "status": if namespace.is_closed() { "closed" } else { "ok" },
                        "namespace": namespace.name(),
                        "connections": namespace.connection_count(),
                    }))
                }
            }),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
