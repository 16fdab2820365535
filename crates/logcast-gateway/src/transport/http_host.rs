//! Raw HTTP hosts the gateway can attach to.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use dashmap::DashMap;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use tracing::{error, info};

use logcast_protocols::GatewayError;

/// An already-listening HTTP server that accepts extra routes at runtime.
pub trait HttpHost: Send + Sync {
    /// Serve `router` for every request whose first path segment is `prefix`.
    fn mount(&self, prefix: &str, router: Router) -> Result<(), GatewayError>;

    /// Remove a previously mounted prefix.
    fn unmount(&self, prefix: &str);

    /// Address the host is listening on.
    fn local_addr(&self) -> Option<SocketAddr>;
}

type Mounts = Arc<DashMap<String, Router>>;

/// An axum server whose unmatched requests are forwarded to mounted routers.
pub struct SharedHttpServer {
    mounts: Mounts,
    local_addr: SocketAddr,
    shutdown: CancellationToken,
}

impl SharedHttpServer {
    /// Bind `addr` and serve `app`, with mounted routers as fallback.
    pub async fn bind(addr: SocketAddr, app: Router) -> Result<Arc<Self>, GatewayError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::bind(addr.to_string(), e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::bind(addr.to_string(), e))?;

        let mounts: Mounts = Arc::new(DashMap::new());
        let fallback_mounts = mounts.clone();
        let app = app.fallback(move |req: Request| dispatch(fallback_mounts.clone(), req));

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        tokio::spawn(async move {
            let server = axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await });
            if let Err(e) = server.await {
                error!("HTTP host error: {}", e);
            }
        });

        info!("HTTP host listening on {}", local_addr);
        Ok(Arc::new(Self {
            mounts,
            local_addr,
            shutdown,
        }))
    }

    /// Stop accepting connections.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn mounted(&self) -> Vec<String> {
        self.mounts.iter().map(|e| e.key().clone()).collect()
    }
}

impl HttpHost for SharedHttpServer {
    fn mount(&self, prefix: &str, router: Router) -> Result<(), GatewayError> {
        let prefix = prefix.trim_matches('/').to_string();
        if self.mounts.contains_key(&prefix) {
            return Err(GatewayError::Attach(format!(
                "prefix /{} is already mounted",
                prefix
            )));
        }
        self.mounts.insert(prefix, router);
        Ok(())
    }

    fn unmount(&self, prefix: &str) {
        self.mounts.remove(prefix.trim_matches('/'));
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.local_addr)
    }
}

fn first_segment(path: &str) -> &str {
    path.trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
}

async fn dispatch(mounts: Mounts, req: Request) -> Response {
    let router = mounts
        .get(first_segment(req.uri().path()))
        .map(|r| r.value().clone());
    match router {
        Some(router) => match router.oneshot(req).await {
            Ok(response) => response,
            Err(never) => match never {},
        },
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
