//! Namespaced connection registry.
//!
//! A namespace multiplexes the viewer connections of one logical endpoint.
//! Both hosting modes end up here, so everything above the transport is
//! written once against [`ConnectionHandler`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::connection::{Connection, ConnectionId};

/// Callbacks invoked for every connection of a namespace.
#[async_trait]
pub trait ConnectionHandler: Send + Sync {
    /// A client connected.
    fn on_connect(&self, connection: &Arc<Connection>);

    /// A text frame arrived. Frames of one connection are delivered one at
    /// a time, in order.
    async fn on_message(&self, connection: &Arc<Connection>, text: &str);

    /// The client went away.
    fn on_disconnect(&self, _connection: &Arc<Connection>) {}
}

/// A named set of connections with room-scoped broadcast.
pub struct Namespace {
    name: String,
    connections: DashMap<ConnectionId, Arc<Connection>>,
    handler: RwLock<Option<Arc<dyn ConnectionHandler>>>,
    closed: AtomicBool,
    shutdown: CancellationToken,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connections: DashMap::new(),
            handler: RwLock::new(None),
            closed: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Route new connections to `handler`.
    pub fn on_connection(&self, handler: Arc<dyn ConnectionHandler>) {
        *self.handler.write() = Some(handler);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn handler(&self) -> Option<Arc<dyn ConnectionHandler>> {
        self.handler.read().clone()
    }

    /// Add a connection and run the connect callback.
    pub fn register(&self, connection: Arc<Connection>) {
        self.connections
            .insert(connection.id().to_string(), connection.clone());
        if let Some(handler) = self.handler() {
            handler.on_connect(&connection);
        }
    }

    /// Remove a connection and run the disconnect callback.
    pub fn unregister(&self, id: &str) {
        if let Some((_, connection)) = self.connections.remove(id) {
            if let Some(handler) = self.handler() {
                handler.on_disconnect(&connection);
            }
        }
    }

    /// Hand an inbound text frame to the handler.
    pub async fn dispatch(&self, connection: &Arc<Connection>, text: &str) {
        match self.handler() {
            Some(handler) => handler.on_message(connection, text).await,
            None => debug!("No handler on namespace {}, dropping frame", self.name),
        }
    }

    /// Queue `frame` on every connection that is a member of `room`.
    /// Returns the number of connections reached.
    pub fn broadcast_to_room(&self, room: &str, frame: &str) -> usize {
        if self.is_closed() {
            return 0;
        }

        let mut sent = 0;
        for entry in self.connections.iter() {
            let connection = entry.value();
            if connection.in_room(room) && connection.send_frame(frame.to_string()).is_ok() {
                sent += 1;
            }
        }
        sent
    }

    /// Disconnect every client and stop accepting new ones. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.cancel();
        self.connections.clear();
        *self.handler.write() = None;
        debug!("Namespace {} closed", self.name);
    }

    /// Drive one WebSocket until either side hangs up.
    pub(crate) async fn serve_socket(self: Arc<Self>, socket: WebSocket) {
        if self.is_closed() {
            return;
        }

        let (mut ws_tx, mut ws_rx) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let connection = Arc::new(Connection::new(uuid::Uuid::new_v4().to_string(), tx));
        let conn_id = connection.id().to_string();

        info!("Viewer connected on /{}: {}", self.name, conn_id);

        // Writer: drains the outbound queue until every sender is gone.
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            let _ = ws_tx.close().await;
        });

        self.register(connection.clone());

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                incoming = ws_rx.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        self.dispatch(&connection, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("WebSocket error from {}: {}", conn_id, e);
                        break;
                    }
                },
            }
        }

        self.unregister(&conn_id);
        info!("Viewer disconnected: {}", conn_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        connected: Mutex<Vec<String>>,
        messages: Mutex<Vec<String>>,
        disconnected: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ConnectionHandler for Recorder {
        fn on_connect(&self, connection: &Arc<Connection>) {
            connection.join("authenticated");
            self.connected.lock().push(connection.id().to_string());
        }

        async fn on_message(&self, _connection: &Arc<Connection>, text: &str) {
            self.messages.lock().push(text.to_string());
        }

        fn on_disconnect(&self, connection: &Arc<Connection>) {
            self.disconnected.lock().push(connection.id().to_string());
        }
    }

    #[tokio::test]
    async fn test_register_and_dispatch() {
        let ns = Namespace::new("logcast");
        let recorder = Arc::new(Recorder::default());
        ns.on_connection(recorder.clone());

        let (conn, _rx) = Connection::channel("c1");
        ns.register(conn.clone());
        assert_eq!(ns.connection_count(), 1);
        assert_eq!(*recorder.connected.lock(), vec!["c1".to_string()]);

        ns.dispatch(&conn, "hello").await;
        assert_eq!(*recorder.messages.lock(), vec!["hello".to_string()]);

        ns.unregister("c1");
        assert_eq!(ns.connection_count(), 0);
        assert_eq!(*recorder.disconnected.lock(), vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn test_broadcast_only_reaches_room_members() {
        let ns = Namespace::new("logcast");
        let (member, mut member_rx) = Connection::channel("member");
        let (outsider, mut outsider_rx) = Connection::channel("outsider");
        member.join("authenticated");
        ns.register(member);
        ns.register(outsider);

        let sent = ns.broadcast_to_room("authenticated", "frame");
        assert_eq!(sent, 1);
        assert_eq!(member_rx.recv().await.unwrap(), "frame");
        assert!(outsider_rx.try_recv().is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        let ns = Namespace::new("logcast");
        let (conn, _rx) = Connection::channel("c1");
        conn.join("authenticated");
        ns.register(conn);

        ns.close();
        ns.close();
        assert!(ns.is_closed());
        assert_eq!(ns.connection_count(), 0);
        assert_eq!(ns.broadcast_to_room("authenticated", "frame"), 0);
    }
}
