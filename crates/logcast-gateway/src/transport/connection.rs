//! Per-client connection handle.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use logcast_protocols::{Envelope, GatewayError};

/// Connection unique identifier type.
pub type ConnectionId = String;

#[derive(Debug, Default)]
struct ConnectionState {
    authenticated: bool,
    rooms: HashSet<String>,
}

/// A connected viewer.
///
/// Owned by the [`Namespace`](super::Namespace) it arrived on. Outbound
/// frames are queued on an unbounded channel drained by the socket's writer
/// task, so sending never blocks the caller.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<String>,
    state: Mutex<ConnectionState>,
}

impl Connection {
    pub fn new(id: impl Into<String>, tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id: id.into(),
            tx,
            state: Mutex::new(ConnectionState::default()),
        }
    }

    /// Create a connection together with the receiving end of its outbound
    /// queue. Used when no socket is involved (tests, in-process viewers).
    pub fn channel(id: impl Into<String>) -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self::new(id, tx)), rx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().authenticated
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.state.lock().authenticated = authenticated;
    }

    pub fn join(&self, room: &str) {
        self.state.lock().rooms.insert(room.to_string());
    }

    pub fn leave(&self, room: &str) {
        self.state.lock().rooms.remove(room);
    }

    pub fn in_room(&self, room: &str) -> bool {
        self.state.lock().rooms.contains(room)
    }

    /// Whether the writer side is still draining frames.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue a pre-serialized frame.
    pub fn send_frame(&self, frame: String) -> Result<(), GatewayError> {
        self.tx.send(frame).map_err(|_| GatewayError::Disconnected)
    }

    /// Serialize and queue an envelope.
    pub fn send(&self, envelope: &Envelope) -> Result<(), GatewayError> {
        self.send_frame(envelope.to_json()?)
    }
}
