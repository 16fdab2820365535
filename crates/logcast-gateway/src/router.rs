//! Inbound message dispatch.
//!
//! Every frame produces at most one reply, which is queued on the
//! connection before anything else happens. Log output and hub forwarding
//! are collected as [`FollowUps`] and run afterwards, off the reply path.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use logcast_protocols::{
    AuthError, Credentials, Envelope, FilterStore, GatewayError, Hub, LoginRequiredData, LoginResponseData,
    MessageType, Record, ServerFilterData,
};

use crate::gate::{ConnectionGate, LoginOutcome};
use crate::transport::{Connection, ConnectionHandler};
use crate::LOG_SRC;

type FollowUp = Box<dyn FnOnce() + Send>;

/// Side effects deferred until after a reply has been queued.
#[derive(Default)]
pub struct FollowUps(Vec<FollowUp>);

impl FollowUps {
    pub fn push(&mut self, f: impl FnOnce() + Send + 'static) {
        self.0.push(Box::new(f));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Run everything now, in order.
    pub fn run(self) {
        for f in self.0 {
            f();
        }
    }

    /// Run on a fresh task, or inline when no runtime is available.
    pub fn schedule(self) {
        if self.is_empty() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { self.run() });
            }
            Err(_) => self.run(),
        }
    }
}

impl fmt::Debug for FollowUps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FollowUps").field(&self.0.len()).finish()
    }
}

/// What routing one frame produced.
#[derive(Debug, Default)]
pub struct Routed {
    pub reply: Option<Envelope>,
    pub follow_ups: FollowUps,
}

impl Routed {
    fn reply(envelope: Envelope) -> Self {
        Self {
            reply: Some(envelope),
            follow_ups: FollowUps::default(),
        }
    }

    fn then(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.follow_ups.push(f);
        self
    }
}

/// Decodes client frames and dispatches them by message type.
pub struct MessageRouter {
    gate: Arc<ConnectionGate>,
    hub: Arc<dyn Hub>,
    filters: Arc<dyn FilterStore>,
}

impl MessageRouter {
    pub fn new(gate: Arc<ConnectionGate>, hub: Arc<dyn Hub>, filters: Arc<dyn FilterStore>) -> Self {
        Self { gate, hub, filters }
    }

    pub fn gate(&self) -> &Arc<ConnectionGate> {
        &self.gate
    }

    /// Decode a raw text frame and route it.
    pub async fn handle(&self, connection: &Connection, text: &str) -> Routed {
        match Envelope::from_json(text) {
            Ok(envelope) => self.route(connection, envelope).await,
            Err(e) => {
                let id = connection.id().to_string();
                Routed::default().then(move || {
                    warn!(src = LOG_SRC, "Dropping frame from {}: {}", id, e);
                })
            }
        }
    }

    pub async fn route(&self, connection: &Connection, envelope: Envelope) -> Routed {
        let Some(kind) = envelope.message_type() else {
            let unknown = GatewayError::UnknownMessageType(envelope.kind);
            return Routed::default().then(move || {
                warn!(src = LOG_SRC, "{}, ignored", unknown);
            });
        };

        match kind {
            MessageType::LoginRequest => self.login(connection, &envelope).await,
            MessageType::LogOut => {
                self.gate.logout(connection);
                Routed::default()
            }
            MessageType::LoginRequiredQuestion => {
                let data = LoginRequiredData {
                    login_required: self.gate.login_required(),
                };
                reply_with(MessageType::LoginRequiredResponse, &data)
            }
            MessageType::GetServerFilter => self.server_filter(),
            MessageType::SetServerFilter => match envelope.decode_data::<Option<String>>() {
                Ok(filter) => {
                    self.filters.set_config(filter.as_deref().unwrap_or_default());
                    let mut routed = self.server_filter();
                    let current = self.filters.get_config();
                    routed.follow_ups.push(move || {
                        info!(src = LOG_SRC, "Server filter changed to: {}", current);
                    });
                    routed
                }
                Err(e) => Routed::default().then(move || {
                    warn!(src = LOG_SRC, "Ignoring SET_SERVER_FILTER: {}", e);
                }),
            },
            MessageType::UploadRecords => match envelope.decode_data::<Vec<Record>>() {
                Ok(records) => {
                    let hub = self.hub.clone();
                    Routed::default().then(move || {
                        for record in records {
                            hub.emit(record);
                        }
                    })
                }
                Err(e) => Routed::default().then(move || {
                    warn!(src = LOG_SRC, "Ignoring UPLOAD_RECORDS: {}", e);
                }),
            },
            // Server-to-client types are not valid requests.
            MessageType::LoginResponse
            | MessageType::LoginRequiredResponse
            | MessageType::ServerFilter
            | MessageType::Records => Routed::default().then(move || {
                warn!(src = LOG_SRC, "Unexpected {} from client", kind);
            }),
        }
    }

    async fn login(&self, connection: &Connection, envelope: &Envelope) -> Routed {
        let credentials = match envelope.decode_data::<Credentials>() {
            Ok(credentials) => credentials,
            Err(_) if !self.gate.needs_credentials(connection) => loose_credentials(&envelope.data),
            Err(e) => {
                let reason = AuthError::InvalidPayload(e.to_string());
                return Routed::reply(Envelope::failure(MessageType::LoginResponse, reason.reason()))
                    .then(move || {
                        warn!(src = LOG_SRC, error = %reason, "Malformed login request");
                    });
            }
        };

        match self.gate.login(connection, &credentials).await {
            LoginOutcome::Granted {
                login,
                buffered_records,
            } => {
                let data = LoginResponseData {
                    login: login.clone(),
                    buffered_records,
                };
                reply_with(MessageType::LoginResponse, &data).then(move || {
                    info!(src = LOG_SRC, "User '{}' authenticated successfully", login);
                })
            }
            LoginOutcome::Denied { login, reason } => {
                Routed::reply(Envelope::failure(MessageType::LoginResponse, reason.reason()))
                    .then(move || {
                        warn!(
                            src = LOG_SRC,
                            error = %reason,
                            "User '{}' authentication failed",
                            login
                        );
                    })
            }
        }
    }

    fn server_filter(&self) -> Routed {
        let data = ServerFilterData {
            filter: self.filters.get_config(),
        };
        reply_with(MessageType::ServerFilter, &data)
    }
}

/// Best-effort login name from a payload that is not a credentials object.
/// Only used when no predicate will look at it.
fn loose_credentials(data: &Value) -> Credentials {
    let login = data
        .get("login")
        .and_then(Value::as_str)
        .or_else(|| data.as_str())
        .unwrap_or_default();
    Credentials {
        login: login.to_string(),
        ..Credentials::default()
    }
}

fn reply_with<T: serde::Serialize>(kind: MessageType, data: &T) -> Routed {
    match Envelope::success(kind, data) {
        Ok(envelope) => Routed::reply(envelope),
        Err(e) => Routed::reply(Envelope::failure(kind, e.to_string())),
    }
}

#[async_trait]
impl ConnectionHandler for MessageRouter {
    fn on_connect(&self, connection: &Arc<Connection>) {
        self.gate.admit(connection);
    }

    async fn on_message(&self, connection: &Arc<Connection>, text: &str) {
        let routed = self.handle(connection, text).await;
        if let Some(reply) = routed.reply {
            if let Err(e) = connection.send(&reply) {
                debug!("Reply to {} not delivered: {}", connection.id(), e);
            }
        }
        routed.follow_ups.schedule();
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
