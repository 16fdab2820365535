//! Per-connection authentication state.

use std::sync::Arc;

use tracing::debug;

use logcast_protocols::{AuthError, Authenticator, Credentials, Hub, Record};

use crate::transport::Connection;
use crate::AUTH_ROOM;

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Granted {
        login: String,
        buffered_records: Vec<Record>,
    },
    Denied {
        login: String,
        reason: AuthError,
    },
}

impl LoginOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, LoginOutcome::Granted { .. })
    }

    pub fn login(&self) -> &str {
        match self {
            LoginOutcome::Granted { login, .. } | LoginOutcome::Denied { login, .. } => login,
        }
    }
}

/// Moves connections between the unauthenticated state and the
/// `authenticated` room.
pub struct ConnectionGate {
    authenticator: Option<Arc<dyn Authenticator>>,
    hub: Arc<dyn Hub>,
}

impl ConnectionGate {
    pub fn new(authenticator: Option<Arc<dyn Authenticator>>, hub: Arc<dyn Hub>) -> Self {
        Self { authenticator, hub }
    }

    pub fn login_required(&self) -> bool {
        self.authenticator.is_some()
    }

    /// Whether a login from `connection` will be checked by the predicate.
    pub fn needs_credentials(&self, connection: &Connection) -> bool {
        self.authenticator.is_some() && !connection.is_authenticated()
    }

    /// Set the initial state of a fresh connection.
    pub fn admit(&self, connection: &Connection) {
        if self.authenticator.is_none() {
            grant(connection);
        }
    }

    /// Check `credentials` and, on success, admit the connection to the room
    /// and hand back the hub backlog.
    pub async fn login(&self, connection: &Connection, credentials: &Credentials) -> LoginOutcome {
        let login = credentials.login.clone();

        if let Some(authenticator) = &self.authenticator {
            if !connection.is_authenticated() {
                match authenticator.authenticate(credentials).await {
                    Ok(true) => grant(connection),
                    Ok(false) => {
                        return LoginOutcome::Denied {
                            login,
                            reason: AuthError::Rejected,
                        };
                    }
                    Err(reason) => return LoginOutcome::Denied { login, reason },
                }
            }
        }

        LoginOutcome::Granted {
            login,
            buffered_records: self.hub.buffered_records(),
        }
    }

    /// Drop back to unauthenticated. No-op when authentication is disabled.
    pub fn logout(&self, connection: &Connection) {
        if self.authenticator.is_none() {
            return;
        }
        connection.set_authenticated(false);
        connection.leave(AUTH_ROOM);
        debug!("Connection {} logged out", connection.id());
    }
}

fn grant(connection: &Connection) {
    connection.set_authenticated(true);
    connection.join(AUTH_ROOM);
}

#[cfg(test)]
mod tests {
    use super::*;
    use logcast_protocols::{async_authenticator_fn, authenticator_fn, LogLevel};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct BacklogHub {
        backlog: Mutex<Vec<Record>>,
    }

    impl Hub for BacklogHub {
        fn emit(&self, record: Record) {
            self.backlog.lock().push(record);
        }

        fn buffered_records(&self) -> Vec<Record> {
            self.backlog.lock().clone()
        }
    }

    fn hub_with_backlog() -> Arc<BacklogHub> {
        let hub = Arc::new(BacklogHub::default());
        hub.emit(Record::log("app", LogLevel::Info, "earlier"));
        hub
    }

    fn password_gate(hub: Arc<BacklogHub>) -> ConnectionGate {
        let auth = authenticator_fn(|c| c.password.as_deref() == Some("secret"));
        ConnectionGate::new(Some(auth), hub)
    }

    #[test]
    fn test_admit_without_authenticator() {
        let gate = ConnectionGate::new(None, hub_with_backlog());
        let (conn, _rx) = Connection::channel("c1");
        gate.admit(&conn);
        assert!(!gate.login_required());
        assert!(conn.is_authenticated());
        assert!(conn.in_room(AUTH_ROOM));
    }

    #[test]
    fn test_admit_with_authenticator() {
        let gate = password_gate(hub_with_backlog());
        let (conn, _rx) = Connection::channel("c1");
        gate.admit(&conn);
        assert!(gate.login_required());
        assert!(!conn.is_authenticated());
        assert!(!conn.in_room(AUTH_ROOM));
    }

    #[tokio::test]
    async fn test_login_failure_then_success() {
        let gate = password_gate(hub_with_backlog());
        let (conn, _rx) = Connection::channel("c1");
        gate.admit(&conn);

        let outcome = gate.login(&conn, &Credentials::new("alice", "wrong")).await;
        assert_eq!(
            outcome,
            LoginOutcome::Denied {
                login: "alice".to_string(),
                reason: AuthError::Rejected,
            }
        );
        assert!(!conn.is_authenticated());
        assert!(!conn.in_room(AUTH_ROOM));

        let outcome = gate.login(&conn, &Credentials::new("alice", "secret")).await;
        match outcome {
            LoginOutcome::Granted {
                login,
                buffered_records,
            } => {
                assert_eq!(login, "alice");
                assert_eq!(buffered_records.len(), 1);
            }
            other => panic!("expected grant, got {:?}", other),
        }
        assert!(conn.is_authenticated());
        assert!(conn.in_room(AUTH_ROOM));
    }

    #[tokio::test]
    async fn test_already_authenticated_skips_predicate() {
        let gate = password_gate(hub_with_backlog());
        let (conn, _rx) = Connection::channel("c1");
        gate.login(&conn, &Credentials::new("alice", "secret")).await;

        let outcome = gate.login(&conn, &Credentials::new("alice", "wrong")).await;
        assert!(outcome.is_granted());
    }

    #[tokio::test]
    async fn test_login_without_authenticator_succeeds() {
        let gate = ConnectionGate::new(None, hub_with_backlog());
        let (conn, _rx) = Connection::channel("c1");
        gate.admit(&conn);
        let outcome = gate.login(&conn, &Credentials::default()).await;
        assert!(outcome.is_granted());
    }

    #[tokio::test]
    async fn test_failing_predicate_is_denied() {
        let auth = async_authenticator_fn(|_c: Credentials| async {
            Err(AuthError::Failed("directory offline".to_string()))
        });
        let gate = ConnectionGate::new(Some(auth), hub_with_backlog());
        let (conn, _rx) = Connection::channel("c1");

        let outcome = gate.login(&conn, &Credentials::new("bob", "x")).await;
        assert_eq!(outcome.login(), "bob");
        assert!(matches!(
            outcome,
            LoginOutcome::Denied {
                reason: AuthError::Failed(_),
                ..
            }
        ));
        assert!(!conn.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout() {
        let gate = password_gate(hub_with_backlog());
        let (conn, _rx) = Connection::channel("c1");
        gate.login(&conn, &Credentials::new("alice", "secret")).await;

        gate.logout(&conn);
        assert!(!conn.is_authenticated());
        assert!(!conn.in_room(AUTH_ROOM));
    }

    #[test]
    fn test_logout_without_authenticator_is_noop() {
        let gate = ConnectionGate::new(None, hub_with_backlog());
        let (conn, _rx) = Connection::channel("c1");
        gate.admit(&conn);

        gate.logout(&conn);
        assert!(conn.is_authenticated());
        assert!(conn.in_room(AUTH_ROOM));
    }
}
