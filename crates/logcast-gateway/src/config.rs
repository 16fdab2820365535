//! Gateway configuration.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use logcast_config::{ConfigError, GatewaySettings};
use logcast_protocols::Authenticator;

use crate::transport::{ExternalHost, HttpHost, SocketServer};

/// Default standalone port.
pub const DEFAULT_PORT: u16 = 8090;

/// Default throttle interval.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(200);

/// Runtime configuration of a [`LogGateway`](crate::LogGateway).
///
/// Fixed once the gateway is built.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Address the standalone listener binds to.
    pub bind: IpAddr,

    /// Standalone port. `None` disables the standalone channel, `Some(0)`
    /// binds an ephemeral port.
    pub port: Option<u16>,

    /// Throttle interval between broadcasts. Zero flushes on every record.
    pub throttle: Duration,

    /// Login predicate. `None` disables authentication.
    pub authenticate: Option<Arc<dyn Authenticator>>,

    /// Real-time channel host to attach to.
    pub external_socket_host: Option<Arc<SocketServer>>,

    /// Raw HTTP host to attach to. Ignored when a socket host is set.
    pub external_http_host: Option<Arc<dyn HttpHost>>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: Some(DEFAULT_PORT),
            throttle: DEFAULT_THROTTLE,
            authenticate: None,
            external_socket_host: None,
            external_http_host: None,
        }
    }
}

impl GatewayConfig {
    /// Build from the `[gateway]` section of a config file.
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, ConfigError> {
        Ok(Self {
            bind: settings.bind_addr()?,
            port: settings.standalone_port(),
            throttle: Duration::from_millis(settings.throttle_ms),
            ..Self::default()
        })
    }

    pub fn with_bind(mut self, bind: IpAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticate = Some(authenticator);
        self
    }

    pub fn with_socket_host(mut self, host: Arc<SocketServer>) -> Self {
        self.external_socket_host = Some(host);
        self
    }

    pub fn with_http_host(mut self, host: Arc<dyn HttpHost>) -> Self {
        self.external_http_host = Some(host);
        self
    }

    /// The host to attach to, socket host first.
    pub fn external_host(&self) -> Option<ExternalHost> {
        if let Some(server) = &self.external_socket_host {
            return Some(ExternalHost::Socket(server.clone()));
        }
        self.external_http_host.clone().map(ExternalHost::Http)
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field("throttle", &self.throttle)
            .field("authenticate", &self.authenticate.is_some())
            .field("external_socket_host", &self.external_socket_host.is_some())
            .field("external_http_host", &self.external_http_host.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logcast_protocols::{authenticator_fn, GatewayError};

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.port, Some(8090));
        assert_eq!(config.throttle, Duration::from_millis(200));
        assert!(config.authenticate.is_none());
        assert!(config.external_host().is_none());
    }

    #[test]
    fn test_from_settings() {
        let settings = GatewaySettings {
            bind: "0.0.0.0".to_string(),
            standalone: false,
            throttle_ms: 0,
            ..GatewaySettings::default()
        };
        let config = GatewayConfig::from_settings(&settings).unwrap();
        assert_eq!(config.bind, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.port, None);
        assert!(config.throttle.is_zero());
    }

    #[test]
    fn test_from_settings_rejects_bad_bind() {
        let settings = GatewaySettings {
            bind: "localhost:80".to_string(),
            ..GatewaySettings::default()
        };
        assert!(GatewayConfig::from_settings(&settings).is_err());
    }

    #[test]
    fn test_socket_host_preferred() {
        let socket = Arc::new(SocketServer::new());
        let http: Arc<dyn HttpHost> = Arc::new(NoopHost);
        let config = GatewayConfig::default()
            .with_http_host(http)
            .with_socket_host(socket.clone());

        match config.external_host() {
            Some(ExternalHost::Socket(server)) => assert!(Arc::ptr_eq(&server, &socket)),
            _ => panic!("expected the socket host"),
        }
    }

    #[test]
    fn test_debug_hides_handles() {
        let config = GatewayConfig::default().with_authenticator(authenticator_fn(|_| true));
        let debug = format!("{:?}", config);
        assert!(debug.contains("authenticate: true"));
    }

    struct NoopHost;

    impl HttpHost for NoopHost {
        fn mount(&self, _prefix: &str, _router: axum::Router) -> Result<(), GatewayError> {
            Ok(())
        }

        fn unmount(&self, _prefix: &str) {}

        fn local_addr(&self) -> Option<std::net::SocketAddr> {
            None
        }
    }
}
