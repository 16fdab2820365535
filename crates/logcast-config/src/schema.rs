//! Configuration schema definitions.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewaySettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub hub: HubSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Gateway transport and throttling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Address the standalone listener binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Run the standalone listener. When false, the gateway is only
    /// reachable through an attached host.
    #[serde(default = "default_true")]
    pub standalone: bool,

    /// Standalone listener port (0 picks an ephemeral port).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Broadcast throttle interval; 0 disables coalescing.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,

    /// Optional application HTTP port the gateway attaches to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_port: Option<u16>,
}

impl GatewaySettings {
    /// Port for the standalone channel, `None` when it is disabled.
    pub fn standalone_port(&self) -> Option<u16> {
        self.standalone.then_some(self.port)
    }

    pub fn bind_addr(&self) -> Result<IpAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::invalid("gateway.bind", self.bind.as_str(), "not an IP address"))
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            standalone: true,
            port: default_port(),
            throttle_ms: default_throttle_ms(),
            app_port: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_throttle_ms() -> u64 {
    200
}

fn default_true() -> bool {
    true
}

/// Viewer authentication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub enabled: bool,

    /// login -> password
    #[serde(default)]
    pub users: HashMap<String, String>,
}

/// In-process record hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSettings {
    /// Records kept for the login backlog.
    #[serde(default = "default_backlog")]
    pub backlog: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            backlog: default_backlog(),
        }
    }
}

fn default_backlog() -> usize {
    1000
}

/// Process logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rolling log files (default `~/.logcast/logs`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Initial server filter exposed through `GET_SERVER_FILTER`.
    #[serde(default = "default_server_filter")]
    pub server_filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
            server_filter: default_server_filter(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_server_filter() -> String {
    "*:DEBUG".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_defaults() {
        let settings = GatewaySettings::default();
        assert_eq!(settings.bind, "127.0.0.1");
        assert_eq!(settings.port, 8090);
        assert_eq!(settings.throttle_ms, 200);
        assert_eq!(settings.standalone_port(), Some(8090));
        assert!(settings.app_port.is_none());
    }

    #[test]
    fn test_standalone_disabled() {
        let settings = GatewaySettings {
            standalone: false,
            ..Default::default()
        };
        assert_eq!(settings.standalone_port(), None);
    }

    #[test]
    fn test_bind_addr() {
        let mut settings = GatewaySettings::default();
        assert!(settings.bind_addr().unwrap().is_loopback());

        settings.bind = "localhost".to_string();
        let err = settings.bind_addr().unwrap_err();
        assert_eq!(err.field(), Some("gateway.bind"));
    }

    #[test]
    fn test_partial_gateway_table() {
        let config: Config = toml::from_str("[gateway]\nthrottle_ms = 0\n").unwrap();
        assert_eq!(config.gateway.throttle_ms, 0);
        assert_eq!(config.gateway.port, 8090);
        assert!(!config.auth.enabled);
        assert_eq!(config.hub.backlog, 1000);
        assert_eq!(config.logging.server_filter, "*:DEBUG");
    }
}
