//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Why a logcast config could not be turned into a [`Config`](crate::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No config file at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config placeholder ${{{0}}} names an unset environment variable")]
    EnvVarNotSet(String),

    #[error("Placeholder pattern failed to compile: {0}")]
    Placeholder(#[from] regex::Error),

    #[error("{field} = {value:?} is invalid: {message}")]
    InvalidValue {
        field: &'static str,
        value: String,
        message: String,
    },
}

impl ConfigError {
    pub fn invalid(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            value: value.into(),
            message: message.into(),
        }
    }

    /// Dotted config key the error refers to, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConfigError::InvalidValue { field, .. } => Some(*field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_names_path() {
        let err = ConfigError::NotFound(PathBuf::from("config/default.toml"));
        assert_eq!(err.to_string(), "No config file at config/default.toml");
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_bad_bind_address() {
        let err = ConfigError::invalid("gateway.bind", "localhost:80", "not an IP address");
        assert_eq!(
            err.to_string(),
            r#"gateway.bind = "localhost:80" is invalid: not an IP address"#
        );
        assert_eq!(err.field(), Some("gateway.bind"));
    }

    #[test]
    fn test_unset_placeholder() {
        let err = ConfigError::EnvVarNotSet("LOGCAST_ADMIN_PASSWORD".to_string());
        assert_eq!(
            err.to_string(),
            "Config placeholder ${LOGCAST_ADMIN_PASSWORD} names an unset environment variable"
        );
    }

    #[test]
    fn test_read_error_keeps_source() {
        use std::error::Error as _;

        let err = ConfigError::Read {
            path: PathBuf::from("/etc/logcast.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/etc/logcast.toml"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_parse_error_from_toml() {
        let toml_err = toml::from_str::<toml::Value>("throttle_ms = ").unwrap_err();
        let err = ConfigError::from(toml_err);
        assert!(err.to_string().starts_with("Config is not valid TOML"));
    }
}
