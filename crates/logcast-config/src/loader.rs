//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_str(&content)
    }

    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = Regex::new(r"\$\{([^}]+)\}")?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.logcast`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }

    /// Directory for rolling log files.
    pub fn log_dir(config: &Config) -> PathBuf {
        match &config.logging.dir {
            Some(dir) => PathBuf::from(Self::expand_path(&dir.to_string_lossy())),
            None => dirs::home_dir()
                .map(|h| h.join(".logcast").join("logs"))
                .unwrap_or_else(|| PathBuf::from(".logcast/logs")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.gateway.port, 8090);
        assert_eq!(config.gateway.throttle_ms, 200);
    }

    #[test]
    fn test_expand_path() {
        let expanded = ConfigLoader::expand_path("~/.logcast");
        assert!(!expanded.starts_with('~'));
    }

    #[test]
    fn test_load_basic_config() {
        let content = r#"
            [gateway]
            bind = "0.0.0.0"
            port = 9000
            throttle_ms = 50

            [auth]
            enabled = true

            [auth.users]
            ops = "secret"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.gateway.bind, "0.0.0.0");
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.throttle_ms, 50);
        assert!(config.auth.enabled);
        assert_eq!(config.auth.users.get("ops").map(String::as_str), Some("secret"));
    }

    #[test]
    fn test_env_var_expansion() {
        // SAFETY: test-local variable name, not read by other tests.
        unsafe { std::env::set_var("LOGCAST_TEST_VIEWER_PW", "from-env") };
        let content = r#"
            [auth.users]
            viewer = "${LOGCAST_TEST_VIEWER_PW}"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(
            config.auth.users.get("viewer").map(String::as_str),
            Some("from-env")
        );
    }

    #[test]
    fn test_missing_env_var() {
        let content = r#"
            [auth.users]
            viewer = "${LOGCAST_TEST_DEFINITELY_UNSET}"
        "#;
        let err = ConfigLoader::load_str(content).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotSet(name) if name == "LOGCAST_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[hub]\nbacklog = 42").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.hub.backlog, 42);
    }

    #[test]
    fn test_load_missing_file() {
        let path = Path::new("/nonexistent/logcast.toml");
        assert!(matches!(
            ConfigLoader::load(path),
            Err(ConfigError::NotFound(_))
        ));
        let config = ConfigLoader::load_or_default(path).unwrap();
        assert_eq!(config.gateway.port, 8090);
    }

    #[test]
    fn test_invalid_toml() {
        let err = ConfigLoader::load_str("[gateway\nport = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_log_dir_override() {
        let mut config = Config::default();
        config.logging.dir = Some(PathBuf::from("/var/log/logcast"));
        assert_eq!(ConfigLoader::log_dir(&config), PathBuf::from("/var/log/logcast"));
    }
}
