//! Configuration validation.

use std::fmt;

use crate::schema::Config;

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

/// Throttle intervals above this are almost certainly a unit mistake.
const MAX_SANE_THROTTLE_MS: u64 = 60_000;

/// How much a validation finding matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The gateway would start, probably not as intended.
    Warning,
    /// The gateway must not start with this config.
    Error,
}

/// One problem found in a config, keyed by its dotted field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}: {}", label, self.field, self.message)
    }
}

/// Everything [`ConfigValidator::validate`] found, in check order.
#[derive(Debug, Default)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.by_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.by_severity(Severity::Warning)
    }

    /// Whether `field` has an issue of the given severity.
    pub fn flags(&self, severity: Severity, field: &str) -> bool {
        self.by_severity(severity).any(|issue| issue.field == field)
    }

    fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |issue| issue.severity == severity)
    }

    fn push(&mut self, severity: Severity, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity,
            field: field.into(),
            message: message.into(),
        });
    }

    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Error, field, message);
    }

    fn warn(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Warning, field, message);
    }
}

/// Cross-field checks that serde defaults cannot express.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> ValidationReport {
        let mut report = ValidationReport::default();

        Self::validate_gateway(config, &mut report);
        Self::validate_auth(config, &mut report);
        Self::validate_hub(config, &mut report);

        report
    }

    fn validate_gateway(config: &Config, report: &mut ValidationReport) {
        let gateway = &config.gateway;

        if let Err(e) = gateway.bind_addr() {
            report.error("gateway.bind", e.to_string());
        }

        if gateway.throttle_ms > MAX_SANE_THROTTLE_MS {
            report.warn(
                "gateway.throttle_ms",
                format!(
                    "throttle_ms is very high ({}ms), viewers will see long delays",
                    gateway.throttle_ms
                ),
            );
        }

        if !gateway.standalone && gateway.app_port.is_none() {
            report.warn(
                "gateway.standalone",
                "standalone listener disabled and no app_port set, nothing will accept viewers",
            );
        }

        if let Some(app_port) = gateway.app_port {
            if gateway.standalone && app_port == gateway.port && app_port != 0 {
                report.error(
                    "gateway.app_port",
                    format!("app_port {} collides with the standalone port", app_port),
                );
            }
        }
    }

    fn validate_auth(config: &Config, report: &mut ValidationReport) {
        let auth = &config.auth;

        if auth.enabled && auth.users.is_empty() {
            report.error(
                "auth.users",
                "authentication is enabled but no users are configured",
            );
        }

        if !auth.enabled && !auth.users.is_empty() {
            report.warn(
                "auth.enabled",
                "users are configured but authentication is disabled",
            );
        }

        for (login, password) in &auth.users {
            if password.is_empty() {
                report.warn(format!("auth.users.{}", login), "empty password");
            }
        }
    }

    fn validate_hub(config: &Config, report: &mut ValidationReport) {
        if config.hub.backlog == 0 {
            report.warn(
                "hub.backlog",
                "backlog is 0, viewers will receive no history on login",
            );
        }
    }
}
