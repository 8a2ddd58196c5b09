//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, window bounds, threshold)
//! - Reject host lists the monitor cannot rank (empty, duplicates)
//! - Reject headers that could never be sent
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the client

use std::collections::HashSet;
use std::fmt;

use reqwest::header::{HeaderName, HeaderValue};

use crate::config::schema::{AuthConfig, ClientConfig};

/// Largest window for which adjacent failure rates (1/N apart) stay
/// further apart than the ranking epsilon.
pub const MAX_WINDOW_SIZE: usize = 5000;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic rule, collecting all failures.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.tenant.trim().is_empty() {
        errors.push(ValidationError::new("tenant", "must not be empty"));
    }
    if config.tenant_id.trim().is_empty() {
        errors.push(ValidationError::new("tenant_id", "must not be empty"));
    }

    validate_auth(&config.auth, &mut errors);
    validate_hosts(config, &mut errors);
    validate_headers(config, &mut errors);

    let hc = &config.health_check;
    if hc.ping_interval_ms == 0 {
        errors.push(ValidationError::new("health_check.ping_interval_ms", "must be > 0"));
    }
    if hc.ping_timeout_ms == 0 {
        errors.push(ValidationError::new("health_check.ping_timeout_ms", "must be > 0"));
    }
    if hc.window_size == 0 || hc.window_size > MAX_WINDOW_SIZE {
        errors.push(ValidationError::new(
            "health_check.window_size",
            format!("must be in 1..={MAX_WINDOW_SIZE}"),
        ));
    }
    if !(hc.failure_rate_threshold > 0.0 && hc.failure_rate_threshold <= 1.0) {
        errors.push(ValidationError::new(
            "health_check.failure_rate_threshold",
            "must be in (0, 1]",
        ));
    }
    if !hc.ping_path.starts_with('/') {
        errors.push(ValidationError::new("health_check.ping_path", "must start with '/'"));
    }

    if config.timeouts.default_request_ms == 0 {
        errors.push(ValidationError::new("timeouts.default_request_ms", "must be > 0"));
    }
    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::new("timeouts.connect_ms", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_auth(auth: &AuthConfig, errors: &mut Vec<ValidationError>) {
    match auth {
        AuthConfig::Simple { token } => {
            if token.is_empty() {
                errors.push(ValidationError::new("auth.token", "must not be empty"));
            }
        }
        AuthConfig::Canonical {
            access_key,
            secret_key,
            service,
            ..
        } => {
            if access_key.is_empty() {
                errors.push(ValidationError::new("auth.access_key", "must not be empty"));
            }
            if secret_key.is_empty() {
                errors.push(ValidationError::new("auth.secret_key", "must not be empty"));
            }
            if service.is_empty() {
                errors.push(ValidationError::new("auth.service", "must not be empty"));
            }
        }
    }
}

fn validate_hosts(config: &ClientConfig, errors: &mut Vec<ValidationError>) {
    let hosts = config.effective_hosts();
    if hosts.is_empty() {
        errors.push(ValidationError::new(
            "hosts",
            "must not be empty when the region has no default hosts",
        ));
        return;
    }

    let mut seen = HashSet::new();
    for host in &hosts {
        if host.trim().is_empty() || host.contains('/') || host.contains(char::is_whitespace) {
            errors.push(ValidationError::new("hosts", format!("invalid host '{host}'")));
        } else if !seen.insert(host.as_str()) {
            errors.push(ValidationError::new("hosts", format!("duplicate host '{host}'")));
        }
    }
}

fn validate_headers(config: &ClientConfig, errors: &mut Vec<ValidationError>) {
    for (name, value) in &config.headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                format!("headers.{name}"),
                "invalid header name",
            ));
        } else if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::new(
                format!("headers.{name}"),
                "invalid header value",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Region;

    fn valid() -> ClientConfig {
        ClientConfig {
            tenant: "demo".into(),
            tenant_id: "1234".into(),
            auth: AuthConfig::Simple {
                token: "tok".into(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.tenant = String::new();
        config.health_check.window_size = 0;
        config.health_check.failure_rate_threshold = 1.5;
        config.timeouts.connect_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "tenant",
                "health_check.window_size",
                "health_check.failure_rate_threshold",
                "timeouts.connect_ms",
            ]
        );
    }

    #[test]
    fn test_window_upper_bound() {
        let mut config = valid();
        config.health_check.window_size = MAX_WINDOW_SIZE;
        assert!(validate_config(&config).is_ok());

        config.health_check.window_size = MAX_WINDOW_SIZE + 1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_duplicate_and_missing_hosts() {
        let mut config = valid();
        config.hosts = vec!["a".into(), "b".into(), "a".into()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("duplicate"));

        let mut config = valid();
        config.region = Region::Us;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "hosts");
    }

    #[test]
    fn test_canonical_auth_fields() {
        let mut config = valid();
        config.auth = AuthConfig::Canonical {
            access_key: String::new(),
            secret_key: String::new(),
            service: "air".into(),
            region: None,
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_bad_header_rejected() {
        let mut config = valid();
        config.headers.insert("bad header".into(), "v".into());
        config.headers.insert("x-ok".into(), "line\nbreak".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
