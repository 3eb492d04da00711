//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the upstream origin (scheme, host, no query)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Keep the inbound timeout above the upstream deadline, so a slow origin
//!   is reported by the forwarder and not by the timeout layer
//! - Keep the image endpoint a literal path, clear of the health routes
//!
//! Returns all validation errors, not just the first.

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;
use crate::proxy::Origin;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const RESERVED_PATHS: [&str; 2] = ["/healthz", "/readyz"];

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. `upstream.origin`).
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstream.origin.trim().is_empty() {
        errors.push(ValidationError::new("upstream.origin", "must be set"));
    } else if let Err(e) = Origin::parse(&config.upstream.origin) {
        errors.push(ValidationError::new("upstream.origin", e.to_string()));
    }

    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_secs", "must be greater than zero"));
    }
    if config.upstream.request_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.request_timeout_secs", "must be greater than zero"));
    }
    if config.upstream.max_body_bytes == 0 {
        errors.push(ValidationError::new("upstream.max_body_bytes", "must be greater than zero"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    } else if config.timeouts.request_secs <= config.upstream.request_timeout_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must be greater than upstream.request_timeout_secs ({})",
                config.upstream.request_timeout_secs
            ),
        ));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }

    let path = &config.forwarder.path;
    if !path.starts_with('/') {
        errors.push(ValidationError::new("forwarder.path", "must start with `/`"));
    } else if RESERVED_PATHS.contains(&path.as_str()) {
        errors.push(ValidationError::new(
            "forwarder.path",
            format!("`{path}` is reserved for health checks"),
        ));
    } else if has_route_syntax(path) {
        errors.push(ValidationError::new(
            "forwarder.path",
            format!("`{path}` must be a literal path without captures or wildcards"),
        ));
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level `{}`", observability.log_level),
        ));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Segments the router would read as a capture or wildcard.
fn has_route_syntax(path: &str) -> bool {
    path.contains(['{', '}'])
        || path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
}
