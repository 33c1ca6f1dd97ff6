//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Keep the worker command line unambiguous (no delimiter in names)
//! - Make sure the outer request timeout outlives the worker deadlines
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::worker::protocol::DELIMITER;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
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

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let worker = &config.worker;
    if worker.host.trim().is_empty() {
        errors.push(ValidationError::new("worker.host", "must not be empty"));
    }
    if worker.port == 0 {
        errors.push(ValidationError::new("worker.port", "must be non-zero"));
    }
    if worker.connect_timeout_ms == 0 {
        errors.push(ValidationError::new("worker.connect_timeout_ms", "must be > 0"));
    }
    if worker.read_timeout_ms == 0 {
        errors.push(ValidationError::new("worker.read_timeout_ms", "must be > 0"));
    }
    if worker.max_response_bytes == 0 {
        errors.push(ValidationError::new("worker.max_response_bytes", "must be > 0"));
    }

    let ext = &config.storage.output_extension;
    if ext.is_empty()
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
        || ext.contains(DELIMITER)
    {
        errors.push(ValidationError::new(
            "storage.output_extension",
            format!("'{}' must be a non-empty alphanumeric extension", ext),
        ));
    }

    for (field, dir) in [
        ("storage.upload_dir", &config.storage.upload_dir),
        ("storage.output_dir", &config.storage.output_dir),
    ] {
        if dir.to_string_lossy().contains(DELIMITER) {
            errors.push(ValidationError::new(
                field,
                format!("path must not contain '{}'", DELIMITER),
            ));
        }
    }

    if config.limits.max_upload_bytes == 0 {
        errors.push(ValidationError::new("limits.max_upload_bytes", "must be > 0"));
    }

    let bridge_budget_ms = worker.connect_timeout_ms.saturating_add(worker.read_timeout_ms);
    if config.limits.request_secs.saturating_mul(1000) <= bridge_budget_ms {
        errors.push(ValidationError::new(
            "limits.request_secs",
            format!(
                "must exceed worker connect + read timeouts ({} ms)",
                bridge_budget_ms
            ),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
