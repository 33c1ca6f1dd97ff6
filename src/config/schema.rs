//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the photo gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Image worker the gateway bridges uploads to.
    pub worker: WorkerConfig,

    /// Staging and output directories.
    pub storage: StorageConfig,

    /// Request size and time limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Worker connection settings.
///
/// One TCP connection is opened per job; nothing here is pooled.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Worker host name or IP.
    pub host: String,

    /// Worker TCP port.
    pub port: u16,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Deadline for the whole read-until-close phase in milliseconds.
    pub read_timeout_ms: u64,

    /// Upper bound on bytes accepted from the worker for one job.
    pub max_response_bytes: usize,
}

impl WorkerConfig {
    /// `host:port` as handed to the resolver.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
            connect_timeout_ms: 3_000,
            read_timeout_ms: 30_000,
            max_response_bytes: 64 * 1024,
        }
    }
}

/// Filesystem layout shared with the worker.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where uploaded files are staged before processing.
    pub upload_dir: PathBuf,

    /// Where the worker writes processed images.
    pub output_dir: PathBuf,

    /// Extension appended to generated output names (without the dot).
    pub output_extension: String,

    /// Optional directory served as a static site for unmatched GETs.
    pub public_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./uploads"),
            output_dir: PathBuf::from("./uploads_output"),
            output_extension: "png".to_string(),
            public_dir: None,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum multipart body size in bytes.
    pub max_upload_bytes: usize,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 20 * 1024 * 1024, // 20MB
            request_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [worker]
            port = 9100
            "#,
        )
        .unwrap();

        assert_eq!(config.worker.port, 9100);
        assert_eq!(config.worker.host, "127.0.0.1");
        assert_eq!(config.storage.output_extension, "png");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn worker_address_and_timeouts() {
        let worker = WorkerConfig {
            host: "imaging.local".into(),
            port: 9001,
            connect_timeout_ms: 250,
            read_timeout_ms: 1500,
            ..WorkerConfig::default()
        };
        assert_eq!(worker.address(), "imaging.local:9001");
        assert_eq!(worker.connect_timeout(), Duration::from_millis(250));
        assert_eq!(worker.read_timeout(), Duration::from_millis(1500));
    }
}
