//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the supervisor.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Root configuration for the supervisor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Shutdown behavior.
    pub lifecycle: LifecycleConfig,

    /// HTTP listener settings.
    pub http: HttpConfig,

    /// gRPC listener settings.
    pub grpc: GrpcConfig,

    /// Periodic scheduler settings.
    pub scheduler: SchedulerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Lifecycle and shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Time to wait for workers after cancellation, in milliseconds.
    pub grace_window_ms: u64,

    /// Exit code used when the grace window is exceeded.
    pub forced_exit_code: i32,

    /// Treat SIGTERM like SIGINT (Unix only).
    pub terminate_on_sigterm: bool,
}

impl LifecycleConfig {
    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            grace_window_ms: 5000,
            forced_exit_code: 1,
            terminate_on_sigterm: false,
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Start the HTTP worker.
    pub enabled: bool,

    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// gRPC listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GrpcConfig {
    /// Start the gRPC worker.
    pub enabled: bool,

    /// Bind address (e.g., "0.0.0.0:50051").
    pub bind_address: String,
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:50051".to_string(),
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Start the scheduler worker.
    pub enabled: bool,

    /// Interval of the built-in heartbeat job in seconds.
    pub heartbeat_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            heartbeat_interval_secs: 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Install the Prometheus recorder and serve `/metrics`.
    pub metrics_enabled: bool,

    /// Also append plain-text log lines to this file.
    pub log_file: Option<PathBuf>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            log_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SupervisorConfig::default();
        assert_eq!(config.lifecycle.grace_window(), Duration::from_millis(5000));
        assert_eq!(config.lifecycle.forced_exit_code, 1);
        assert!(!config.lifecycle.terminate_on_sigterm);
        assert!(config.http.enabled);
        assert!(config.grpc.enabled);
        assert_eq!(config.grpc.bind_address, "0.0.0.0:50051");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert!(config.observability.log_file.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SupervisorConfig = toml::from_str(
            r#"
            [lifecycle]
            grace_window_ms = 200

            [observability]
            log_format = "json"
            log_file = "/var/log/supervisor.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.lifecycle.grace_window_ms, 200);
        assert_eq!(config.lifecycle.forced_exit_code, 1);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(
            config.observability.log_file.as_deref(),
            Some(std::path::Path::new("/var/log/supervisor.log"))
        );
        assert_eq!(config.http.bind_address, "0.0.0.0:8080");
    }
}
