//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (grace window > 0, intervals > 0, forced exit
//!   code representable as a non-zero process status)
//! - Check that addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SupervisorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::SupervisorConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const FORCED_EXIT_CODES: std::ops::RangeInclusive<i32> = 1..=255;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("lifecycle.grace_window_ms must be greater than zero")]
    ZeroGraceWindow,

    #[error("lifecycle.forced_exit_code must be between 1 and 255, got {0}")]
    ForcedExitCodeOutOfRange(i32),

    #[error("{field} `{address}` is not a socket address")]
    InvalidBindAddress {
        field: &'static str,
        address: String,
    },

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("observability.log_level `{0}` is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &SupervisorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.lifecycle.grace_window_ms == 0 {
        errors.push(ValidationError::ZeroGraceWindow);
    }
    // Unix keeps only the low 8 bits of the status; 256 would read as success.
    if !FORCED_EXIT_CODES.contains(&config.lifecycle.forced_exit_code) {
        errors.push(ValidationError::ForcedExitCodeOutOfRange(
            config.lifecycle.forced_exit_code,
        ));
    }

    if config.http.enabled {
        check_bind_address("http.bind_address", &config.http.bind_address, &mut errors);
        if config.http.request_timeout_secs == 0 {
            errors.push(ValidationError::ZeroInterval("http.request_timeout_secs"));
        }
    }

    if config.grpc.enabled {
        check_bind_address("grpc.bind_address", &config.grpc.bind_address, &mut errors);
    }

    if config.scheduler.enabled && config.scheduler.heartbeat_interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval("scheduler.heartbeat_interval_secs"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_bind_address(field: &'static str, address: &str, errors: &mut Vec<ValidationError>) {
    if address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            field,
            address: address.to_string(),
        });
    }
}
