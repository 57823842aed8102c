//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Pick the log level from `RUST_LOG`, the CLI, or config, in that order
//! - Optionally mirror every line to an append-only log file
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - The file sink is plain text without ANSI colors

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter `{filter}`: {source}")]
    Filter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("cannot open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Directive used when `RUST_LOG` is unset.
pub fn default_directive(config: &ObservabilityConfig, verbose: bool) -> String {
    let level = if verbose {
        "debug".to_string()
    } else {
        config.log_level.to_ascii_lowercase()
    };
    format!("service_supervisor={level},tower_http={level}")
}

/// Open `path` for appending, creating it and its parent directory.
pub fn open_log_file(path: &Path) -> Result<Arc<File>, LoggingError> {
    let log_file_error = |source| LoggingError::LogFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(log_file_error)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(log_file_error)?;
    Ok(Arc::new(file))
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig, verbose: bool) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive = default_directive(config, verbose);
            EnvFilter::try_new(&directive).map_err(|source| LoggingError::Filter {
                filter: directive,
                source,
            })?
        }
    };

    let file_layer = match &config.log_file {
        Some(path) => Some(fmt::layer().with_ansi(false).with_writer(open_log_file(path)?)),
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    match config.log_format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init()?,
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
    }

    if let Some(path) = &config.log_file {
        tracing::info!(path = %path.display(), "Writing logs to file");
    }

    Ok(())
}
