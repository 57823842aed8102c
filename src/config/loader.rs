//! Configuration loading from disk.
//!
//! Parsing never validates. Validation runs once, after command-line
//! overrides are applied, so an override can fix a bad file value.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::SupervisorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values given on the command line that replace file settings.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub grace_window_ms: Option<u64>,
    pub http_bind_address: Option<String>,
    pub grpc_bind_address: Option<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut SupervisorConfig) {
        if let Some(ms) = self.grace_window_ms {
            config.lifecycle.grace_window_ms = ms;
        }
        if let Some(address) = &self.http_bind_address {
            config.http.bind_address = address.clone();
        }
        if let Some(address) = &self.grpc_bind_address {
            config.grpc.bind_address = address.clone();
        }
    }
}

/// Parse TOML text without validating it.
pub fn parse_config(content: &str) -> Result<SupervisorConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Read and parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<SupervisorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SupervisorConfig, ConfigError> {
    resolve_config(Some(path), &ConfigOverrides::default())
}

/// Build the effective configuration: file (or defaults), then overrides,
/// then a single validation pass.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<SupervisorConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => SupervisorConfig::default(),
    };
    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_load_from_file() {
        let file = config_file("[lifecycle]\ngrace_window_ms = 250\n\n[http]\nbind_address = \"127.0.0.1:9000\"\n");

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.lifecycle.grace_window_ms, 250);
        assert_eq!(config.http.bind_address, "127.0.0.1:9000");
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[lifecycle\ngrace_window_ms = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_parse_does_not_validate() {
        let config = parse_config("[lifecycle]\ngrace_window_ms = 0\n").unwrap();
        assert_eq!(config.lifecycle.grace_window_ms, 0);
    }

    #[test]
    fn test_validation_error_lists_every_problem() {
        let file = config_file("[lifecycle]\ngrace_window_ms = 0\nforced_exit_code = 256\n");
        let err = load_config(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("grace_window_ms"));
        assert!(message.contains("forced_exit_code"));
    }

    #[test]
    fn test_override_repairs_file_value() {
        let file = config_file("[lifecycle]\ngrace_window_ms = 0\n\n[http]\nbind_address = \"bogus\"\n");
        let overrides = ConfigOverrides {
            grace_window_ms: Some(100),
            http_bind_address: Some("127.0.0.1:0".into()),
            grpc_bind_address: Some("127.0.0.1:0".into()),
        };

        let config = resolve_config(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.lifecycle.grace_window_ms, 100);
        assert_eq!(config.http.bind_address, "127.0.0.1:0");
        assert_eq!(config.grpc.bind_address, "127.0.0.1:0");
    }

    #[test]
    fn test_override_is_validated() {
        let overrides = ConfigOverrides {
            grace_window_ms: Some(0),
            ..ConfigOverrides::default()
        };
        let err = resolve_config(None, &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors == &[ValidationError::ZeroGraceWindow]));
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.lifecycle.grace_window_ms, 5000);
    }
}
