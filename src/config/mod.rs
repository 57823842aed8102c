//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (ConfigOverrides)
//!     → validation.rs (semantic checks, once)
//!     → SupervisorConfig (validated, immutable)
//!     → sections handed to each worker at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the grace window never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, read_config, resolve_config, ConfigError, ConfigOverrides};
pub use schema::{
    GrpcConfig, HttpConfig, LifecycleConfig, LogFormat, ObservabilityConfig, SchedulerConfig,
    SupervisorConfig,
};
pub use validation::{validate_config, ValidationError};
