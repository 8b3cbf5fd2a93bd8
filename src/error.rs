//! Error types for configuration loading
//!
//! Cache operations never fail; only turning environment input into a
//! configuration can.

use thiserror::Error;

// == Config Error Enum ==
/// Errors raised while building a configuration from the environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },

    /// A variable parsed but is outside its accepted range
    #[error("Out of range value for {name}: {reason}")]
    OutOfRange { name: String, reason: String },
}

// == Result Type Alias ==
/// Convenience Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;
