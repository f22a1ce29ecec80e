//! Error types for rebound-core
//!
//! These cover configuration loading and label parsing. Failures raised by a
//! phase's unit of work never surface here; the engine captures them as
//! [`PhaseFailure`](crate::retry::PhaseFailure) values instead.

use thiserror::Error;

/// Result type alias using rebound-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Rebound
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Preset name not present in the loaded configuration
    #[error("Unknown preset: {name}")]
    UnknownPreset { name: String },

    /// Label that does not name an error kind
    #[error("Unknown error kind: {label}. Valid kinds: network, timeout, auth, permission, invalid_input, transient, unknown")]
    UnknownErrorKind { label: String },

    /// Retry policy or strategy that violates an invariant
    #[error("Invalid policy for phase '{phase}': {message}")]
    InvalidPolicy { phase: String, message: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an unknown preset error
    pub fn unknown_preset(name: impl Into<String>) -> Self {
        Self::UnknownPreset { name: name.into() }
    }

    /// Create an unknown error kind error
    pub fn unknown_error_kind(label: impl Into<String>) -> Self {
        Self::UnknownErrorKind {
            label: label.into(),
        }
    }

    /// Create an invalid policy error
    pub fn invalid_policy(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            phase: phase.into(),
            message: message.into(),
        }
    }
}
