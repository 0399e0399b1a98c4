//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A rule source could not be read or parsed
    #[error("Failed to load rules from {path}: {message}")]
    Load { path: String, message: String },

    /// Rules were parsed but rejected
    #[error("Validation error: {0}")]
    Validation(String),

    /// Runtime error
    #[error("Runtime error: {0}")]
    Runtime(#[from] handoff_runtime::RuntimeError),

    /// Core model error
    #[error("Rule error: {0}")]
    Core(#[from] handoff_core::CoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
