//! Error types for Handoff Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Field/operator/value type mismatch while evaluating or validating a condition
    #[error("Condition type error: {0}")]
    ConditionType(String),

    /// A field referenced by a condition is not present on the evaluation context
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Condition is structurally invalid (unknown field name, bad pattern, ...)
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    /// Action is missing a required parameter or carries an empty one
    #[error("Action parameter error: {0}")]
    ActionParameter(String),

    /// Rule or routing configuration is invalid
    #[error("Invalid rule: {0}")]
    InvalidRule(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
