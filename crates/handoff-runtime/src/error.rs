//! Runtime error types

use crate::result::EvaluationDiagnostic;
use handoff_core::CoreError;
use thiserror::Error;

/// Runtime error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// A rule with this name is already registered
    #[error("Duplicate rule: {0}")]
    DuplicateRule(String),

    /// No rule with this name is registered
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    /// Rule-scoped evaluation failure; the rule is treated as non-matching
    #[error("Evaluation error in rule '{rule}' condition #{condition_index}: {source}")]
    Evaluation {
        rule: String,
        condition_index: usize,
        #[source]
        source: CoreError,
    },

    /// Invalid rule or action definition
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl RuntimeError {
    /// Diagnostic entry for a rule-scoped evaluation failure
    pub fn diagnostic(&self) -> Option<EvaluationDiagnostic> {
        match self {
            RuntimeError::Evaluation {
                rule,
                condition_index,
                source,
            } => Some(EvaluationDiagnostic::new(
                rule.clone(),
                Some(*condition_index),
                source.to_string(),
            )),
            _ => None,
        }
    }
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
