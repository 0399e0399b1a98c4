//! Evaluation tracing types for rule debugging
//!
//! These structures capture which conditions of which rules were evaluated,
//! what field values they saw and why a rule did or did not match.

use handoff_core::{Condition, ConditionKind, ConditionOperator, Value};
use serde::{Deserialize, Serialize};

/// Trace of a single condition evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionTrace {
    /// Position of the condition within its rule
    pub index: usize,

    /// The condition rendered as text (e.g. "user.tier EQUALS vip")
    pub expression: String,

    pub kind: ConditionKind,

    pub operator: ConditionOperator,

    /// The comparison value from the rule
    pub expected: Value,

    /// The field value seen during evaluation, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,

    pub negated: bool,

    /// Final result after negation; false when evaluation failed
    pub result: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConditionTrace {
    /// Create a trace for an evaluated condition
    pub fn new(index: usize, condition: &Condition, actual: Option<Value>, result: bool) -> Self {
        Self {
            index,
            expression: condition.describe(),
            kind: condition.kind,
            operator: condition.operator,
            expected: condition.value.clone(),
            actual,
            negated: condition.negate,
            result,
            error: None,
        }
    }

    /// Create a trace for a condition whose evaluation failed
    pub fn failed(index: usize, condition: &Condition, actual: Option<Value>, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(index, condition, actual, false)
        }
    }
}

/// Trace of a single rule evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTrace {
    pub rule_name: String,

    pub priority: i32,

    /// Whether all conditions held
    pub matched: bool,

    /// Condition traces, in rule order. On the fast path this stops at the
    /// first failing condition.
    pub conditions: Vec<ConditionTrace>,

    /// Rule-level evaluation error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Evaluation time in microseconds
    pub evaluation_time_us: u64,
}

impl RuleTrace {
    pub fn new(rule_name: impl Into<String>, priority: i32) -> Self {
        Self {
            rule_name: rule_name.into(),
            priority,
            matched: false,
            conditions: Vec::new(),
            error: None,
            evaluation_time_us: 0,
        }
    }

    /// Per-condition results, in rule order
    pub fn per_condition(&self) -> Vec<bool> {
        self.conditions.iter().map(|c| c.result).collect()
    }
}

/// Structured error entry attached to a routing result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationDiagnostic {
    pub rule_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_index: Option<usize>,

    pub message: String,
}

impl EvaluationDiagnostic {
    pub fn new(rule_name: impl Into<String>, condition_index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            condition_index,
            message: message.into(),
        }
    }
}
