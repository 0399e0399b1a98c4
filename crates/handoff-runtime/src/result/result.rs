//! Routing result

use super::trace::{EvaluationDiagnostic, RuleTrace};
use handoff_core::RuleAction;
use serde::{Deserialize, Serialize};

/// Output of one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    /// Name of the matched rule, `None` when nothing matched
    pub matched_rule: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_priority: Option<i32>,

    /// Actions of the matched rule, in rule order
    pub actions: Vec<RuleAction>,

    /// Traces of every rule evaluated, in evaluation order
    pub rule_traces: Vec<RuleTrace>,

    /// Rule-scoped errors encountered during the walk
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EvaluationDiagnostic>,

    /// Registry version the result was computed against
    pub registry_version: u64,

    /// Served from the result cache
    #[serde(default)]
    pub cache_hit: bool,

    /// Total evaluation latency in microseconds
    pub evaluation_time_us: u64,
}

impl RoutingResult {
    /// A result with no match
    pub fn no_match(registry_version: u64) -> Self {
        Self {
            matched_rule: None,
            matched_priority: None,
            actions: Vec::new(),
            rule_traces: Vec::new(),
            errors: Vec::new(),
            registry_version,
            cache_hit: false,
            evaluation_time_us: 0,
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched_rule.is_some()
    }

    /// Evaluation latency in milliseconds
    pub fn evaluation_time_ms(&self) -> f64 {
        self.evaluation_time_us as f64 / 1000.0
    }

    /// Compare everything except cache provenance and timing
    pub fn same_outcome(&self, other: &RoutingResult) -> bool {
        let strip = |traces: &[RuleTrace]| -> Vec<RuleTrace> {
            traces
                .iter()
                .cloned()
                .map(|mut t| {
                    t.evaluation_time_us = 0;
                    t
                })
                .collect()
        };

        self.matched_rule == other.matched_rule
            && self.matched_priority == other.matched_priority
            && self.actions == other.actions
            && self.errors == other.errors
            && self.registry_version == other.registry_version
            && strip(&self.rule_traces) == strip(&other.rule_traces)
    }
}
