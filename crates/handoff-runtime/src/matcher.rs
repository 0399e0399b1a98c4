//! Rule matching
//!
//! A rule matches when every condition holds. The fast path stops at the
//! first condition that fails or errors; the exhaustive path evaluates every
//! condition so rule authors see the full picture.

use crate::error::RuntimeError;
use crate::evaluator::{ConditionEvaluator, EvaluationScope};
use crate::result::{ConditionTrace, EvaluationDiagnostic, RuleTrace};
use handoff_core::RoutingRule;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of matching one rule
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub matched: bool,
    pub conditions: Vec<ConditionTrace>,
    /// First evaluation error, if any. A rule with an error never matches.
    pub error: Option<EvaluationDiagnostic>,
    pub evaluation_time_us: u64,
}

impl MatchResult {
    /// Per-condition results, in rule order
    pub fn per_condition(&self) -> Vec<bool> {
        self.conditions.iter().map(|c| c.result).collect()
    }

    /// Convert into a rule trace
    pub fn into_trace(self, rule: &RoutingRule) -> RuleTrace {
        RuleTrace {
            rule_name: rule.name.clone(),
            priority: rule.priority,
            matched: self.matched,
            conditions: self.conditions,
            error: self.error.map(|e| e.message),
            evaluation_time_us: self.evaluation_time_us,
        }
    }
}

/// Evaluates a rule's conditions with AND semantics
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    evaluator: Arc<ConditionEvaluator>,
}

impl RuleMatcher {
    pub fn new(evaluator: Arc<ConditionEvaluator>) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &Arc<ConditionEvaluator> {
        &self.evaluator
    }

    /// Fast path: stop at the first failing condition
    pub fn matches(&self, rule: &RoutingRule, scope: &EvaluationScope<'_>) -> MatchResult {
        self.run(rule, scope, true)
    }

    /// Diagnostic path: evaluate every condition
    pub fn matches_exhaustive(&self, rule: &RoutingRule, scope: &EvaluationScope<'_>) -> MatchResult {
        self.run(rule, scope, false)
    }

    fn run(&self, rule: &RoutingRule, scope: &EvaluationScope<'_>, short_circuit: bool) -> MatchResult {
        let start = Instant::now();
        let mut conditions = Vec::with_capacity(rule.conditions.len());
        let mut error = None;
        let mut all_true = true;

        for (index, condition) in rule.conditions.iter().enumerate() {
            let outcome = self.evaluator.evaluate_detailed(condition, scope);
            match outcome.result {
                Ok(result) => {
                    conditions.push(ConditionTrace::new(index, condition, outcome.actual, result));
                    if !result {
                        all_true = false;
                        if short_circuit {
                            break;
                        }
                    }
                }
                Err(source) => {
                    let message = source.to_string();
                    let err = RuntimeError::Evaluation {
                        rule: rule.name.clone(),
                        condition_index: index,
                        source,
                    };
                    tracing::warn!("{}, treating rule as non-matching", err);
                    conditions.push(ConditionTrace::failed(
                        index,
                        condition,
                        outcome.actual,
                        message,
                    ));
                    all_true = false;
                    if error.is_none() {
                        error = err.diagnostic();
                    }
                    if short_circuit {
                        break;
                    }
                }
            }
        }

        MatchResult {
            matched: all_true && error.is_none(),
            conditions,
            error,
            evaluation_time_us: start.elapsed().as_micros() as u64,
        }
    }
}

impl Default for RuleMatcher {
    fn default() -> Self {
        Self::new(Arc::new(ConditionEvaluator::new()))
    }
}
