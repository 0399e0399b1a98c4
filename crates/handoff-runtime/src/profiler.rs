//! Rule testing and profiling
//!
//! Diagnostics for rule authors. Nothing here reads or writes the registry
//! or the result cache.

use crate::clock::Clock;
use crate::evaluator::EvaluationScope;
use crate::matcher::RuleMatcher;
use crate::result::ConditionTrace;
use handoff_core::{EvaluationContext, HandoffDecision, RequestMetadata, RoutingRule, RuleAction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Result of testing a single rule in isolation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTestReport {
    pub rule_name: String,
    pub priority: i32,
    pub enabled: bool,
    pub matched: bool,
    /// Every condition, evaluated without short-circuit
    pub conditions: Vec<ConditionTrace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Load-time validation failure, if the rule would be rejected by a registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
    /// Actions that would run on a match
    pub actions: Vec<RuleAction>,
    pub evaluation_time_us: u64,
}

impl RuleTestReport {
    pub fn per_condition(&self) -> Vec<bool> {
        self.conditions.iter().map(|c| c.result).collect()
    }
}

/// Cost of one rule within a profile run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleProfile {
    pub name: String,
    pub priority: i32,
    pub matched: bool,
    pub ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Comparative cost of a rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReport {
    pub total_ms: f64,
    pub per_rule: Vec<RuleProfile>,
    /// The rule first-match-wins would pick
    pub first_match: Option<String>,
}

impl ProfileReport {
    /// Rules ordered from most to least expensive
    pub fn slowest(&self) -> Vec<&RuleProfile> {
        let mut rules: Vec<_> = self.per_rule.iter().collect();
        rules.sort_by(|a, b| b.ms.total_cmp(&a.ms));
        rules
    }
}

/// Runs rules outside the normal priority walk
#[derive(Clone)]
pub struct RuleProfiler {
    matcher: RuleMatcher,
    clock: Arc<dyn Clock>,
}

impl RuleProfiler {
    pub fn new(matcher: RuleMatcher, clock: Arc<dyn Clock>) -> Self {
        Self { matcher, clock }
    }

    /// Evaluate one rule with full per-condition detail.
    ///
    /// Disabled rules are evaluated too; the report carries the flag.
    pub fn test_rule(
        &self,
        rule: &RoutingRule,
        context: &EvaluationContext,
        decision: &HandoffDecision,
        metadata: &RequestMetadata,
    ) -> RuleTestReport {
        let now = self.matcher.evaluator().time_of_day(self.clock.as_ref());
        let scope = EvaluationScope::new(context, decision, metadata, now);
        let outcome = self.matcher.matches_exhaustive(rule, &scope);

        RuleTestReport {
            rule_name: rule.name.clone(),
            priority: rule.priority,
            enabled: rule.enabled,
            matched: outcome.matched,
            conditions: outcome.conditions,
            error: outcome.error.map(|e| e.message),
            validation_error: rule.validate().err().map(|e| e.to_string()),
            actions: rule.actions.clone(),
            evaluation_time_us: outcome.evaluation_time_us,
        }
    }

    /// Evaluate every enabled rule, ignoring first-match-wins.
    ///
    /// Rules are run in priority order (stable for ties), so `first_match`
    /// agrees with what the engine would pick for the same rule list.
    pub fn profile(
        &self,
        rules: &[RoutingRule],
        context: &EvaluationContext,
        decision: &HandoffDecision,
        metadata: &RequestMetadata,
    ) -> ProfileReport {
        let start = Instant::now();
        let now = self.matcher.evaluator().time_of_day(self.clock.as_ref());
        let scope = EvaluationScope::new(context, decision, metadata, now);

        let mut ordered: Vec<&RoutingRule> = rules.iter().filter(|r| r.enabled).collect();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut first_match = None;
        let per_rule = ordered
            .into_iter()
            .map(|rule| {
                let rule_start = Instant::now();
                let outcome = self.matcher.matches_exhaustive(rule, &scope);
                let ms = rule_start.elapsed().as_secs_f64() * 1000.0;

                if outcome.matched && first_match.is_none() {
                    first_match = Some(rule.name.clone());
                }

                RuleProfile {
                    name: rule.name.clone(),
                    priority: rule.priority,
                    matched: outcome.matched,
                    ms,
                    error: outcome.error.map(|e| e.message),
                }
            })
            .collect();

        ProfileReport {
            total_ms: start.elapsed().as_secs_f64() * 1000.0,
            per_rule,
            first_match,
        }
    }
}
