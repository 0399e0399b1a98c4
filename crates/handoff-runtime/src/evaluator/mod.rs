//! Condition evaluation
//!
//! [`ConditionEvaluator::evaluate`] is a pure function of a condition and an
//! [`EvaluationScope`]. It fails with [`CoreError::FieldNotFound`] when the
//! referenced field is absent and the operator is not an existence check,
//! and with [`CoreError::ConditionType`] when the operator cannot be applied
//! to the field or comparison value.

mod field_lookup;
mod operators;

use chrono::{FixedOffset, Offset, Utc};
use dashmap::DashMap;
use handoff_core::{
    Condition, ConditionOperator, CoreError, EvaluationContext, HandoffDecision, RequestMetadata,
    Result, TimeOfDay, TimeWindow, Value,
};
use regex::{Regex, RegexBuilder};

use crate::clock::Clock;

/// Everything a condition may read during one evaluation.
///
/// The time of day is captured once so every rule in a request sees the
/// same clock reading.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationScope<'a> {
    pub context: &'a EvaluationContext,
    pub decision: &'a HandoffDecision,
    pub metadata: &'a RequestMetadata,
    pub now: TimeOfDay,
}

impl<'a> EvaluationScope<'a> {
    pub fn new(
        context: &'a EvaluationContext,
        decision: &'a HandoffDecision,
        metadata: &'a RequestMetadata,
        now: TimeOfDay,
    ) -> Self {
        Self {
            context,
            decision,
            metadata,
            now,
        }
    }
}

/// Outcome of one condition, with the field value it saw
#[derive(Debug, Clone)]
pub struct ConditionOutcome {
    pub actual: Option<Value>,
    pub result: Result<bool>,
}

/// Typed condition evaluator
#[derive(Debug)]
pub struct ConditionEvaluator {
    /// Offset applied to the clock before taking the time of day
    utc_offset: FixedOffset,

    /// Compiled patterns keyed by (case_sensitive, pattern)
    regex_cache: DashMap<(bool, String), Regex>,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self::with_utc_offset(Utc.fix())
    }

    pub fn with_utc_offset(utc_offset: FixedOffset) -> Self {
        Self {
            utc_offset,
            regex_cache: DashMap::new(),
        }
    }

    /// Build from an offset in minutes; out-of-range offsets fall back to UTC
    pub fn with_offset_minutes(minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| {
            tracing::warn!("UTC offset of {} minutes is out of range, using UTC", minutes);
            Utc.fix()
        });
        Self::with_utc_offset(offset)
    }

    /// Current time of day according to `clock`, in the configured offset
    pub fn time_of_day(&self, clock: &dyn Clock) -> TimeOfDay {
        TimeOfDay::from_naive_time(clock.now().with_timezone(&self.utc_offset).time())
    }

    /// Evaluate a condition against the scope
    pub fn evaluate(&self, condition: &Condition, scope: &EvaluationScope<'_>) -> Result<bool> {
        self.evaluate_detailed(condition, scope).result
    }

    /// Evaluate and keep the resolved field value for diagnostics
    pub fn evaluate_detailed(
        &self,
        condition: &Condition,
        scope: &EvaluationScope<'_>,
    ) -> ConditionOutcome {
        let field = match condition.field_ref() {
            Ok(field) => field,
            Err(e) => {
                return ConditionOutcome {
                    actual: None,
                    result: Err(e),
                }
            }
        };

        let actual = field_lookup::resolve(&field, scope);
        let result = self
            .apply_operator(condition, &field.to_string(), actual.as_ref(), scope)
            .map(|raw| raw != condition.negate);

        ConditionOutcome { actual, result }
    }

    fn apply_operator(
        &self,
        condition: &Condition,
        field_name: &str,
        actual: Option<&Value>,
        scope: &EvaluationScope<'_>,
    ) -> Result<bool> {
        let op = condition.operator;
        condition.check_pairing()?;

        // Existence checks never fail on a missing field
        match op {
            ConditionOperator::Exists => return Ok(actual.is_some()),
            ConditionOperator::NotExists => return Ok(actual.is_none()),
            _ => {}
        }

        condition.check_operand()?;
        if op.is_time() {
            return self.evaluate_time(condition, scope.now);
        }

        let actual = actual.ok_or_else(|| CoreError::FieldNotFound(field_name.to_string()))?;
        let expected = &condition.value;
        let cs = condition.case_sensitive;

        match op {
            ConditionOperator::Equals => Ok(operators::values_equal(actual, expected, cs)),
            ConditionOperator::NotEquals => Ok(!operators::values_equal(actual, expected, cs)),
            ConditionOperator::Contains => operators::contains(actual, expected, cs),
            ConditionOperator::NotContains => operators::contains(actual, expected, cs).map(|b| !b),
            ConditionOperator::StartsWith => operators::starts_with(actual, expected, cs),
            ConditionOperator::EndsWith => operators::ends_with(actual, expected, cs),
            ConditionOperator::RegexMatches => {
                let pattern = self.compiled_regex(expected, cs)?;
                operators::regex_matches(actual, &pattern)
            }
            ConditionOperator::GreaterThan => operators::compare_numbers(actual, expected, |a, b| a > b),
            ConditionOperator::LessThan => operators::compare_numbers(actual, expected, |a, b| a < b),
            ConditionOperator::GreaterEqual => {
                operators::compare_numbers(actual, expected, |a, b| a >= b)
            }
            ConditionOperator::LessEqual => operators::compare_numbers(actual, expected, |a, b| a <= b),
            ConditionOperator::InRange => operators::in_range(actual, expected),
            ConditionOperator::InList => operators::in_list(actual, expected, cs),
            ConditionOperator::NotInList => operators::in_list(actual, expected, cs).map(|b| !b),
            ConditionOperator::IsTrue => Ok(actual.is_truthy()),
            ConditionOperator::IsFalse => Ok(!actual.is_truthy()),
            ConditionOperator::Exists
            | ConditionOperator::NotExists
            | ConditionOperator::Before
            | ConditionOperator::After
            | ConditionOperator::Between => Err(CoreError::ConditionType(format!(
                "{} was not dispatched",
                op
            ))),
        }
    }

    fn evaluate_time(&self, condition: &Condition, now: TimeOfDay) -> Result<bool> {
        match condition.operator {
            ConditionOperator::Before => Ok(now < TimeOfDay::from_value(&condition.value)?),
            ConditionOperator::After => Ok(now >= TimeOfDay::from_value(&condition.value)?),
            ConditionOperator::Between => Ok(TimeWindow::from_value(&condition.value)?.contains(now)),
            other => Err(CoreError::ConditionType(format!(
                "{} is not a time operator",
                other
            ))),
        }
    }

    fn compiled_regex(&self, expected: &Value, case_sensitive: bool) -> Result<Regex> {
        let pattern = expected.as_str().ok_or_else(|| {
            CoreError::ConditionType("REGEX_MATCHES requires a string pattern".to_string())
        })?;

        let key = (case_sensitive, pattern.to_string());
        if let Some(regex) = self.regex_cache.get(&key) {
            return Ok(regex.clone());
        }

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| CoreError::InvalidCondition(format!("invalid regex '{}': {}", pattern, e)))?;
        self.regex_cache.insert(key, regex.clone());
        Ok(regex)
    }

    /// Number of compiled patterns currently cached
    pub fn cached_patterns(&self) -> usize {
        self.regex_cache.len()
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
