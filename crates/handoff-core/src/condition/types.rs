//! Condition definitions

use super::field::FieldRef;
use super::time::{TimeOfDay, TimeWindow};
use crate::error::{CoreError, Result};
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the evaluation inputs a condition reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    MessageContent,
    UserAttribute,
    ContextField,
    Entity,
    Metadata,
    TriggerResult,
    TimeBased,
}

impl ConditionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::MessageContent => "message_content",
            ConditionKind::UserAttribute => "user_attribute",
            ConditionKind::ContextField => "context_field",
            ConditionKind::Entity => "entity",
            ConditionKind::Metadata => "metadata",
            ConditionKind::TriggerResult => "trigger_result",
            ConditionKind::TimeBased => "time_based",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    RegexMatches,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    /// Inclusive `[lo, hi]` numeric bound
    InRange,
    InList,
    NotInList,
    IsTrue,
    IsFalse,
    Exists,
    NotExists,
    /// now < HH:MM
    Before,
    /// now >= HH:MM
    After,
    /// now in [HH:MM, HH:MM), wrapping across midnight when start > end
    Between,
}

impl ConditionOperator {
    pub fn is_existence(&self) -> bool {
        matches!(self, ConditionOperator::Exists | ConditionOperator::NotExists)
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self,
            ConditionOperator::Contains
                | ConditionOperator::NotContains
                | ConditionOperator::StartsWith
                | ConditionOperator::EndsWith
                | ConditionOperator::RegexMatches
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ConditionOperator::GreaterThan
                | ConditionOperator::LessThan
                | ConditionOperator::GreaterEqual
                | ConditionOperator::LessEqual
                | ConditionOperator::InRange
        )
    }

    pub fn is_time(&self) -> bool {
        matches!(
            self,
            ConditionOperator::Before | ConditionOperator::After | ConditionOperator::Between
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Equals => "EQUALS",
            ConditionOperator::NotEquals => "NOT_EQUALS",
            ConditionOperator::Contains => "CONTAINS",
            ConditionOperator::NotContains => "NOT_CONTAINS",
            ConditionOperator::StartsWith => "STARTS_WITH",
            ConditionOperator::EndsWith => "ENDS_WITH",
            ConditionOperator::RegexMatches => "REGEX_MATCHES",
            ConditionOperator::GreaterThan => "GREATER_THAN",
            ConditionOperator::LessThan => "LESS_THAN",
            ConditionOperator::GreaterEqual => "GREATER_EQUAL",
            ConditionOperator::LessEqual => "LESS_EQUAL",
            ConditionOperator::InRange => "IN_RANGE",
            ConditionOperator::InList => "IN_LIST",
            ConditionOperator::NotInList => "NOT_IN_LIST",
            ConditionOperator::IsTrue => "IS_TRUE",
            ConditionOperator::IsFalse => "IS_FALSE",
            ConditionOperator::Exists => "EXISTS",
            ConditionOperator::NotExists => "NOT_EXISTS",
            ConditionOperator::Before => "BEFORE",
            ConditionOperator::After => "AFTER",
            ConditionOperator::Between => "BETWEEN",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single typed predicate over one field of the evaluation context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Condition kind
    #[serde(rename = "type", alias = "kind")]
    pub kind: ConditionKind,

    /// Field name within the kind's sub-structure (ignored for time-based)
    #[serde(default)]
    pub field: String,

    pub operator: ConditionOperator,

    /// Comparison value
    #[serde(default)]
    pub value: Value,

    /// Invert the final result
    #[serde(default)]
    pub negate: bool,

    /// String comparisons and regexes are case-insensitive unless set
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Condition {
    /// Create a new condition
    pub fn new(
        kind: ConditionKind,
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            kind,
            field: field.into(),
            operator,
            value: value.into(),
            negate: false,
            case_sensitive: false,
        }
    }

    /// Time-based condition on the evaluation clock
    pub fn time(operator: ConditionOperator, value: impl Into<Value>) -> Self {
        Self::new(ConditionKind::TimeBased, "", operator, value)
    }

    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// Resolve the field reference this condition reads
    pub fn field_ref(&self) -> Result<FieldRef> {
        FieldRef::resolve(self.kind, &self.field)
    }

    /// Human-readable rendering, e.g. `user.tier EQUALS vip`
    pub fn describe(&self) -> String {
        let field = self
            .field_ref()
            .map(|f| f.to_string())
            .unwrap_or_else(|_| format!("{}.{}", self.kind, self.field));
        let base = if self.operator.is_existence() {
            format!("{} {}", field, self.operator)
        } else {
            format!("{} {} {}", field, self.operator, self.value)
        };
        if self.negate {
            format!("NOT ({})", base)
        } else {
            base
        }
    }

    /// Full load-time validation: field reference, kind/operator pairing,
    /// operand shape and regex compilation.
    pub fn validate(&self) -> Result<()> {
        self.field_ref()?;
        self.check_operand()?;

        if self.operator == ConditionOperator::RegexMatches {
            if let Value::String(pattern) = &self.value {
                regex::RegexBuilder::new(pattern)
                    .case_insensitive(!self.case_sensitive)
                    .build()
                    .map_err(|e| {
                        CoreError::InvalidCondition(format!("invalid regex '{}': {}", pattern, e))
                    })?;
            }
        }

        Ok(())
    }

    /// Time operators read the clock, so they pair only with `time_based`,
    /// which in turn accepts nothing but time and existence operators.
    pub fn check_pairing(&self) -> Result<()> {
        let time_kind = self.kind == ConditionKind::TimeBased;
        if time_kind && !(self.operator.is_time() || self.operator.is_existence()) {
            return Err(CoreError::ConditionType(format!(
                "time_based conditions only support BEFORE, AFTER, BETWEEN, EXISTS and NOT_EXISTS, got {}",
                self.operator
            )));
        }
        if self.operator.is_time() && !time_kind {
            return Err(CoreError::ConditionType(format!(
                "{} is only valid on time_based conditions, not {}",
                self.operator, self.kind
            )));
        }
        Ok(())
    }

    /// Check that the comparison value has the shape the operator needs.
    ///
    /// Runs at load time through [`Condition::validate`] and again at
    /// evaluation time so programmatically built rules get the same errors.
    pub fn check_operand(&self) -> Result<()> {
        self.check_pairing()?;

        let op = self.operator;
        let mismatch = |expected: &str| {
            CoreError::ConditionType(format!(
                "{} requires {}, got {}",
                op,
                expected,
                self.value.type_name()
            ))
        };

        match op {
            ConditionOperator::RegexMatches => match &self.value {
                Value::String(_) => Ok(()),
                _ => Err(mismatch("a string pattern")),
            },
            ConditionOperator::Contains
            | ConditionOperator::NotContains
            | ConditionOperator::StartsWith
            | ConditionOperator::EndsWith => match &self.value {
                Value::String(_) => Ok(()),
                Value::Array(items)
                    if !items.is_empty() && items.iter().all(|v| v.as_str().is_some()) =>
                {
                    Ok(())
                }
                _ => Err(mismatch("a string or a non-empty array of strings")),
            },
            ConditionOperator::GreaterThan
            | ConditionOperator::LessThan
            | ConditionOperator::GreaterEqual
            | ConditionOperator::LessEqual => match &self.value {
                Value::Number(_) => Ok(()),
                _ => Err(mismatch("a number")),
            },
            ConditionOperator::InRange => match &self.value {
                Value::Array(items) if items.len() == 2 => {
                    match (&items[0], &items[1]) {
                        (Value::Number(lo), Value::Number(hi)) if lo <= hi => Ok(()),
                        (Value::Number(lo), Value::Number(hi)) => Err(CoreError::ConditionType(
                            format!("IN_RANGE lower bound {} exceeds upper bound {}", lo, hi),
                        )),
                        _ => Err(mismatch("a [low, high] pair of numbers")),
                    }
                }
                _ => Err(mismatch("a [low, high] pair of numbers")),
            },
            ConditionOperator::InList | ConditionOperator::NotInList => match &self.value {
                Value::Array(_) => Ok(()),
                _ => Err(mismatch("an array")),
            },
            ConditionOperator::Equals | ConditionOperator::NotEquals => match &self.value {
                Value::Object(_) => Err(mismatch("a scalar or array")),
                _ => Ok(()),
            },
            ConditionOperator::Before | ConditionOperator::After => {
                TimeOfDay::from_value(&self.value).map(|_| ())
            }
            ConditionOperator::Between => TimeWindow::from_value(&self.value).map(|_| ()),
            ConditionOperator::IsTrue
            | ConditionOperator::IsFalse
            | ConditionOperator::Exists
            | ConditionOperator::NotExists => Ok(()),
        }
    }
}
