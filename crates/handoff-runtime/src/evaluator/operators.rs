//! Operator execution
//!
//! Every function here receives a resolved, non-null field value. String
//! comparisons fold case unless the condition asks for case-sensitivity.

use handoff_core::{CoreError, Result, Value};
use regex::Regex;

/// Equality with light coercion between numbers, numeric strings and booleans
pub(super) fn values_equal(actual: &Value, expected: &Value, case_sensitive: bool) -> bool {
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => text_eq(a, b, case_sensitive),
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            s.trim().parse::<f64>().map(|parsed| parsed == *n).unwrap_or(false)
        }
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
            s.trim().eq_ignore_ascii_case(if *b { "true" } else { "false" })
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|(x, y)| values_equal(x, y, case_sensitive))
        }
        _ => false,
    }
}

fn text_eq(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

fn fold(s: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        s.to_string()
    } else {
        s.to_lowercase()
    }
}

/// Text view of a scalar field for substring and regex operators
fn field_text(actual: &Value, op: &str) -> Result<String> {
    match actual {
        Value::String(s) => Ok(s.clone()),
        Value::Number(_) | Value::Bool(_) => Ok(actual.to_display_string()),
        other => Err(CoreError::ConditionType(format!(
            "{} cannot be applied to a field of type {}",
            op,
            other.type_name()
        ))),
    }
}

/// The needle(s) of a string operator: a string or an array of strings
fn needles(expected: &Value, op: &str) -> Result<Vec<String>> {
    match expected {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    CoreError::ConditionType(format!("{} list entries must be strings", op))
                })
            })
            .collect(),
        other => Err(CoreError::ConditionType(format!(
            "{} requires a string value, got {}",
            op,
            other.type_name()
        ))),
    }
}

/// CONTAINS: substring of a text field, or element of an array field.
/// An array of needles matches when any one of them does.
pub(super) fn contains(actual: &Value, expected: &Value, case_sensitive: bool) -> Result<bool> {
    let wanted = needles(expected, "CONTAINS")?;
    if let Value::Array(items) = actual {
        return Ok(items.iter().any(|item| {
            wanted
                .iter()
                .any(|w| values_equal(item, &Value::String(w.clone()), case_sensitive))
        }));
    }

    let haystack = fold(&field_text(actual, "CONTAINS")?, case_sensitive);
    Ok(wanted
        .iter()
        .any(|w| haystack.contains(&fold(w, case_sensitive))))
}

pub(super) fn starts_with(actual: &Value, expected: &Value, case_sensitive: bool) -> Result<bool> {
    let wanted = needles(expected, "STARTS_WITH")?;
    let text = fold(&field_text(actual, "STARTS_WITH")?, case_sensitive);
    Ok(wanted
        .iter()
        .any(|w| text.starts_with(&fold(w, case_sensitive))))
}

pub(super) fn ends_with(actual: &Value, expected: &Value, case_sensitive: bool) -> Result<bool> {
    let wanted = needles(expected, "ENDS_WITH")?;
    let text = fold(&field_text(actual, "ENDS_WITH")?, case_sensitive);
    Ok(wanted
        .iter()
        .any(|w| text.ends_with(&fold(w, case_sensitive))))
}

/// Unanchored regex search
pub(super) fn regex_matches(actual: &Value, pattern: &Regex) -> Result<bool> {
    let text = field_text(actual, "REGEX_MATCHES")?;
    Ok(pattern.is_match(&text))
}

fn as_number(actual: &Value) -> Result<f64> {
    actual.as_f64().ok_or_else(|| {
        CoreError::ConditionType(format!(
            "cannot compare {} value '{}' numerically",
            actual.type_name(),
            actual
        ))
    })
}

fn expected_number(expected: &Value) -> Result<f64> {
    match expected {
        Value::Number(n) => Ok(*n),
        other => Err(CoreError::ConditionType(format!(
            "numeric operator requires a number, got {}",
            other.type_name()
        ))),
    }
}

/// Numeric comparison with `cmp(actual, expected)`
pub(super) fn compare_numbers(
    actual: &Value,
    expected: &Value,
    cmp: impl Fn(f64, f64) -> bool,
) -> Result<bool> {
    Ok(cmp(as_number(actual)?, expected_number(expected)?))
}

/// Inclusive `[lo, hi]` range check
pub(super) fn in_range(actual: &Value, expected: &Value) -> Result<bool> {
    let bounds = match expected {
        Value::Array(items) if items.len() == 2 => {
            (expected_number(&items[0])?, expected_number(&items[1])?)
        }
        _ => {
            return Err(CoreError::ConditionType(
                "IN_RANGE requires a [low, high] pair of numbers".to_string(),
            ))
        }
    };
    let n = as_number(actual)?;
    Ok(bounds.0 <= n && n <= bounds.1)
}

/// Membership in a list. An array field matches when any element is listed.
pub(super) fn in_list(actual: &Value, expected: &Value, case_sensitive: bool) -> Result<bool> {
    let list = match expected {
        Value::Array(items) => items,
        other => {
            return Err(CoreError::ConditionType(format!(
                "IN_LIST requires an array, got {}",
                other.type_name()
            )))
        }
    };

    let member = |v: &Value| list.iter().any(|item| values_equal(v, item, case_sensitive));
    Ok(match actual {
        Value::Array(items) => items.iter().any(member),
        other => member(other),
    })
}
