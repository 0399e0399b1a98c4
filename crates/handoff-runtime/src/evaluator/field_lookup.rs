//! Field Lookup Utilities
//!
//! Resolves a [`FieldRef`] against the evaluation inputs. Map-backed fields
//! accept dot-notation paths into nested objects (`address.country`) when no
//! key with the literal dotted name exists.

use super::EvaluationScope;
use handoff_core::{FieldRef, MessageField, TriggerField, Value};
use std::collections::HashMap;

/// Resolve a field, returning `None` when it is absent or null
pub(super) fn resolve(field: &FieldRef, scope: &EvaluationScope<'_>) -> Option<Value> {
    let value = match field {
        FieldRef::Message(message_field) => resolve_message(*message_field, scope),
        FieldRef::UserAttribute(name) => get_nested_value(&scope.context.user_attributes, name),
        FieldRef::ContextField(name) => get_nested_value(&scope.context.metadata, name),
        FieldRef::Entity(name) => get_nested_value(&scope.context.entities, name),
        FieldRef::Metadata(name) => get_nested_value(scope.metadata, name),
        FieldRef::Trigger(trigger_field) => resolve_trigger(trigger_field, scope),
        FieldRef::Clock => Some(Value::String(scope.now.to_string())),
    };

    value.filter(|v| !v.is_null())
}

fn resolve_message(field: MessageField, scope: &EvaluationScope<'_>) -> Option<Value> {
    let messages = &scope.context.messages;
    match field {
        MessageField::Content => messages.last().map(|m| Value::String(m.content.clone())),
        MessageField::Speaker => messages.last().map(|m| Value::String(m.speaker.clone())),
        MessageField::Timestamp => messages
            .last()
            .map(|m| Value::String(m.timestamp.to_rfc3339())),
        MessageField::Length => messages
            .last()
            .map(|m| Value::Number(m.content.chars().count() as f64)),
        MessageField::Conversation => {
            if messages.is_empty() {
                None
            } else {
                let joined: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
                Some(Value::String(joined.join("\n")))
            }
        }
        MessageField::MessageCount => Some(Value::Number(messages.len() as f64)),
    }
}

fn resolve_trigger(field: &TriggerField, scope: &EvaluationScope<'_>) -> Option<Value> {
    let decision = scope.decision;
    match field {
        TriggerField::ShouldHandoff => Some(Value::Bool(decision.should_handoff)),
        TriggerField::Confidence => Some(Value::Number(decision.confidence)),
        TriggerField::Priority => decision
            .priority
            .map(|p| Value::String(p.as_str().to_string())),
        TriggerField::Reason => decision.reason.clone().map(Value::String),
        TriggerField::TriggerType => decision.trigger_type.clone().map(Value::String),
        TriggerField::Named(name) => get_nested_value(&decision.trigger_results, name),
    }
}

/// Get a value by key, falling back to a dotted path through nested objects
pub(super) fn get_nested_value(data: &HashMap<String, Value>, key: &str) -> Option<Value> {
    if let Some(value) = data.get(key) {
        return Some(value.clone());
    }

    let mut parts = key.split('.');
    let first = parts.next()?;
    let mut current = data.get(first)?;
    for part in parts {
        match current {
            Value::Object(map) => {
                current = map.get(part)?;
            }
            _ => {
                tracing::debug!("Cannot access nested field '{}' on non-object", key);
                return None;
            }
        }
    }
    Some(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_data() -> HashMap<String, Value> {
        let mut data = HashMap::new();
        data.insert("name".to_string(), Value::String("Alice".to_string()));

        let mut address = HashMap::new();
        address.insert("country".to_string(), Value::String("DE".to_string()));
        data.insert("address".to_string(), Value::Object(address));

        data.insert("plan.tier".to_string(), Value::String("gold".to_string()));
        data
    }

    #[test]
    fn test_simple_key() {
        let data = create_test_data();
        assert_eq!(
            get_nested_value(&data, "name"),
            Some(Value::String("Alice".to_string()))
        );
        assert_eq!(get_nested_value(&data, "missing"), None);
    }

    #[test]
    fn test_nested_path() {
        let data = create_test_data();
        assert_eq!(
            get_nested_value(&data, "address.country"),
            Some(Value::String("DE".to_string()))
        );
        assert_eq!(get_nested_value(&data, "address.city"), None);
        assert_eq!(get_nested_value(&data, "name.first"), None);
    }

    #[test]
    fn test_literal_dotted_key_wins() {
        let data = create_test_data();
        assert_eq!(
            get_nested_value(&data, "plan.tier"),
            Some(Value::String("gold".to_string()))
        );
    }
}
