//! Resolvable field references
//!
//! Every condition kind reads from exactly one sub-structure of the
//! evaluation inputs. The message and trigger kinds only expose a fixed set
//! of fields; the map-backed kinds accept any key.

use super::types::ConditionKind;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields readable by `message_content` conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageField {
    /// Text of the latest message
    Content,
    /// Speaker of the latest message
    Speaker,
    /// RFC 3339 timestamp of the latest message
    Timestamp,
    /// Character count of the latest message
    Length,
    /// All message texts joined by newlines
    Conversation,
    /// Number of messages in the conversation
    MessageCount,
}

impl MessageField {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "content" | "text" | "message" => Some(MessageField::Content),
            "speaker" | "role" => Some(MessageField::Speaker),
            "timestamp" => Some(MessageField::Timestamp),
            "length" => Some(MessageField::Length),
            "conversation" | "all_content" => Some(MessageField::Conversation),
            "message_count" => Some(MessageField::MessageCount),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageField::Content => "content",
            MessageField::Speaker => "speaker",
            MessageField::Timestamp => "timestamp",
            MessageField::Length => "length",
            MessageField::Conversation => "conversation",
            MessageField::MessageCount => "message_count",
        }
    }
}

/// Fields readable by `trigger_result` conditions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerField {
    ShouldHandoff,
    Confidence,
    Priority,
    Reason,
    TriggerType,
    /// Entry of the decision's `trigger_results` map
    Named(String),
}

impl TriggerField {
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "should_handoff" => TriggerField::ShouldHandoff,
            "confidence" => TriggerField::Confidence,
            "priority" => TriggerField::Priority,
            "reason" => TriggerField::Reason,
            "trigger_type" | "trigger" => TriggerField::TriggerType,
            other => TriggerField::Named(other.to_string()),
        }
    }
}

/// Closed reference to the value a condition reads
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldRef {
    Message(MessageField),
    UserAttribute(String),
    ContextField(String),
    Entity(String),
    Metadata(String),
    Trigger(TriggerField),
    Clock,
}

impl FieldRef {
    /// Resolve a `(kind, field)` pair from a rule definition
    pub fn resolve(kind: ConditionKind, field: &str) -> Result<Self> {
        let name = field.trim();
        if kind != ConditionKind::TimeBased && name.is_empty() {
            return Err(CoreError::InvalidCondition(format!(
                "{} condition requires a field name",
                kind
            )));
        }

        Ok(match kind {
            ConditionKind::MessageContent => {
                FieldRef::Message(MessageField::parse(name).ok_or_else(|| {
                    CoreError::InvalidCondition(format!("unknown message field '{}'", name))
                })?)
            }
            ConditionKind::UserAttribute => FieldRef::UserAttribute(name.to_string()),
            ConditionKind::ContextField => FieldRef::ContextField(name.to_string()),
            ConditionKind::Entity => FieldRef::Entity(name.to_string()),
            ConditionKind::Metadata => FieldRef::Metadata(name.to_string()),
            ConditionKind::TriggerResult => FieldRef::Trigger(TriggerField::parse(name)),
            ConditionKind::TimeBased => FieldRef::Clock,
        })
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Message(m) => write!(f, "message.{}", m.as_str()),
            FieldRef::UserAttribute(name) => write!(f, "user.{}", name),
            FieldRef::ContextField(name) => write!(f, "context.{}", name),
            FieldRef::Entity(name) => write!(f, "entity.{}", name),
            FieldRef::Metadata(name) => write!(f, "metadata.{}", name),
            FieldRef::Trigger(TriggerField::Named(name)) => write!(f, "trigger.{}", name),
            FieldRef::Trigger(t) => write!(f, "trigger.{:?}", t),
            FieldRef::Clock => f.write_str("clock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_message_fields() {
        assert_eq!(
            FieldRef::resolve(ConditionKind::MessageContent, "content").unwrap(),
            FieldRef::Message(MessageField::Content)
        );
        assert_eq!(
            FieldRef::resolve(ConditionKind::MessageContent, "Role").unwrap(),
            FieldRef::Message(MessageField::Speaker)
        );
        assert!(FieldRef::resolve(ConditionKind::MessageContent, "subject").is_err());
    }

    #[test]
    fn test_resolve_map_fields() {
        assert_eq!(
            FieldRef::resolve(ConditionKind::UserAttribute, "tier").unwrap(),
            FieldRef::UserAttribute("tier".to_string())
        );
        assert!(FieldRef::resolve(ConditionKind::Entity, "  ").is_err());
    }

    #[test]
    fn test_resolve_trigger_fields() {
        assert_eq!(
            FieldRef::resolve(ConditionKind::TriggerResult, "confidence").unwrap(),
            FieldRef::Trigger(TriggerField::Confidence)
        );
        assert_eq!(
            FieldRef::resolve(ConditionKind::TriggerResult, "sentiment_trigger").unwrap(),
            FieldRef::Trigger(TriggerField::Named("sentiment_trigger".to_string()))
        );
    }

    #[test]
    fn test_time_based_ignores_field() {
        assert_eq!(
            FieldRef::resolve(ConditionKind::TimeBased, "").unwrap(),
            FieldRef::Clock
        );
        assert_eq!(
            FieldRef::resolve(ConditionKind::TimeBased, "anything").unwrap(),
            FieldRef::Clock
        );
    }
}
