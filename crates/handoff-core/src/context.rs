//! Evaluation inputs
//!
//! The context and the upstream decision are produced by collaborators
//! outside the routing engine. The engine only reads them; the action
//! executor produces a new decision/metadata pair from copies.

use crate::action::{Assignment, Priority};
use crate::types::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Free-form request metadata passed alongside the context
pub type RequestMetadata = HashMap<String, Value>;

/// A single conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,

    /// Who sent the message ("user", "assistant", ...)
    #[serde(default = "default_speaker", alias = "role")]
    pub speaker: String,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

fn default_speaker() -> String {
    "user".to_string()
}

impl Message {
    pub fn new(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            speaker: speaker.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Read-only conversation context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    #[serde(default)]
    pub conversation_id: String,

    /// Messages, oldest first
    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default)]
    pub user_attributes: HashMap<String, Value>,

    /// Entities extracted from the conversation
    #[serde(default)]
    pub entities: HashMap<String, Value>,

    /// Conversation metadata (sentiment score, failure count, ...)
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl EvaluationContext {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_user_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.user_attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_entity(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entities.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Most recent message, if any
    pub fn latest_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// The upstream handoff decision, augmented by rule actions.
///
/// Missing fields take their values from [`HandoffDecision::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffDecision {
    pub should_handoff: bool,
    pub confidence: f64,
    pub priority: Option<Priority>,
    pub reason: Option<String>,

    /// Name of the upstream trigger that produced this decision
    pub trigger_type: Option<String>,

    /// Results of individual upstream triggers
    pub trigger_results: HashMap<String, Value>,

    pub assignment: Option<Assignment>,
    pub tags: BTreeSet<String>,

    /// Set by `route_to_fallback`; the caller skips normal assignment
    pub route_to_fallback: bool,

    pub fallback_reason: Option<String>,
}

impl HandoffDecision {
    pub fn new(should_handoff: bool, confidence: f64) -> Self {
        Self {
            should_handoff,
            confidence,
            priority: None,
            reason: None,
            trigger_type: None,
            trigger_results: HashMap::new(),
            assignment: None,
            tags: BTreeSet::new(),
            route_to_fallback: false,
            fallback_reason: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_trigger_type(mut self, trigger_type: impl Into<String>) -> Self {
        self.trigger_type = Some(trigger_type.into());
        self
    }

    pub fn with_trigger_result(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.trigger_results.insert(name.into(), value.into());
        self
    }
}

impl Default for HandoffDecision {
    fn default() -> Self {
        Self::new(true, 1.0)
    }
}
