//! Rule action definitions
//!
//! Actions are pure data. Each kind carries its own typed parameters so a
//! missing key is caught while the rule file is deserialized, and an empty
//! one by [`RuleAction::validate`] before the rule reaches a registry.

use crate::error::{CoreError, Result};
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handoff priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "LOW")]
    Low,
    #[serde(alias = "MEDIUM")]
    Medium,
    #[serde(alias = "HIGH")]
    High,
    #[serde(alias = "URGENT")]
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing destination. Exactly one per decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Assignment {
    Agent(String),
    Queue(String),
    Department(String),
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assignment::Agent(id) => write!(f, "agent:{}", id),
            Assignment::Queue(id) => write!(f, "queue:{}", id),
            Assignment::Department(name) => write!(f, "department:{}", name),
        }
    }
}

/// A data-only instruction to mutate a decision/metadata pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleAction {
    AssignToAgent {
        agent_id: String,
    },
    AssignToQueue {
        queue_id: String,
    },
    AssignToDepartment {
        department: String,
    },
    SetPriority {
        priority: Priority,
    },
    AddTags {
        tags: Vec<String>,
    },
    RemoveTags {
        tags: Vec<String>,
    },
    SetCustomField {
        key: String,
        value: Value,
    },
    /// Terminal marker: the caller skips normal assignment
    RouteToFallback {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl RuleAction {
    pub fn assign_agent(agent_id: impl Into<String>) -> Self {
        RuleAction::AssignToAgent {
            agent_id: agent_id.into(),
        }
    }

    pub fn assign_queue(queue_id: impl Into<String>) -> Self {
        RuleAction::AssignToQueue {
            queue_id: queue_id.into(),
        }
    }

    pub fn assign_department(department: impl Into<String>) -> Self {
        RuleAction::AssignToDepartment {
            department: department.into(),
        }
    }

    pub fn set_priority(priority: Priority) -> Self {
        RuleAction::SetPriority { priority }
    }

    pub fn add_tags<S: Into<String>>(tags: impl IntoIterator<Item = S>) -> Self {
        RuleAction::AddTags {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remove_tags<S: Into<String>>(tags: impl IntoIterator<Item = S>) -> Self {
        RuleAction::RemoveTags {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn set_custom_field(key: impl Into<String>, value: impl Into<Value>) -> Self {
        RuleAction::SetCustomField {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn route_to_fallback(reason: Option<String>) -> Self {
        RuleAction::RouteToFallback { reason }
    }

    /// Serialized type tag, used in diagnostics
    pub fn action_type(&self) -> &'static str {
        match self {
            RuleAction::AssignToAgent { .. } => "assign_to_agent",
            RuleAction::AssignToQueue { .. } => "assign_to_queue",
            RuleAction::AssignToDepartment { .. } => "assign_to_department",
            RuleAction::SetPriority { .. } => "set_priority",
            RuleAction::AddTags { .. } => "add_tags",
            RuleAction::RemoveTags { .. } => "remove_tags",
            RuleAction::SetCustomField { .. } => "set_custom_field",
            RuleAction::RouteToFallback { .. } => "route_to_fallback",
        }
    }

    /// Whether this action writes the assignment field
    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            RuleAction::AssignToAgent { .. }
                | RuleAction::AssignToQueue { .. }
                | RuleAction::AssignToDepartment { .. }
        )
    }

    /// Reject empty identifiers, empty tag lists and blank keys
    pub fn validate(&self) -> Result<()> {
        let blank = |param: &str| {
            CoreError::ActionParameter(format!("{}: '{}' must not be empty", self.action_type(), param))
        };

        match self {
            RuleAction::AssignToAgent { agent_id } if agent_id.trim().is_empty() => {
                Err(blank("agent_id"))
            }
            RuleAction::AssignToQueue { queue_id } if queue_id.trim().is_empty() => {
                Err(blank("queue_id"))
            }
            RuleAction::AssignToDepartment { department } if department.trim().is_empty() => {
                Err(blank("department"))
            }
            RuleAction::AddTags { tags } | RuleAction::RemoveTags { tags } => {
                if tags.is_empty() || tags.iter().any(|t| t.trim().is_empty()) {
                    Err(blank("tags"))
                } else {
                    Ok(())
                }
            }
            RuleAction::SetCustomField { key, .. } if key.trim().is_empty() => Err(blank("key")),
            _ => Ok(()),
        }
    }
}
