//! Action execution
//!
//! Applies a matched rule's actions, in order, to a copy of the decision and
//! request metadata. A malformed action is skipped on its own; the rest of
//! the list still runs.

use handoff_core::{
    Assignment, CoreError, HandoffDecision, RequestMetadata, RuleAction, Value,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Metadata key holding the `set_custom_field` map
pub const CUSTOM_FIELDS_KEY: &str = "custom_fields";

/// An action that was not applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedAction {
    /// Position in the action list
    pub index: usize,
    pub action_type: String,
    pub error: String,
}

/// The augmented decision/metadata pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub decision: HandoffDecision,
    pub metadata: RequestMetadata,
    /// Number of actions applied
    pub applied: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedAction>,
}

impl ActionOutcome {
    /// Custom fields written by `set_custom_field`
    pub fn custom_fields(&self) -> Option<&HashMap<String, Value>> {
        match self.metadata.get(CUSTOM_FIELDS_KEY) {
            Some(Value::Object(fields)) => Some(fields),
            _ => None,
        }
    }
}

/// Stateless action executor
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionExecutor;

impl ActionExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Apply `actions` in order. The inputs are left untouched.
    pub fn apply(
        &self,
        actions: &[RuleAction],
        decision: &HandoffDecision,
        metadata: &RequestMetadata,
    ) -> ActionOutcome {
        let mut outcome = ActionOutcome {
            decision: decision.clone(),
            metadata: metadata.clone(),
            applied: 0,
            skipped: Vec::new(),
        };

        for (index, action) in actions.iter().enumerate() {
            match Self::apply_one(action, &mut outcome.decision, &mut outcome.metadata) {
                Ok(()) => {
                    debug!(index, action = action.action_type(), "Applied action");
                    outcome.applied += 1;
                }
                Err(e) => {
                    warn!(index, action = action.action_type(), "Skipping action: {}", e);
                    outcome.skipped.push(SkippedAction {
                        index,
                        action_type: action.action_type().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome
    }

    fn apply_one(
        action: &RuleAction,
        decision: &mut HandoffDecision,
        metadata: &mut RequestMetadata,
    ) -> Result<(), CoreError> {
        action.validate()?;

        match action {
            RuleAction::AssignToAgent { agent_id } => {
                decision.assignment = Some(Assignment::Agent(agent_id.clone()));
            }
            RuleAction::AssignToQueue { queue_id } => {
                decision.assignment = Some(Assignment::Queue(queue_id.clone()));
            }
            RuleAction::AssignToDepartment { department } => {
                decision.assignment = Some(Assignment::Department(department.clone()));
            }
            RuleAction::SetPriority { priority } => {
                decision.priority = Some(*priority);
            }
            RuleAction::AddTags { tags } => {
                decision.tags.extend(tags.iter().cloned());
            }
            RuleAction::RemoveTags { tags } => {
                for tag in tags {
                    decision.tags.remove(tag);
                }
            }
            RuleAction::SetCustomField { key, value } => {
                let fields = metadata
                    .entry(CUSTOM_FIELDS_KEY.to_string())
                    .or_insert_with(|| Value::Object(HashMap::new()));
                match fields {
                    Value::Object(map) => {
                        map.insert(key.clone(), value.clone());
                    }
                    other => {
                        return Err(CoreError::ActionParameter(format!(
                            "set_custom_field: metadata '{}' is a {}, not an object",
                            CUSTOM_FIELDS_KEY,
                            other.type_name()
                        )));
                    }
                }
            }
            RuleAction::RouteToFallback { reason } => {
                decision.route_to_fallback = true;
                if reason.is_some() {
                    decision.fallback_reason = reason.clone();
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::Priority;

    fn apply(actions: &[RuleAction]) -> ActionOutcome {
        ActionExecutor::new().apply(actions, &HandoffDecision::default(), &RequestMetadata::new())
    }

    #[test]
    fn test_actions_run_in_order() {
        let outcome = apply(&[
            RuleAction::assign_agent("senior-agent-001"),
            RuleAction::set_priority(Priority::Urgent),
            RuleAction::assign_queue("billing_support"),
        ]);
        assert_eq!(outcome.decision.assignment, Some(Assignment::Queue("billing_support".into())));
        assert_eq!(outcome.decision.priority, Some(Priority::Urgent));
        assert_eq!(outcome.applied, 3);
    }

    #[test]
    fn test_set_priority_overwrites() {
        let decision = HandoffDecision::default().with_priority(Priority::Low);
        let outcome = ActionExecutor::new().apply(
            &[RuleAction::set_priority(Priority::High)],
            &decision,
            &RequestMetadata::new(),
        );
        assert_eq!(outcome.decision.priority, Some(Priority::High));
        assert_eq!(decision.priority, Some(Priority::Low));
    }

    #[test]
    fn test_tags_are_idempotent() {
        let outcome = apply(&[
            RuleAction::add_tags(["vip", "billing"]),
            RuleAction::add_tags(["vip"]),
            RuleAction::remove_tags(["not-present"]),
        ]);
        let tags: Vec<_> = outcome.decision.tags.iter().cloned().collect();
        assert_eq!(tags, vec!["billing", "vip"]);

        let removed = ActionExecutor::new().apply(
            &[RuleAction::remove_tags(["vip"])],
            &outcome.decision,
            &outcome.metadata,
        );
        assert_eq!(removed.decision.tags.len(), 1);
    }

    #[test]
    fn test_custom_fields_overwrite() {
        let outcome = apply(&[
            RuleAction::set_custom_field("sla_minutes", 30),
            RuleAction::set_custom_field("sla_minutes", 15),
            RuleAction::set_custom_field("region", "eu"),
        ]);
        let fields = outcome.custom_fields().unwrap();
        assert_eq!(fields["sla_minutes"], Value::from(15));
        assert_eq!(fields["region"], Value::from("eu"));
    }

    #[test]
    fn test_malformed_action_is_skipped_alone() {
        let outcome = apply(&[
            RuleAction::assign_agent(""),
            RuleAction::set_priority(Priority::High),
            RuleAction::add_tags(Vec::<String>::new()),
        ]);
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.decision.priority, Some(Priority::High));
        assert!(outcome.decision.assignment.is_none());

        let skipped: Vec<_> = outcome.skipped.iter().map(|s| (s.index, s.action_type.as_str())).collect();
        assert_eq!(skipped, vec![(0, "assign_to_agent"), (2, "add_tags")]);
    }

    #[test]
    fn test_custom_field_on_non_object_metadata_is_skipped() {
        let mut metadata = RequestMetadata::new();
        metadata.insert(CUSTOM_FIELDS_KEY.to_string(), Value::from("oops"));
        let outcome = ActionExecutor::new().apply(
            &[RuleAction::set_custom_field("k", 1)],
            &HandoffDecision::default(),
            &metadata,
        );
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.skipped.len(), 1);
    }

    #[test]
    fn test_route_to_fallback_marks_decision() {
        let outcome = apply(&[
            RuleAction::route_to_fallback(Some("no agents online".to_string())),
            RuleAction::add_tags(["after_hours"]),
        ]);
        assert!(outcome.decision.route_to_fallback);
        assert_eq!(outcome.decision.fallback_reason.as_deref(), Some("no agents online"));
        assert!(outcome.decision.tags.contains("after_hours"));
    }
}
