//! Routing rule definitions

use crate::action::RuleAction;
use crate::condition::{Condition, ConditionKind, FieldRef, MessageField};
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Observability-only rule metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A named, prioritized bundle of AND-combined conditions and ordered actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Unique rule name within a registry
    pub name: String,

    /// Higher values are evaluated first
    #[serde(default)]
    pub priority: i32,

    /// Disabled rules stay registered but are skipped during routing
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// All conditions must hold. Empty means catch-all.
    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default)]
    pub actions: Vec<RuleAction>,

    #[serde(default)]
    pub metadata: RuleMetadata,
}

fn default_enabled() -> bool {
    true
}

impl RoutingRule {
    /// Create a new rule
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            enabled: true,
            conditions: Vec::new(),
            actions: Vec::new(),
            metadata: RuleMetadata::default(),
        }
    }

    /// Add a condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add an action
    pub fn with_action(mut self, action: RuleAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.metadata.owner = Some(owner.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// A rule without conditions always matches
    pub fn is_catch_all(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn has_time_conditions(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.kind == ConditionKind::TimeBased)
    }

    /// Whether any condition reads a message timestamp
    pub fn reads_message_timestamps(&self) -> bool {
        self.conditions.iter().any(|c| {
            matches!(
                c.field_ref(),
                Ok(FieldRef::Message(MessageField::Timestamp))
            )
        })
    }

    /// Validate name, conditions and actions
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidRule("rule name must not be empty".to_string()));
        }

        for (index, condition) in self.conditions.iter().enumerate() {
            condition.validate().map_err(|e| {
                CoreError::InvalidRule(format!(
                    "rule '{}' condition #{}: {}",
                    self.name, index, e
                ))
            })?;
        }

        for (index, action) in self.actions.iter().enumerate() {
            action.validate().map_err(|e| {
                CoreError::InvalidRule(format!("rule '{}' action #{}: {}", self.name, index, e))
            })?;
        }

        Ok(())
    }
}

/// The routing configuration aggregate, as loaded from a rule file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub rules: Vec<RoutingRule>,

    #[serde(default = "default_enable_caching")]
    pub enable_caching: bool,

    /// Result cache TTL in seconds
    #[serde(default = "default_cache_ttl", alias = "cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Upper bound on cached results; 0 disables the bound
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

fn default_enable_caching() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_max_entries() -> usize {
    10_000
}

impl RoutingConfig {
    pub fn new(rules: Vec<RoutingRule>) -> Self {
        Self {
            rules,
            ..Default::default()
        }
    }

    /// Validate every rule and reject duplicate names.
    ///
    /// A catch-all rule that is not at the lowest priority is allowed but
    /// logged, since it starves every rule below it.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            rule.validate()?;
            if !seen.insert(rule.name.as_str()) {
                return Err(CoreError::InvalidRule(format!(
                    "duplicate rule name '{}'",
                    rule.name
                )));
            }
        }

        if let Some(lowest) = self.rules.iter().map(|r| r.priority).min() {
            for rule in self.rules.iter().filter(|r| r.enabled && r.is_catch_all()) {
                if rule.priority > lowest {
                    log::warn!(
                        "catch-all rule '{}' has priority {} above the lowest priority {}; rules below it will never match",
                        rule.name,
                        rule.priority,
                        lowest
                    );
                }
            }
        }

        Ok(())
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            enable_caching: default_enable_caching(),
            cache_ttl_secs: default_cache_ttl(),
            cache_max_entries: default_cache_max_entries(),
        }
    }
}
