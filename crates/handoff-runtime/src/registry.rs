//! Rule registry
//!
//! The registry owns the active rule set. Readers take an immutable
//! [`RuleSet`] snapshot through an `ArcSwap` load and never wait on writers.
//! Writers are serialized by a single mutex, build the next snapshot off to
//! the side and publish it with one atomic store, so a reader always sees
//! either the previous or the next rule set in full.

use crate::error::{Result, RuntimeError};
use arc_swap::ArcSwap;
use handoff_core::RoutingRule;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// A rule together with its registration sequence number
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredRule {
    pub rule: RoutingRule,
    /// Tie-break key for equal priorities; lower registered first
    pub sequence: u64,
}

/// Immutable, evaluation-ordered view of the registry
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    /// Sorted by descending priority, then ascending sequence
    rules: Vec<Arc<RegisteredRule>>,
    version: u64,
    has_time_conditions: bool,
    reads_message_timestamps: bool,
}

impl RuleSet {
    fn new(mut rules: Vec<Arc<RegisteredRule>>, version: u64) -> Self {
        rules.sort_by(|a, b| {
            b.rule
                .priority
                .cmp(&a.rule.priority)
                .then(a.sequence.cmp(&b.sequence))
        });
        let has_time_conditions = rules.iter().any(|r| r.rule.has_time_conditions());
        let reads_message_timestamps = rules.iter().any(|r| r.rule.reads_message_timestamps());
        Self {
            rules,
            version,
            has_time_conditions,
            reads_message_timestamps,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> impl Iterator<Item = &RoutingRule> {
        self.rules.iter().map(|r| &r.rule)
    }

    pub fn entries(&self) -> &[Arc<RegisteredRule>] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&RoutingRule> {
        self.rules.iter().map(|r| &r.rule).find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether any rule reads the clock, which makes results time-dependent
    pub fn has_time_conditions(&self) -> bool {
        self.has_time_conditions
    }

    /// Whether any rule reads message timestamps
    pub fn reads_message_timestamps(&self) -> bool {
        self.reads_message_timestamps
    }
}

#[derive(Debug, Default)]
struct WriterState {
    next_sequence: u64,
}

/// Versioned, hot-swappable rule registry
#[derive(Debug)]
pub struct RuleRegistry {
    current: ArcSwap<RuleSet>,
    writer: Mutex<WriterState>,
}

impl RuleRegistry {
    /// Create an empty registry at version 0
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(RuleSet::default()),
            writer: Mutex::new(WriterState::default()),
        }
    }

    /// Create a registry holding `rules`, registered in the given order
    pub fn with_rules(rules: Vec<RoutingRule>) -> Result<Self> {
        let registry = Self::new();
        registry.replace_all(rules)?;
        Ok(registry)
    }

    /// Current immutable snapshot
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    /// Register a new rule. Fails if the name is taken.
    pub fn add(&self, rule: RoutingRule) -> Result<u64> {
        rule.validate()?;

        let mut writer = self.writer.lock();
        let current = self.current.load_full();
        if current.contains(&rule.name) {
            return Err(RuntimeError::DuplicateRule(rule.name));
        }

        let sequence = writer.next_sequence;
        writer.next_sequence += 1;

        let name = rule.name.clone();
        let mut rules = current.rules.clone();
        rules.push(Arc::new(RegisteredRule { rule, sequence }));
        let version = self.publish(rules, current.version);

        info!(rule = %name, version, "Rule added");
        Ok(version)
    }

    /// Replace the rule registered as `name`.
    ///
    /// The replacement keeps the original registration sequence, so its
    /// position among equal-priority rules does not change. Renaming is
    /// allowed as long as the new name is free.
    pub fn update(&self, name: &str, rule: RoutingRule) -> Result<u64> {
        rule.validate()?;

        let _writer = self.writer.lock();
        let current = self.current.load_full();

        let position = current
            .rules
            .iter()
            .position(|r| r.rule.name == name)
            .ok_or_else(|| RuntimeError::RuleNotFound(name.to_string()))?;

        if rule.name != name && current.contains(&rule.name) {
            return Err(RuntimeError::DuplicateRule(rule.name));
        }

        let mut rules = current.rules.clone();
        let sequence = rules[position].sequence;
        rules[position] = Arc::new(RegisteredRule { rule, sequence });
        let version = self.publish(rules, current.version);

        info!(rule = %name, version, "Rule updated");
        Ok(version)
    }

    /// Remove a rule. Removing an unknown name is a no-op.
    ///
    /// Returns the registry version after the call.
    pub fn remove(&self, name: &str) -> u64 {
        let _writer = self.writer.lock();
        let current = self.current.load_full();

        if !current.contains(name) {
            tracing::debug!(rule = %name, "Remove of unknown rule ignored");
            return current.version;
        }

        let rules: Vec<_> = current
            .rules
            .iter()
            .filter(|r| r.rule.name != name)
            .cloned()
            .collect();
        let version = self.publish(rules, current.version);

        info!(rule = %name, version, "Rule removed");
        version
    }

    /// Atomically replace the whole rule set with one version bump.
    ///
    /// Used for hot reloads. Sequence numbers follow the order of `rules`.
    /// Nothing is published if any rule is invalid or a name repeats.
    pub fn replace_all(&self, rules: Vec<RoutingRule>) -> Result<u64> {
        let mut seen = HashSet::new();
        for rule in &rules {
            rule.validate()?;
            if !seen.insert(rule.name.clone()) {
                return Err(RuntimeError::DuplicateRule(rule.name.clone()));
            }
        }

        let mut writer = self.writer.lock();
        let current = self.current.load_full();
        let count = rules.len();

        let entries = rules
            .into_iter()
            .map(|rule| {
                let sequence = writer.next_sequence;
                writer.next_sequence += 1;
                Arc::new(RegisteredRule { rule, sequence })
            })
            .collect();
        let version = self.publish(entries, current.version);

        info!(rules = count, version, "Rule set replaced");
        Ok(version)
    }

    /// Build and store the next snapshot. Caller must hold the writer lock.
    fn publish(&self, rules: Vec<Arc<RegisteredRule>>, previous_version: u64) -> u64 {
        let version = previous_version + 1;
        self.current.store(Arc::new(RuleSet::new(rules, version)));
        version
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::{Condition, ConditionKind, ConditionOperator, RuleAction};

    fn rule(name: &str, priority: i32) -> RoutingRule {
        RoutingRule::new(name, priority).with_action(RuleAction::assign_queue(format!("{}_queue", name)))
    }

    fn names(set: &RuleSet) -> Vec<String> {
        set.rules().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn test_priority_then_registration_order() {
        let registry = RuleRegistry::new();
        registry.add(rule("b", 100)).unwrap();
        registry.add(rule("a", 100)).unwrap();
        registry.add(rule("top", 300)).unwrap();
        registry.add(rule("c", 100)).unwrap();
        registry.add(rule("low", 1)).unwrap();

        assert_eq!(names(&registry.snapshot()), vec!["top", "b", "a", "c", "low"]);
    }

    #[test]
    fn test_add_duplicate_fails() {
        let registry = RuleRegistry::new();
        registry.add(rule("billing", 100)).unwrap();
        let err = registry.add(rule("billing", 50)).unwrap_err();
        assert_eq!(err, RuntimeError::DuplicateRule("billing".to_string()));
        assert_eq!(registry.version(), 1);
    }

    #[test]
    fn test_every_mutation_bumps_version() {
        let registry = RuleRegistry::new();
        assert_eq!(registry.version(), 0);
        assert_eq!(registry.add(rule("a", 1)).unwrap(), 1);
        assert_eq!(registry.update("a", rule("a", 2)).unwrap(), 2);
        assert_eq!(registry.remove("a"), 3);
        assert_eq!(registry.replace_all(vec![rule("x", 1)]).unwrap(), 4);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let registry = RuleRegistry::new();
        registry.add(rule("a", 1)).unwrap();
        assert_eq!(registry.remove("missing"), 1);
        assert_eq!(registry.version(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_update_keeps_tie_break_position() {
        let registry = RuleRegistry::new();
        registry.add(rule("first", 10)).unwrap();
        registry.add(rule("second", 10)).unwrap();
        registry.update("first", rule("first", 10)).unwrap();
        assert_eq!(names(&registry.snapshot()), vec!["first", "second"]);

        registry.update("second", rule("second", 300)).unwrap();
        assert_eq!(names(&registry.snapshot()), vec!["second", "first"]);
    }

    #[test]
    fn test_update_unknown_and_rename_conflict() {
        let registry = RuleRegistry::new();
        registry.add(rule("a", 1)).unwrap();
        registry.add(rule("b", 1)).unwrap();
        assert_eq!(
            registry.update("zzz", rule("zzz", 1)).unwrap_err(),
            RuntimeError::RuleNotFound("zzz".to_string())
        );
        assert_eq!(
            registry.update("a", rule("b", 1)).unwrap_err(),
            RuntimeError::DuplicateRule("b".to_string())
        );
        registry.update("a", rule("renamed", 1)).unwrap();
        assert!(registry.snapshot().contains("renamed"));
        assert!(!registry.snapshot().contains("a"));
    }

    #[test]
    fn test_invalid_rule_rejected() {
        let registry = RuleRegistry::new();
        let bad = RoutingRule::new("bad", 1).with_action(RuleAction::assign_agent(""));
        assert!(matches!(registry.add(bad), Err(RuntimeError::Core(_))));
        assert_eq!(registry.version(), 0);
    }

    #[test]
    fn test_replace_all_is_all_or_nothing() {
        let registry = RuleRegistry::new();
        registry.add(rule("keep", 1)).unwrap();
        let err = registry
            .replace_all(vec![rule("x", 1), rule("x", 2)])
            .unwrap_err();
        assert_eq!(err, RuntimeError::DuplicateRule("x".to_string()));
        assert_eq!(names(&registry.snapshot()), vec!["keep"]);
        assert_eq!(registry.version(), 1);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_mutations() {
        let registry = RuleRegistry::new();
        registry.add(rule("a", 1)).unwrap();
        let before = registry.snapshot();
        registry.add(rule("b", 2)).unwrap();
        registry.remove("a");

        assert_eq!(names(&before), vec!["a"]);
        assert_eq!(before.version(), 1);
        assert_eq!(names(&registry.snapshot()), vec!["b"]);
    }

    #[test]
    fn test_time_condition_flag() {
        let registry = RuleRegistry::new();
        registry.add(rule("plain", 1)).unwrap();
        assert!(!registry.snapshot().has_time_conditions());

        registry
            .add(rule("after_hours", 5).with_condition(Condition::time(ConditionOperator::After, "18:00")))
            .unwrap();
        assert!(registry.snapshot().has_time_conditions());

        registry
            .add(rule("tiered", 3).with_condition(Condition::new(
                ConditionKind::UserAttribute,
                "tier",
                ConditionOperator::Equals,
                "vip",
            )))
            .unwrap();
        registry.remove("after_hours");
        assert!(!registry.snapshot().has_time_conditions());
    }
}
