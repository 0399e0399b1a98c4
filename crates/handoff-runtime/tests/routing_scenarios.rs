//! End-to-end routing scenarios over the engine and executor

use handoff_core::{
    Assignment, Condition, ConditionKind, ConditionOperator, EvaluationContext, HandoffDecision,
    Message, Priority, RequestMetadata, RoutingRule, RuleAction,
};
use handoff_runtime::{ActionExecutor, FixedClock, RoutingEngine, RuleRegistry};
use std::sync::Arc;

fn vip_customers() -> RoutingRule {
    RoutingRule::new("vip_customers", 200)
        .with_condition(Condition::new(
            ConditionKind::UserAttribute,
            "tier",
            ConditionOperator::Equals,
            "vip",
        ))
        .with_action(RuleAction::assign_agent("senior-agent-001"))
        .with_action(RuleAction::set_priority(Priority::Urgent))
}

fn billing_issues(priority: i32) -> RoutingRule {
    RoutingRule::new("billing_issues", priority)
        .with_condition(Condition::new(
            ConditionKind::MessageContent,
            "content",
            ConditionOperator::Contains,
            "billing",
        ))
        .with_action(RuleAction::assign_queue("billing_support"))
        .with_action(RuleAction::set_priority(Priority::High))
}

fn engine_with(rules: Vec<RoutingRule>) -> RoutingEngine {
    let registry = Arc::new(RuleRegistry::with_rules(rules).expect("valid rules"));
    RoutingEngine::new(registry)
}

fn context(tier: &str, content: &str) -> EvaluationContext {
    EvaluationContext::new("conv-42")
        .with_user_attribute("tier", tier)
        .with_message(Message::user(content))
}

fn route(engine: &RoutingEngine, context: &EvaluationContext) -> (Option<String>, HandoffDecision) {
    let decision = HandoffDecision::default();
    let metadata = RequestMetadata::new();
    let result = engine.evaluate(context, &decision, &metadata);
    let outcome = ActionExecutor::new().apply(&result.actions, &decision, &metadata);
    (result.matched_rule, outcome.decision)
}

#[test]
fn vip_billing_goes_to_senior_agent() {
    let engine = engine_with(vec![vip_customers(), billing_issues(100)]);
    let (matched, decision) = route(&engine, &context("vip", "billing issue"));

    assert_eq!(matched.as_deref(), Some("vip_customers"));
    assert_eq!(decision.priority, Some(Priority::Urgent));
    assert_eq!(decision.assignment, Some(Assignment::Agent("senior-agent-001".into())));
}

#[test]
fn standard_billing_goes_to_billing_queue() {
    let engine = engine_with(vec![vip_customers(), billing_issues(100)]);
    let (matched, decision) = route(&engine, &context("standard", "billing issue"));

    assert_eq!(matched.as_deref(), Some("billing_issues"));
    assert_eq!(decision.priority, Some(Priority::High));
    assert_eq!(decision.assignment, Some(Assignment::Queue("billing_support".into())));
}

#[test]
fn general_question_matches_nothing() {
    let engine = engine_with(vec![vip_customers(), billing_issues(100)]);
    let result = engine.evaluate(
        &context("standard", "general question"),
        &HandoffDecision::default(),
        &RequestMetadata::new(),
    );
    assert!(result.matched_rule.is_none());
    assert!(result.actions.is_empty());
}

#[test]
fn regex_requires_exact_digit_count() {
    let engine = engine_with(vec![RoutingRule::new("order_lookup", 100)
        .with_condition(Condition::new(
            ConditionKind::MessageContent,
            "content",
            ConditionOperator::RegexMatches,
            r"ORD-\d{8}",
        ))
        .with_action(RuleAction::assign_queue("orders"))]);

    let (matched, _) = route(&engine, &context("standard", "order ORD-12345678 status"));
    assert_eq!(matched.as_deref(), Some("order_lookup"));

    let (matched, _) = route(&engine, &context("standard", "order ORD-123"));
    assert!(matched.is_none());
}

#[test]
fn after_hours_rule_follows_injected_clock() {
    let rule = RoutingRule::new("after_hours", 50)
        .with_condition(Condition::time(ConditionOperator::After, "18:00"))
        .with_action(RuleAction::assign_department("overnight_support"));
    let registry = Arc::new(RuleRegistry::with_rules(vec![rule]).expect("valid rules"));

    let evening = RoutingEngine::new(registry.clone()).with_clock(Arc::new(FixedClock::at(19, 0)));
    let (matched, decision) = route(&evening, &EvaluationContext::new("c"));
    assert_eq!(matched.as_deref(), Some("after_hours"));
    assert_eq!(decision.assignment, Some(Assignment::Department("overnight_support".into())));

    let morning = RoutingEngine::new(registry).with_clock(Arc::new(FixedClock::at(10, 0)));
    let (matched, _) = route(&morning, &EvaluationContext::new("c"));
    assert!(matched.is_none());
}

#[test]
fn priority_update_reorders_evaluation() {
    let vip_catch = RoutingRule::new("vip_customers", 200)
        .with_condition(Condition::new(
            ConditionKind::MessageContent,
            "content",
            ConditionOperator::Contains,
            "issue",
        ))
        .with_action(RuleAction::assign_agent("senior-agent-001"));
    let engine = engine_with(vec![vip_catch, billing_issues(100)]);
    let ctx = context("standard", "billing issue");

    let (before, _) = route(&engine, &ctx);
    assert_eq!(before.as_deref(), Some("vip_customers"));

    let version = engine
        .registry()
        .update("billing_issues", billing_issues(300))
        .expect("rule exists");
    assert_eq!(version, 2);

    let (after, decision) = route(&engine, &ctx);
    assert_eq!(after.as_deref(), Some("billing_issues"));
    assert_eq!(decision.priority, Some(Priority::High));
}

#[test]
fn equal_priorities_follow_registration_order() {
    let catch = |name: &str| {
        RoutingRule::new(name, 10).with_action(RuleAction::assign_queue(format!("{}_queue", name)))
    };
    let engine = engine_with(vec![catch("zeta"), catch("alpha"), catch("mid")]);
    let result = engine.evaluate_all(
        &EvaluationContext::new("c"),
        &HandoffDecision::default(),
        &RequestMetadata::new(),
    );

    let order: Vec<_> = result.rule_traces.iter().map(|t| t.rule_name.as_str()).collect();
    assert_eq!(order, vec!["zeta", "alpha", "mid"]);
    assert_eq!(result.matched_rule.as_deref(), Some("zeta"));
}

#[test]
fn negation_inverts_existence_checks() {
    let engine = engine_with(vec![RoutingRule::new("has_order", 10)
        .with_condition(
            Condition::new(ConditionKind::Entity, "order_id", ConditionOperator::Exists, handoff_core::Value::Null)
                .negated(),
        )
        .with_action(RuleAction::assign_queue("no_order"))]);

    let (without_order, _) = route(&engine, &EvaluationContext::new("c"));
    assert_eq!(without_order.as_deref(), Some("has_order"));

    let (with_order, _) = route(&engine, &EvaluationContext::new("c").with_entity("order_id", "ORD-1"));
    assert!(with_order.is_none());
}
