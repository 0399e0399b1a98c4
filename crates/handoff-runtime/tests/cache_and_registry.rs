//! Cache transparency and concurrent registry access

use handoff_core::{
    Condition, ConditionKind, ConditionOperator, EvaluationContext, HandoffDecision, Message,
    RequestMetadata, RoutingRule, RuleAction,
};
use handoff_runtime::{CacheConfig, RoutingEngine, RuleRegistry};
use std::sync::Arc;
use std::time::Duration;

fn rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule::new("angry_customers", 150)
            .with_condition(Condition::new(
                ConditionKind::ContextField,
                "sentiment_score",
                ConditionOperator::LessThan,
                -0.5,
            ))
            .with_action(RuleAction::add_tags(["angry"])),
        RoutingRule::new("billing", 100)
            .with_condition(Condition::new(
                ConditionKind::MessageContent,
                "content",
                ConditionOperator::Contains,
                vec!["billing", "invoice", "refund"],
            ))
            .with_action(RuleAction::assign_queue("billing_support")),
        RoutingRule::new("catch_all", 0).with_action(RuleAction::assign_queue("general")),
    ]
}

fn inputs() -> Vec<EvaluationContext> {
    vec![
        EvaluationContext::new("a").with_message(Message::user("my invoice is wrong")),
        EvaluationContext::new("b")
            .with_message(Message::user("this is terrible"))
            .with_metadata("sentiment_score", -0.9),
        EvaluationContext::new("c").with_message(Message::user("hello")),
        EvaluationContext::new("d"),
    ]
}

#[test]
fn cache_never_changes_the_result() {
    let registry = Arc::new(RuleRegistry::with_rules(rules()).unwrap());
    let cached = RoutingEngine::new(registry.clone()).with_cache(CacheConfig::new(Duration::from_secs(60)));
    let uncached = RoutingEngine::new(registry).without_cache();
    let decision = HandoffDecision::default();
    let metadata = RequestMetadata::new();

    for ctx in inputs() {
        let reference = uncached.evaluate(&ctx, &decision, &metadata);
        let first = cached.evaluate(&ctx, &decision, &metadata);
        let second = cached.evaluate(&ctx, &decision, &metadata);

        assert!(reference.same_outcome(&first), "miss differs for {}", ctx.conversation_id);
        assert!(reference.same_outcome(&second), "hit differs for {}", ctx.conversation_id);
        assert!(second.cache_hit);
    }
    assert!(uncached.cache_stats().is_none());
}

#[test]
fn every_mutation_invalidates_cached_results() {
    let engine = RoutingEngine::new(Arc::new(RuleRegistry::with_rules(rules()).unwrap()));
    let ctx = EvaluationContext::new("a").with_message(Message::user("refund please"));
    let decision = HandoffDecision::default();
    let metadata = RequestMetadata::new();

    let first = engine.evaluate(&ctx, &decision, &metadata);
    assert_eq!(first.matched_rule.as_deref(), Some("billing"));

    engine
        .registry()
        .add(
            RoutingRule::new("refunds", 120)
                .with_condition(Condition::new(
                    ConditionKind::MessageContent,
                    "content",
                    ConditionOperator::Contains,
                    "refund",
                ))
                .with_action(RuleAction::assign_queue("refunds")),
        )
        .unwrap();

    let second = engine.evaluate(&ctx, &decision, &metadata);
    assert!(!second.cache_hit);
    assert_eq!(second.matched_rule.as_deref(), Some("refunds"));
    assert_eq!(second.registry_version, first.registry_version + 1);
}

#[test]
fn readers_see_whole_rule_sets_during_reloads() {
    let registry = Arc::new(RuleRegistry::with_rules(rules()).unwrap());
    let engine = RoutingEngine::new(registry.clone()).without_cache();

    // Every published set contains exactly one rule per generation, all
    // with the same generation suffix.
    let generation = |g: usize| -> Vec<RoutingRule> {
        (0..5)
            .map(|i| {
                RoutingRule::new(format!("rule_{}_gen_{}", i, g), i as i32)
                    .with_action(RuleAction::assign_queue(format!("gen_{}", g)))
            })
            .collect()
    };

    std::thread::scope(|s| {
        s.spawn(|| {
            for g in 0..200 {
                registry.replace_all(generation(g)).unwrap();
            }
        });

        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..200 {
                    let snapshot = registry.snapshot();
                    let suffixes: std::collections::HashSet<_> = snapshot
                        .rules()
                        .filter_map(|r| r.name.split_once("_gen_").map(|(_, g)| g.to_string()))
                        .collect();
                    assert!(suffixes.len() <= 1, "mixed generations: {:?}", suffixes);

                    let result = engine.evaluate_all(
                        &EvaluationContext::new("x"),
                        &HandoffDecision::default(),
                        &RequestMetadata::new(),
                    );
                    assert!(result.is_match());
                }
            });
        }
    });

    assert_eq!(registry.version(), 201);
    assert_eq!(registry.len(), 5);
}

#[test]
fn string_operators_accept_any_of_lists() {
    let engine = RoutingEngine::new(Arc::new(RuleRegistry::with_rules(rules()).unwrap()));
    let result = engine.evaluate(
        &EvaluationContext::new("a").with_message(Message::user("Where is my REFUND?")),
        &HandoffDecision::default(),
        &RequestMetadata::new(),
    );
    assert_eq!(result.matched_rule.as_deref(), Some("billing"));
}
