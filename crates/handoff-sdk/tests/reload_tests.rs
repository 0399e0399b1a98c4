//! Rule loading and hot reload against files on disk

use handoff_sdk::{
    EvaluationContext, FixedClock, Message, Priority, RouteRequest, RouterBuilder, SdkError,
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::{Builder, NamedTempFile};

const ROUTING_V1: &str = r#"
cache_ttl_secs: 60
rules:
  - name: vip_customers
    priority: 200
    metadata:
      description: VIP fast lane
      owner: support-ops
    conditions:
      - type: user_attribute
        field: tier
        operator: EQUALS
        value: vip
    actions:
      - type: assign_to_agent
        agent_id: senior-agent-001
      - type: set_priority
        priority: urgent
  - name: billing_issues
    priority: 100
    conditions:
      - type: message_content
        field: content
        operator: CONTAINS
        value: billing
    actions:
      - type: assign_to_queue
        queue_id: billing_support
      - type: set_priority
        priority: high
"#;

const ROUTING_V2: &str = r#"
rules:
  - name: billing_issues
    priority: 300
    conditions:
      - type: message_content
        field: content
        operator: CONTAINS
        value: billing
    actions:
      - type: assign_to_department
        department: finance
"#;

fn rule_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().expect("temp file");
    file.write_all(content.as_bytes()).expect("write rules");
    file
}

fn rewrite(path: &Path, content: &str) {
    std::fs::write(path, content).expect("rewrite rules");
}

fn request(tier: &str, content: &str) -> RouteRequest {
    RouteRequest::new(
        EvaluationContext::new("conv-1")
            .with_user_attribute("tier", tier)
            .with_message(Message::user(content)),
    )
}

#[tokio::test]
async fn loads_yaml_rule_file() {
    let file = rule_file(".yaml", ROUTING_V1);
    let router = RouterBuilder::new().add_rule_file(file.path()).build().await.unwrap();

    let names: Vec<_> = router.rules().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["vip_customers", "billing_issues"]);

    let response = router.route(request("vip", "billing issue"));
    assert_eq!(response.result.matched_rule.as_deref(), Some("vip_customers"));
    assert_eq!(response.decision.priority, Some(Priority::Urgent));
}

#[tokio::test]
async fn loads_json_rule_file() {
    let json = r#"[{
        "name": "order_lookup",
        "priority": 100,
        "conditions": [{"type": "message_content", "field": "content",
                        "operator": "REGEX_MATCHES", "value": "ORD-\\d{8}"}],
        "actions": [{"type": "assign_to_queue", "queue_id": "orders"}]
    }]"#;
    let file = rule_file(".json", json);
    let router = RouterBuilder::new().add_rule_file(file.path()).build().await.unwrap();

    assert!(router.route(request("standard", "order ORD-12345678 status")).result.is_match());
    assert!(!router.route(request("standard", "order ORD-123")).result.is_match());
}

#[tokio::test]
async fn missing_file_is_a_load_error() {
    let result = RouterBuilder::new()
        .add_rule_file("/definitely/not/here.yaml")
        .build()
        .await;
    assert!(matches!(result, Err(SdkError::Load { .. })));
}

#[tokio::test]
async fn duplicate_names_across_files_fail_the_build() {
    let a = rule_file(".yaml", ROUTING_V1);
    let b = rule_file(".yaml", ROUTING_V2);
    let result = RouterBuilder::new()
        .add_rule_file(a.path())
        .add_rule_file(b.path())
        .build()
        .await;
    assert!(matches!(result, Err(SdkError::Runtime(_))));
}

#[tokio::test]
async fn reload_swaps_rules_and_invalidates_cache() {
    let file = rule_file(".yaml", ROUTING_V1);
    let router = RouterBuilder::new().add_rule_file(file.path()).build().await.unwrap();

    let vip_billing = request("vip", "billing issue");
    let before = router.route(vip_billing.clone());
    assert_eq!(before.result.matched_rule.as_deref(), Some("vip_customers"));
    assert!(router.route(vip_billing.clone()).result.cache_hit);

    rewrite(file.path(), ROUTING_V2);
    let version = router.reload().await.unwrap();
    assert_eq!(version, 2);

    let after = router.route(vip_billing);
    assert!(!after.result.cache_hit);
    assert_eq!(after.result.matched_rule.as_deref(), Some("billing_issues"));
    assert_eq!(router.rules().len(), 1);
}

#[tokio::test]
async fn failed_reload_keeps_current_rules() {
    let file = rule_file(".yaml", ROUTING_V1);
    let router = RouterBuilder::new().add_rule_file(file.path()).build().await.unwrap();

    rewrite(file.path(), "rules:\n  - name: broken\n    priority: [\n");
    let err = router.reload().await.unwrap_err();
    assert!(matches!(err, SdkError::Load { .. }));

    assert_eq!(router.registry_version(), 1);
    assert_eq!(router.rules().len(), 2);
    assert!(router.route(request("vip", "hi")).result.is_match());
}

#[tokio::test]
async fn priority_update_takes_effect_immediately() {
    let file = rule_file(".yaml", ROUTING_V1);
    let router = RouterBuilder::new().add_rule_file(file.path()).build().await.unwrap();
    let mut billing = router
        .rules()
        .into_iter()
        .find(|r| r.name == "billing_issues")
        .unwrap();

    assert_eq!(
        router.route(request("vip", "billing issue")).result.matched_rule.as_deref(),
        Some("vip_customers")
    );

    billing.priority = 300;
    router.update_rule("billing_issues", billing).unwrap();

    assert_eq!(
        router.route(request("vip", "billing issue")).result.matched_rule.as_deref(),
        Some("billing_issues")
    );
}

#[tokio::test]
async fn time_rules_use_configured_clock_and_offset() {
    let rules = r#"
rules:
  - name: after_hours
    priority: 50
    conditions:
      - type: time_based
        operator: BETWEEN
        value: "22:00-06:00"
    actions:
      - type: route_to_fallback
        reason: overnight
"#;
    // 21:30 UTC is 23:30 at UTC+2
    let clock = Arc::new(FixedClock::at(21, 30));
    let router = RouterBuilder::new()
        .add_rule_content("after-hours", rules)
        .utc_offset_minutes(120)
        .with_clock(clock)
        .build()
        .await
        .unwrap();

    let response = router.route(request("standard", "anyone there?"));
    assert_eq!(response.result.matched_rule.as_deref(), Some("after_hours"));
    assert!(response.decision.route_to_fallback);
    assert_eq!(response.decision.fallback_reason.as_deref(), Some("overnight"));
}

#[tokio::test]
async fn routing_continues_during_reloads() {
    let file = rule_file(".yaml", ROUTING_V1);
    let router = Arc::new(
        RouterBuilder::new()
            .add_rule_file(file.path())
            .enable_cache(false)
            .build()
            .await
            .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..4 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..100 {
                let response = router.route(request("vip", "billing issue"));
                // Either generation matches; never a half-built set
                let matched = response.result.matched_rule.unwrap_or_default();
                assert!(matched == "vip_customers" || matched == "billing_issues");
                tokio::task::yield_now().await;
            }
        }));
    }

    for i in 0..10 {
        rewrite(file.path(), if i % 2 == 0 { ROUTING_V2 } else { ROUTING_V1 });
        router.reload().await.unwrap();
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(router.registry_version(), 11);
}
