//! Core EscalationRouter implementation

use super::types::{RouteRequest, RouteResponse};
use crate::error::{Result, SdkError};
use crate::loader::{load_all, RuleSource};
use handoff_core::{
    EvaluationContext, HandoffDecision, RequestMetadata, RoutingRule, RuleAction, Value,
};
use handoff_runtime::{
    ActionExecutor, ActionOutcome, CacheStats, MetricsSnapshot, ProfileReport, RoutingEngine,
    RoutingResult, RuleTestReport, RuntimeError,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Escalation router: rule registry, routing engine and action executor
/// behind one handle.
pub struct EscalationRouter {
    engine: RoutingEngine,
    executor: ActionExecutor,

    /// Sources re-read by `reload`
    sources: Vec<Arc<dyn RuleSource>>,

    /// Rules given to the builder in code, kept across reloads
    static_rules: Vec<RoutingRule>,

    /// Serializes reloads so two reloads cannot interleave their loads
    reload_lock: Mutex<()>,
}

impl EscalationRouter {
    pub(crate) fn new(
        engine: RoutingEngine,
        sources: Vec<Arc<dyn RuleSource>>,
        static_rules: Vec<RoutingRule>,
    ) -> Self {
        Self {
            engine,
            executor: ActionExecutor::new(),
            sources,
            static_rules,
            reload_lock: Mutex::new(()),
        }
    }

    /// Generate a unique request ID
    /// Format: req_YYYYMMDDHHmmss_xxxxxx
    fn generate_request_id() -> String {
        use chrono::Utc;
        use rand::Rng;

        let datetime_str = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let random: u32 = rand::thread_rng().gen_range(0..0xFFFFFF);
        format!("req_{}_{:06x}", datetime_str, random)
    }

    /// Evaluate a request and, unless it is a dry run, apply the matched actions
    pub fn route(&self, request: RouteRequest) -> RouteResponse {
        let start = Instant::now();

        let request_id = request
            .request_id
            .clone()
            .or_else(|| {
                request
                    .metadata
                    .get("request_id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(Self::generate_request_id);

        let result = self
            .engine
            .evaluate(&request.context, &request.decision, &request.metadata);

        let (decision, metadata, skipped, applied) = if request.dry_run {
            (request.decision, request.metadata, Vec::new(), false)
        } else {
            let outcome = self
                .executor
                .apply(&result.actions, &request.decision, &request.metadata);
            (outcome.decision, outcome.metadata, outcome.skipped, true)
        };

        tracing::info!(
            request_id = %request_id,
            conversation_id = %request.context.conversation_id,
            matched_rule = result.matched_rule.as_deref().unwrap_or("<none>"),
            cache_hit = result.cache_hit,
            dry_run = request.dry_run,
            "Routed escalation"
        );

        RouteResponse {
            request_id,
            result,
            decision,
            metadata,
            applied,
            skipped,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Evaluate without applying
    pub fn evaluate(
        &self,
        context: &EvaluationContext,
        decision: &HandoffDecision,
        metadata: &RequestMetadata,
    ) -> RoutingResult {
        self.engine.evaluate(context, decision, metadata)
    }

    /// Evaluate every rule, bypassing the cache
    pub fn diagnose(
        &self,
        context: &EvaluationContext,
        decision: &HandoffDecision,
        metadata: &RequestMetadata,
    ) -> RoutingResult {
        self.engine.evaluate_all(context, decision, metadata)
    }

    /// Apply actions to a decision/metadata pair
    pub fn apply(
        &self,
        actions: &[RuleAction],
        decision: &HandoffDecision,
        metadata: &RequestMetadata,
    ) -> ActionOutcome {
        self.executor.apply(actions, decision, metadata)
    }

    // ========== Rule administration ==========

    /// Register a rule; returns the new registry version
    pub fn add_rule(&self, rule: RoutingRule) -> Result<u64> {
        Ok(self.engine.registry().add(rule)?)
    }

    /// Replace the rule named `name`; returns the new registry version
    pub fn update_rule(&self, name: &str, rule: RoutingRule) -> Result<u64> {
        Ok(self.engine.registry().update(name, rule)?)
    }

    /// Remove a rule. Unknown names are ignored.
    pub fn remove_rule(&self, name: &str) -> u64 {
        self.engine.registry().remove(name)
    }

    /// Re-read every configured rule source and swap in the result as one
    /// new rule set. On failure the active rules stay in place.
    ///
    /// Rules added at runtime with [`add_rule`](Self::add_rule) are not
    /// kept; rules passed to the builder in code are.
    pub async fn reload(&self) -> Result<u64> {
        if self.sources.is_empty() {
            return Err(SdkError::Config(
                "No rule sources configured. Cannot reload.".to_string(),
            ));
        }

        let _guard = self.reload_lock.lock().await;
        tracing::info!("Reloading rules from {} sources...", self.sources.len());

        let configs = match load_all(&self.sources).await {
            Ok(configs) => configs,
            Err(e) => {
                tracing::error!("Reload failed, keeping current rules: {}", e);
                return Err(e);
            }
        };

        let rules: Vec<RoutingRule> = configs
            .into_iter()
            .flat_map(|c| c.rules)
            .chain(self.static_rules.iter().cloned())
            .collect();
        let count = rules.len();

        let version = self.engine.registry().replace_all(rules).map_err(|e| {
            tracing::error!("Reload failed, keeping current rules: {}", e);
            SdkError::from(e)
        })?;

        tracing::info!(rules = count, version, "Rules reloaded");
        Ok(version)
    }

    // ========== Diagnostics ==========

    /// Test one rule in isolation, registered or not
    pub fn test_rule(
        &self,
        rule: &RoutingRule,
        context: &EvaluationContext,
        decision: &HandoffDecision,
        metadata: &RequestMetadata,
    ) -> RuleTestReport {
        self.engine.profiler().test_rule(rule, context, decision, metadata)
    }

    /// Test a registered rule by name
    pub fn test_registered_rule(
        &self,
        name: &str,
        context: &EvaluationContext,
        decision: &HandoffDecision,
        metadata: &RequestMetadata,
    ) -> Result<RuleTestReport> {
        let snapshot = self.engine.registry().snapshot();
        let rule = snapshot
            .get(name)
            .ok_or_else(|| RuntimeError::RuleNotFound(name.to_string()))?;
        Ok(self.test_rule(rule, context, decision, metadata))
    }

    /// Profile every active rule against one input
    pub fn profile(
        &self,
        context: &EvaluationContext,
        decision: &HandoffDecision,
        metadata: &RequestMetadata,
    ) -> ProfileReport {
        self.engine.profile(context, decision, metadata)
    }

    /// Metrics snapshot, `None` when metrics are disabled
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.engine.metrics().map(|m| m.snapshot())
    }

    /// Cache statistics, `None` when caching is disabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.engine.cache_stats()
    }

    pub fn registry_version(&self) -> u64 {
        self.engine.registry().version()
    }

    /// Active rules in evaluation order
    pub fn rules(&self) -> Vec<RoutingRule> {
        self.engine.registry().snapshot().rules().cloned().collect()
    }

    pub fn engine(&self) -> &RoutingEngine {
        &self.engine
    }
}
