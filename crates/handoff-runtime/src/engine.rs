//! Routing engine
//!
//! Walks a registry snapshot in priority order and resolves the first rule
//! whose conditions all hold. Two entry points share the same matcher:
//! [`RoutingEngine::evaluate`] is the cached fast path that stops at the
//! first match, [`RoutingEngine::evaluate_all`] bypasses the cache and
//! evaluates every rule for diagnostics.

use crate::cache::{fingerprint, CacheConfig, CacheStats, ResultCache};
use crate::clock::{Clock, SystemClock};
use crate::evaluator::{ConditionEvaluator, EvaluationScope};
use crate::matcher::RuleMatcher;
use crate::observability::MetricsCollector;
use crate::profiler::{ProfileReport, RuleProfiler};
use crate::registry::{RuleRegistry, RuleSet};
use crate::result::RoutingResult;
use handoff_core::{EvaluationContext, HandoffDecision, RequestMetadata, TimeOfDay};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Escalation routing engine
pub struct RoutingEngine {
    registry: Arc<RuleRegistry>,
    matcher: RuleMatcher,
    cache: Option<ResultCache>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl RoutingEngine {
    /// Create an engine over `registry` with the default cache and the system clock
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self {
            registry,
            matcher: RuleMatcher::default(),
            cache: Some(ResultCache::new(CacheConfig::default())),
            clock: Arc::new(SystemClock),
            metrics: Some(Arc::new(MetricsCollector::new())),
        }
    }

    pub fn with_cache(mut self, config: CacheConfig) -> Self {
        self.cache = Some(ResultCache::new(config));
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<ConditionEvaluator>) -> Self {
        self.matcher = RuleMatcher::new(evaluator);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn without_metrics(mut self) -> Self {
        self.metrics = None;
        self
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    /// Metrics collector, `None` when metrics are disabled
    pub fn metrics(&self) -> Option<Arc<MetricsCollector>> {
        self.metrics.clone()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Cache statistics, `None` when caching is disabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    /// Drop every cached result
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Current time of day as seen by time-based conditions
    pub fn time_of_day(&self) -> TimeOfDay {
        self.matcher.evaluator().time_of_day(self.clock.as_ref())
    }

    /// Fast path: cache check, then first-match-wins walk
    pub fn evaluate(
        &self,
        context: &EvaluationContext,
        decision: &HandoffDecision,
        metadata: &RequestMetadata,
    ) -> RoutingResult {
        let start = Instant::now();
        let snapshot = self.registry.snapshot();
        let scope = EvaluationScope::new(context, decision, metadata, self.time_of_day());

        let key = self.cache.as_ref().map(|_| {
            let bucket = snapshot.has_time_conditions().then_some(scope.now);
            fingerprint(
                &scope,
                snapshot.version(),
                bucket,
                snapshot.reads_message_timestamps(),
            )
        });

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(mut cached) = cache.get(key) {
                cached.cache_hit = true;
                cached.evaluation_time_us = start.elapsed().as_micros() as u64;
                debug!(
                    conversation_id = %context.conversation_id,
                    matched_rule = ?cached.matched_rule,
                    "Routing result served from cache"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_evaluation(
                        cached.is_match(),
                        true,
                        cached.errors.len(),
                        start.elapsed(),
                    );
                }
                return cached;
            }
        }

        let mut result = self.walk(&snapshot, &scope, false);
        result.evaluation_time_us = start.elapsed().as_micros() as u64;

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.put(key, result.clone());
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_evaluation(
                result.is_match(),
                false,
                result.errors.len(),
                start.elapsed(),
            );
        }
        result
    }

    /// Diagnostic path: evaluate every enabled rule without touching the cache.
    ///
    /// The reported match is still the first matching rule in priority order.
    pub fn evaluate_all(
        &self,
        context: &EvaluationContext,
        decision: &HandoffDecision,
        metadata: &RequestMetadata,
    ) -> RoutingResult {
        let start = Instant::now();
        let snapshot = self.registry.snapshot();
        let scope = EvaluationScope::new(context, decision, metadata, self.time_of_day());

        let mut result = self.walk(&snapshot, &scope, true);
        result.evaluation_time_us = start.elapsed().as_micros() as u64;
        result
    }

    /// Profiler sharing this engine's evaluator and clock
    pub fn profiler(&self) -> RuleProfiler {
        RuleProfiler::new(self.matcher.clone(), self.clock.clone())
    }

    /// Profile the active rule set
    pub fn profile(
        &self,
        context: &EvaluationContext,
        decision: &HandoffDecision,
        metadata: &RequestMetadata,
    ) -> ProfileReport {
        let snapshot = self.registry.snapshot();
        let rules: Vec<_> = snapshot.rules().cloned().collect();
        self.profiler().profile(&rules, context, decision, metadata)
    }

    fn walk(&self, rules: &RuleSet, scope: &EvaluationScope<'_>, exhaustive: bool) -> RoutingResult {
        let mut result = RoutingResult::no_match(rules.version());

        for rule in rules.rules().filter(|r| r.enabled) {
            let outcome = if exhaustive {
                self.matcher.matches_exhaustive(rule, scope)
            } else {
                self.matcher.matches(rule, scope)
            };

            debug!(
                rule = %rule.name,
                priority = rule.priority,
                matched = outcome.matched,
                "Evaluated rule"
            );

            if let Some(error) = &outcome.error {
                result.errors.push(error.clone());
            }

            let matched = outcome.matched;
            result.rule_traces.push(outcome.into_trace(rule));

            if matched && !result.is_match() {
                result.matched_rule = Some(rule.name.clone());
                result.matched_priority = Some(rule.priority);
                result.actions = rule.actions.clone();
                if !exhaustive {
                    break;
                }
            }
        }

        result
    }
}
