//! Builder pattern for EscalationRouter

use crate::config::{EngineConfig, DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_SECS};
use crate::error::Result;
use crate::loader::{load_all, FileRuleSource, InlineRuleSource, RuleSource};
use crate::router::EscalationRouter;
use handoff_core::{RoutingConfig, RoutingRule};
use handoff_runtime::{CacheConfig, Clock, ConditionEvaluator, RoutingEngine, RuleRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Builder for EscalationRouter
///
/// # Example
///
/// ```rust,ignore
/// use handoff_sdk::RouterBuilder;
///
/// // From rule files
/// let router = RouterBuilder::new()
///     .add_rule_file("rules/routing.yaml")
///     .cache_ttl_secs(60)
///     .build()
///     .await?;
///
/// // Inline content (for testing or an admin API)
/// let router = RouterBuilder::new()
///     .add_rule_content("routing", yaml_content)
///     .build()
///     .await?;
/// ```
pub struct RouterBuilder {
    config: EngineConfig,
    sources: Vec<Arc<dyn RuleSource>>,
    rules: Vec<RoutingRule>,
    clock: Option<Arc<dyn Clock>>,
}

impl RouterBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::with_config(EngineConfig::new())
    }

    /// Start from an existing configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            sources: Vec::new(),
            rules: Vec::new(),
            clock: None,
        }
    }

    /// Add a rule file (.yaml, .yml or .json)
    pub fn add_rule_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.rule_files.push(path.into());
        self
    }

    /// Add multiple rule files
    pub fn add_rule_files(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.config.rule_files.extend(paths);
        self
    }

    /// Add rule content directly (alternative to file path)
    pub fn add_rule_content(mut self, id: impl Into<String>, content: impl Into<String>) -> Self {
        self.config.rule_contents.push((id.into(), content.into()));
        self
    }

    /// Add a custom rule source. It is loaded after files and inline contents.
    pub fn add_source(mut self, source: Arc<dyn RuleSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Add a rule in code. Code rules are registered after every source.
    pub fn add_rule(mut self, rule: RoutingRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn add_rules(mut self, rules: impl IntoIterator<Item = RoutingRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn enable_cache(mut self, enable: bool) -> Self {
        self.config.enable_cache = Some(enable);
        self
    }

    pub fn cache_ttl_secs(mut self, ttl: u64) -> Self {
        self.config.cache_ttl_secs = Some(ttl);
        self
    }

    pub fn cache_max_entries(mut self, max_entries: usize) -> Self {
        self.config.cache_max_entries = Some(max_entries);
        self
    }

    pub fn utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.config.utc_offset_minutes = minutes;
        self
    }

    /// Enable metrics
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.config.enable_metrics = enable;
        self
    }

    /// Use a custom clock for time-based conditions
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Load every source, register the rules and build the router.
    ///
    /// Rules are registered in source order: files, inline contents, custom
    /// sources, then rules added in code. That order breaks priority ties.
    pub async fn build(mut self) -> Result<EscalationRouter> {
        let mut sources: Vec<Arc<dyn RuleSource>> = Vec::new();
        for path in &self.config.rule_files {
            sources.push(Arc::new(FileRuleSource::new(path.clone())));
        }
        for (id, content) in &self.config.rule_contents {
            sources.push(Arc::new(InlineRuleSource::new(id.clone(), content.clone())));
        }
        sources.extend(std::mem::take(&mut self.sources));

        let configs = load_all(&sources).await?;
        let cache = self.cache_config(configs.first());

        let rules: Vec<RoutingRule> = configs
            .into_iter()
            .flat_map(|c| c.rules)
            .chain(self.rules.iter().cloned())
            .collect();
        let registry = Arc::new(RuleRegistry::with_rules(rules)?);

        let evaluator = ConditionEvaluator::with_offset_minutes(self.config.utc_offset_minutes);
        let mut engine = RoutingEngine::new(registry).with_evaluator(Arc::new(evaluator));

        engine = match cache {
            Some(cache) => engine.with_cache(cache),
            None => engine.without_cache(),
        };
        if let Some(clock) = self.clock {
            engine = engine.with_clock(clock);
        }
        if !self.config.enable_metrics {
            engine = engine.without_metrics();
        }

        tracing::info!(
            rules = engine.registry().len(),
            sources = sources.len(),
            cache = engine.cache_enabled(),
            "Escalation router built"
        );

        Ok(EscalationRouter::new(engine, sources, self.rules))
    }

    /// Resolve cache settings: explicit builder values first, then the first
    /// rule source, then defaults. `None` means caching is off.
    fn cache_config(&self, declared: Option<&RoutingConfig>) -> Option<CacheConfig> {
        let enabled = self
            .config
            .enable_cache
            .or(declared.map(|c| c.enable_caching))
            .unwrap_or(true);
        if !enabled {
            return None;
        }

        let ttl = self
            .config
            .cache_ttl_secs
            .or(declared.map(|c| c.cache_ttl_secs))
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);
        let max_entries = self
            .config
            .cache_max_entries
            .or(declared.map(|c| c.cache_max_entries))
            .unwrap_or(DEFAULT_CACHE_MAX_ENTRIES);

        Some(CacheConfig::new(Duration::from_secs(ttl)).with_max_entries(max_entries))
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_CACHE: &str = r#"
enable_caching: false
rules: []
"#;

    #[tokio::test]
    async fn test_empty_builder() {
        let router = RouterBuilder::new().build().await.unwrap();
        assert!(router.rules().is_empty());
        assert!(router.cache_stats().is_some());
        assert!(router.metrics().is_some());
    }

    #[tokio::test]
    async fn test_rule_file_cache_settings_apply_when_unset() {
        let router = RouterBuilder::new()
            .add_rule_content("no-cache", NO_CACHE)
            .build()
            .await
            .unwrap();
        assert!(router.cache_stats().is_none());
    }

    #[tokio::test]
    async fn test_builder_overrides_rule_file_cache_settings() {
        let router = RouterBuilder::new()
            .add_rule_content("no-cache", NO_CACHE)
            .enable_cache(true)
            .enable_metrics(false)
            .build()
            .await
            .unwrap();
        assert!(router.cache_stats().is_some());
        assert!(router.metrics().is_none());
    }

    #[test]
    fn test_cache_config_resolution() {
        let declared = RoutingConfig {
            cache_ttl_secs: 30,
            cache_max_entries: 5,
            ..RoutingConfig::default()
        };

        let builder = RouterBuilder::new().cache_ttl_secs(90);
        let cache = builder.cache_config(Some(&declared)).unwrap();
        assert_eq!(cache.ttl, Duration::from_secs(90));
        assert_eq!(cache.max_entries, 5);

        let cache = RouterBuilder::new().cache_config(None).unwrap();
        assert_eq!(cache.ttl, Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
        assert_eq!(cache.max_entries, DEFAULT_CACHE_MAX_ENTRIES);
    }

    #[test]
    fn test_builder_collects_sources() {
        let builder = RouterBuilder::new()
            .add_rule_file("a.yaml")
            .add_rule_files(vec![PathBuf::from("b.json")])
            .add_rule_content("inline", "rules: []")
            .utc_offset_minutes(120);

        assert_eq!(builder.config.rule_files.len(), 2);
        assert_eq!(builder.config.rule_contents.len(), 1);
        assert_eq!(builder.config.utc_offset_minutes, 120);
    }
}
