//! Configuration types for EscalationRouter

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

/// Main router configuration.
///
/// Cache fields left as `None` fall back to the settings declared in the
/// first rule source, then to the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rule file path(s)
    #[serde(default)]
    pub rule_files: Vec<PathBuf>,

    /// Rule contents (id, content) - alternative to file paths
    #[serde(skip)]
    pub rule_contents: Vec<(String, String)>,

    #[serde(default)]
    pub enable_cache: Option<bool>,

    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,

    #[serde(default)]
    pub cache_max_entries: Option<usize>,

    /// Offset from UTC, in minutes, used for time-of-day conditions
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Enable metrics collection
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
}

fn default_true() -> bool {
    true
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            enable_metrics: true,
            ..Default::default()
        }
    }

    /// Add a rule file
    pub fn with_rule_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.rule_files.push(path.into());
        self
    }

    /// Add inline rule content
    pub fn with_rule_content(mut self, id: impl Into<String>, content: impl Into<String>) -> Self {
        self.rule_contents.push((id.into(), content.into()));
        self
    }

    pub fn enable_cache(mut self, enable: bool) -> Self {
        self.enable_cache = Some(enable);
        self
    }

    pub fn with_cache_ttl_secs(mut self, ttl: u64) -> Self {
        self.cache_ttl_secs = Some(ttl);
        self
    }

    pub fn with_cache_max_entries(mut self, max_entries: usize) -> Self {
        self.cache_max_entries = Some(max_entries);
        self
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Enable metrics
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Whether any rule source is configured
    pub fn has_sources(&self) -> bool {
        !self.rule_files.is_empty() || !self.rule_contents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new();
        assert!(config.enable_metrics);
        assert!(config.enable_cache.is_none());
        assert!(config.cache_ttl_secs.is_none());
        assert!(!config.has_sources());
    }

    #[test]
    fn test_builder_setters() {
        let config = EngineConfig::new()
            .with_rule_file("rules.yaml")
            .with_rule_content("inline", "rules: []")
            .enable_cache(false)
            .with_cache_ttl_secs(60)
            .with_utc_offset_minutes(-300)
            .enable_metrics(false);

        assert_eq!(config.rule_files.len(), 1);
        assert_eq!(config.rule_contents[0].0, "inline");
        assert_eq!(config.enable_cache, Some(false));
        assert_eq!(config.cache_ttl_secs, Some(60));
        assert_eq!(config.utc_offset_minutes, -300);
        assert!(!config.enable_metrics);
        assert!(config.has_sources());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: EngineConfig = serde_json::from_str(r#"{"rule_files": ["a.yaml"]}"#).unwrap();
        assert!(config.enable_metrics);
        assert_eq!(config.utc_offset_minutes, 0);
    }
}
