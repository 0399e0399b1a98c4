//! Rule sources
//!
//! A rule document is either a full [`RoutingConfig`] (`rules:` plus cache
//! settings) or a bare list of rules. YAML and JSON are both accepted;
//! files are told apart by extension.

use crate::error::{Result, SdkError};
use async_trait::async_trait;
use handoff_core::{RoutingConfig, RoutingRule};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Serialization format of a rule document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFormat {
    Yaml,
    Json,
}

impl RuleFormat {
    /// Detect the format from a file extension; unknown extensions are YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => RuleFormat::Json,
            _ => RuleFormat::Yaml,
        }
    }
}

/// Something that can produce a routing configuration
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Identifier used in errors and logs
    fn id(&self) -> String;

    /// Load and validate the configuration
    async fn load(&self) -> Result<RoutingConfig>;
}

/// Rules read from a file on disk
#[derive(Debug, Clone)]
pub struct FileRuleSource {
    path: PathBuf,
}

impl FileRuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RuleSource for FileRuleSource {
    fn id(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<RoutingConfig> {
        tracing::debug!("Loading rule file: {}", self.path.display());

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SdkError::Load {
                path: self.id(),
                message: e.to_string(),
            })?;

        parse_rules(&self.id(), &content, RuleFormat::from_path(&self.path))
    }
}

/// Rules held in memory, e.g. from an administrative API
#[derive(Debug, Clone)]
pub struct InlineRuleSource {
    id: String,
    content: String,
    format: RuleFormat,
}

impl InlineRuleSource {
    /// Inline YAML content. JSON parses as YAML as well.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            format: RuleFormat::Yaml,
        }
    }

    pub fn with_format(mut self, format: RuleFormat) -> Self {
        self.format = format;
        self
    }
}

#[async_trait]
impl RuleSource for InlineRuleSource {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn load(&self) -> Result<RoutingConfig> {
        parse_rules(&self.id, &self.content, self.format)
    }
}

/// Load every source in order. Fails on the first source that fails.
pub async fn load_all(sources: &[Arc<dyn RuleSource>]) -> Result<Vec<RoutingConfig>> {
    let mut configs = Vec::with_capacity(sources.len());
    for source in sources {
        let config = source.load().await?;
        tracing::info!("Loaded {} rules from {}", config.rules.len(), source.id());
        configs.push(config);
    }
    Ok(configs)
}

/// Parse and validate a rule document
pub fn parse_rules(id: &str, content: &str, format: RuleFormat) -> Result<RoutingConfig> {
    let load_error = |message: String| SdkError::Load {
        path: id.to_string(),
        message,
    };

    let config = match format {
        RuleFormat::Yaml => {
            let document: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| load_error(e.to_string()))?;
            match document {
                serde_yaml::Value::Null => RoutingConfig::default(),
                serde_yaml::Value::Sequence(_) => {
                    let rules: Vec<RoutingRule> =
                        serde_yaml::from_value(document).map_err(|e| load_error(e.to_string()))?;
                    RoutingConfig::new(rules)
                }
                other => serde_yaml::from_value(other).map_err(|e| load_error(e.to_string()))?,
            }
        }
        RuleFormat::Json => {
            let document: serde_json::Value =
                serde_json::from_str(content).map_err(|e| load_error(e.to_string()))?;
            if document.is_array() {
                let rules: Vec<RoutingRule> =
                    serde_json::from_value(document).map_err(|e| load_error(e.to_string()))?;
                RoutingConfig::new(rules)
            } else {
                serde_json::from_value(document).map_err(|e| load_error(e.to_string()))?
            }
        }
    };

    config
        .validate()
        .map_err(|e| SdkError::Validation(format!("{}: {}", id, e)))?;

    tracing::debug!("Loaded {} rules from {}", config.rules.len(), id);
    Ok(config)
}
