//! CLI configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Settings read from `config/handoff.*`, `HANDOFF_*` variables and `.env`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Log level for the handoff crates
    pub log_level: String,

    pub log_format: LogFormat,

    /// Overrides the cache switch declared in rule files
    pub enable_cache: Option<bool>,

    /// Overrides the cache TTL declared in rule files
    pub cache_ttl_secs: Option<u64>,

    /// Offset from UTC, in minutes, for time-of-day conditions
    pub utc_offset_minutes: i32,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: LogFormat::Text,
            enable_cache: None,
            cache_ttl_secs: None,
            utc_offset_minutes: 0,
        }
    }
}

impl CliConfig {
    /// Load configuration from `.env`, the default config file and the environment
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/handoff").required(false));
        Self::finish(builder)
    }

    /// Load with an explicit config file instead of `config/handoff`
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder().add_source(config::File::from(path));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        builder
            .add_source(config::Environment::with_prefix("HANDOFF").try_parsing(true))
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
