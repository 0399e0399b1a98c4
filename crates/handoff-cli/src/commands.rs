//! Command implementations
//!
//! Each command returns the JSON document it prints, so the commands can
//! be exercised without capturing stdout.

use crate::config::CliConfig;
use anyhow::{Context, Result};
use handoff_sdk::{EscalationRouter, RouteRequest, RouterBuilder};
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Build a router from rule files and CLI settings
pub async fn build_router(rules: &[PathBuf], settings: &CliConfig) -> Result<EscalationRouter> {
    if rules.is_empty() {
        anyhow::bail!("at least one --rules file is required");
    }

    let mut builder = RouterBuilder::new()
        .add_rule_files(rules.iter().cloned())
        .utc_offset_minutes(settings.utc_offset_minutes);
    if let Some(enable) = settings.enable_cache {
        builder = builder.enable_cache(enable);
    }
    if let Some(ttl) = settings.cache_ttl_secs {
        builder = builder.cache_ttl_secs(ttl);
    }

    builder.build().await.context("failed to load rules")
}

/// Read an event document from a file, or stdin when the path is `-`
pub fn read_event(path: &Path) -> Result<RouteRequest> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read event from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read event file {}", path.display()))?
    };

    serde_json::from_str(&content).context("event must be a JSON object with a `context` field")
}

pub fn route(router: &EscalationRouter, mut request: RouteRequest, dry_run: bool) -> Result<serde_json::Value> {
    request.dry_run |= dry_run;
    let response = router.route(request);
    Ok(serde_json::to_value(response)?)
}

pub fn test_rule(router: &EscalationRouter, rule: &str, request: &RouteRequest) -> Result<serde_json::Value> {
    let report = router.test_registered_rule(rule, &request.context, &request.decision, &request.metadata)?;
    Ok(serde_json::to_value(report)?)
}

pub fn profile(router: &EscalationRouter, request: &RouteRequest) -> Result<serde_json::Value> {
    let report = router.profile(&request.context, &request.decision, &request.metadata);
    Ok(serde_json::to_value(report)?)
}

/// Summary of the loaded rule set in evaluation order
pub fn validate(router: &EscalationRouter) -> serde_json::Value {
    let rules = router.rules();
    let order: Vec<_> = rules
        .iter()
        .map(|r| {
            json!({
                "name": r.name,
                "priority": r.priority,
                "enabled": r.enabled,
                "conditions": r.conditions.len(),
                "actions": r.actions.len(),
            })
        })
        .collect();

    json!({
        "valid": true,
        "rules": rules.len(),
        "registry_version": router.registry_version(),
        "order": order,
    })
}
