//! Loads the engine configuration file and applies command-line overrides.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use k303_engine::EngineConfig;

/// Values given on the command line that replace configured ones.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub trustee_name: Option<String>,
    pub manager_name: Option<String>,
}

/// Read, parse and validate `path`, then apply `overrides`.
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<EngineConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    let mut config = EngineConfig::from_yaml_str(&text)
        .with_context(|| format!("invalid configuration {}", path.display()))?;

    if let Some(trustee) = &overrides.trustee_name {
        config.trustee_name = trustee.clone();
    }
    if let Some(manager) = &overrides.manager_name {
        config.manager_name = Some(manager.clone());
    }
    config
        .validate()
        .with_context(|| format!("invalid configuration {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        trustee = %config.trustee_name,
        tokens = config.profile_legend.len(),
        rules = config.rules().len(),
        "configuration loaded"
    );
    Ok(config)
}
