//! JSON run configuration.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use palm_core::{EcosystemParams, EcosystemState, SimulationSettings};
use serde::{Deserialize, Serialize};

/// Everything one invocation needs. Omitted sections and fields fall back to
/// the historical defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub params: EcosystemParams,
    pub initial_state: EcosystemState,
    pub settings: SimulationSettings,
}

impl RunConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse run configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }
}
