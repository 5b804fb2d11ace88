//! Recorded solution scripts.

use anyhow::{Context, Result};
use gitlevel_core::{definition::LevelDefinition, tree::GitTree};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A level plus the commands a learner issued against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayScript {
    pub level: LevelDefinition,
    pub steps: Vec<ReplayStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayStep {
    pub command: String,
    /// Tree the interpreter reported after the command; `None` leaves the
    /// repository unchanged.
    #[serde(default)]
    pub tree: Option<GitTree>,
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse script {}", path.display()))
    }
}
