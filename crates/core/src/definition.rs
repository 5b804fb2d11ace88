//! Level definition input, as authored alongside the lesson content.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDefinition {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    /// Serialized tree the learner starts from.
    #[serde(default)]
    pub start_tree: Option<String>,
    /// Serialized tree the learner must reach.
    #[serde(default)]
    pub goal_tree: Option<String>,
    /// Command categories rejected before they reach the interpreter.
    #[serde(default)]
    pub disabled_commands: Option<BTreeSet<String>>,
    /// Reference solution, commands separated by `;`.
    #[serde(default)]
    pub solution_command: Option<String>,
}

impl LevelDefinition {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Name used in logs and reports.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("untitled level")
    }
}
