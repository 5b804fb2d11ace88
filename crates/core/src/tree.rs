//! Serialized version graph exchanged with the interpreter and stored in
//! level definitions.

use crate::error::LevelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Goal used when a level definition does not provide one:
/// three commits in a line with `master` on the last.
pub const DEFAULT_GOAL_TREE: &str = r#"{"branches":{"master":{"target":"C2","id":"master"}},"commits":{"C0":{"parents":[],"id":"C0","rootCommit":true},"C1":{"parents":["C0"],"id":"C1"},"C2":{"parents":["C1"],"id":"C2"}},"HEAD":{"target":"master","id":"HEAD"}}"#;

/// Start state used when a level definition does not provide one.
pub const DEFAULT_START_TREE: &str = r#"{"branches":{"master":{"target":"C1","id":"master"}},"commits":{"C0":{"parents":[],"id":"C0","rootCommit":true},"C1":{"parents":["C0"],"id":"C1"}},"HEAD":{"target":"master","id":"HEAD"}}"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub target: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    #[serde(default)]
    pub parents: Vec<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub root_commit: bool,
}

/// Where HEAD points: a branch name or, when detached, a commit id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Head {
    pub target: String,
    pub id: String,
}

/// A snapshot of the simulated repository.
///
/// Fields the interpreter attaches for rendering (authors, timestamps) are
/// ignored on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitTree {
    pub branches: BTreeMap<String, Branch>,
    pub commits: BTreeMap<String, Commit>,
    #[serde(rename = "HEAD")]
    pub head: Head,
}

impl GitTree {
    /// Parses a tree export; `which` names the tree in errors.
    pub fn parse(which: &'static str, json: &str) -> Result<Self, LevelError> {
        serde_json::from_str(json).map_err(|source| LevelError::InvalidTree { which, source })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    /// The commit HEAD resolves to, following one branch indirection.
    pub fn head_commit(&self) -> Option<&str> {
        match self.branches.get(&self.head.target) {
            Some(branch) => Some(branch.target.as_str()),
            None => self
                .commits
                .get(&self.head.target)
                .map(|commit| commit.id.as_str()),
        }
    }
}
