//! Goal comparison between the learner's live tree and a level's goal.

use crate::tree::GitTree;
use std::collections::{BTreeMap, BTreeSet};

/// Decides whether the current tree satisfies the goal.
///
/// Implementations must be pure: the level may call this once per executed
/// command and relies on no side effects.
#[cfg_attr(test, mockall::automock)]
pub trait GoalComparator: Send + Sync {
    fn compare_trees(&self, current: &GitTree, goal: &GitTree) -> bool;
}

/// Structural comparison of branches, commit ancestry and HEAD.
///
/// Commit parents are compared as sets, so the order a merge lists its
/// parents in does not matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeCompare;

impl TreeCompare {
    fn branch_targets(tree: &GitTree) -> BTreeMap<&str, &str> {
        tree.branches
            .iter()
            .map(|(name, branch)| (name.as_str(), branch.target.as_str()))
            .collect()
    }

    fn ancestry(tree: &GitTree) -> BTreeMap<&str, BTreeSet<&str>> {
        tree.commits
            .iter()
            .map(|(id, commit)| {
                (
                    id.as_str(),
                    commit.parents.iter().map(String::as_str).collect(),
                )
            })
            .collect()
    }
}

impl GoalComparator for TreeCompare {
    fn compare_trees(&self, current: &GitTree, goal: &GitTree) -> bool {
        current.head.target == goal.head.target
            && Self::branch_targets(current) == Self::branch_targets(goal)
            && Self::ancestry(current) == Self::ancestry(goal)
    }
}
