use crate::tree::GitTree;
use async_trait::async_trait;

/// The visualization the learner is watching.
///
/// The level reads the live tree from it and, once the goal is reached,
/// waits on it for the success animation to finish.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LevelVisuals: Send + Sync {
    /// Snapshot of the tree currently shown.
    async fn export_tree(&self) -> GitTree;

    /// Resolves when the solved animation has fully played.
    async fn finish_animation(&self);
}
