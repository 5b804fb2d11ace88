//! Replay stand-ins for the interpreter and the visualization.
//!
//! Both share one [`ReplayRepo`]: the interpreter moves it to the next
//! recorded tree, the visualization reports whatever it currently holds.

use anyhow::Result;
use async_trait::async_trait;
use gitlevel_core::{
    command::CommandRecord, session::CommandInterpreter, tree::GitTree, visuals::LevelVisuals,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::debug;

/// The replayed repository state.
pub struct ReplayRepo {
    current: Mutex<GitTree>,
    staged: Mutex<Option<GitTree>>,
}

impl ReplayRepo {
    pub fn new(initial: GitTree) -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(initial),
            staged: Mutex::new(None),
        })
    }

    pub async fn reset(&self, tree: GitTree) {
        *self.current.lock().await = tree;
        *self.staged.lock().await = None;
    }

    /// Sets the tree the next executed command produces. Anything staged but
    /// never executed (a rejected command) is discarded.
    pub async fn stage(&self, tree: Option<GitTree>) {
        *self.staged.lock().await = tree;
    }

    pub async fn current(&self) -> GitTree {
        self.current.lock().await.clone()
    }
}

pub struct ReplayInterpreter {
    repo: Arc<ReplayRepo>,
}

impl ReplayInterpreter {
    pub fn new(repo: Arc<ReplayRepo>) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &Arc<ReplayRepo> {
        &self.repo
    }
}

#[async_trait]
impl CommandInterpreter for ReplayInterpreter {
    async fn execute(&self, raw: &str) -> Result<CommandRecord> {
        let staged = self.repo.staged.lock().await.take();
        if let Some(tree) = staged {
            debug!(command = raw, commits = tree.commit_count(), "Applying recorded tree");
            *self.repo.current.lock().await = tree;
        }
        Ok(CommandRecord::finished(raw, None))
    }
}

pub struct ReplayVisuals {
    repo: Arc<ReplayRepo>,
    animation: Duration,
}

impl ReplayVisuals {
    pub fn new(repo: Arc<ReplayRepo>, animation: Duration) -> Self {
        Self { repo, animation }
    }
}

#[async_trait]
impl LevelVisuals for ReplayVisuals {
    async fn export_tree(&self) -> GitTree {
        self.repo.current().await
    }

    async fn finish_animation(&self) {
        tokio::time::sleep(self.animation).await;
    }
}
