//! Runs a [`ReplayScript`] through a level session.

use crate::{
    engine::{ReplayInterpreter, ReplayRepo, ReplayVisuals},
    script::ReplayScript,
};
use anyhow::{Context, Result};
use gitlevel_core::{
    compare::TreeCompare,
    level::Level,
    permission::{InstantCommandFilter, PermissionChain},
    registry::CommandRegistry,
    session::{CommandOutcome, LevelSession},
    tree::{DEFAULT_START_TREE, GitTree},
};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    pub animation: Duration,
    pub animation_timeout: Option<Duration>,
}

/// Summary of a replayed attempt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReplayReport {
    pub level: String,
    pub steps: usize,
    pub commands_issued: u32,
    pub par: Option<usize>,
    pub solved: bool,
    /// 1-based step whose command solved the level.
    pub solved_at_step: Option<usize>,
    pub rejected: Vec<String>,
}

/// Answers `hint` and `show goal` for the level being replayed.
fn level_commands(level: &Level) -> Result<InstantCommandFilter> {
    let hint = level
        .hint()
        .unwrap_or("No hint for this level.")
        .to_string();
    let goal = level
        .goal_tree()
        .to_json()
        .context("Failed to serialize goal tree")?;
    Ok(InstantCommandFilter::new(
        "level-commands",
        &[(r"^hint$", hint), (r"^show +goal$", goal)],
    )?)
}

pub async fn run_replay(script: ReplayScript, options: &ReplayOptions) -> Result<ReplayReport> {
    let registry = CommandRegistry::git()?;
    let repo = ReplayRepo::new(GitTree::parse("start", DEFAULT_START_TREE)?);
    let visuals = ReplayVisuals::new(repo.clone(), options.animation);

    let mut level = Level::new(
        script.level,
        &registry,
        std::sync::Arc::new(visuals),
        Box::new(TreeCompare),
    )
    .context("Failed to build level")?;
    if let Some(timeout) = options.animation_timeout {
        level = level.with_animation_timeout(timeout);
    }
    repo.reset(level.start_tree().clone()).await;

    let mut chain = PermissionChain::new();
    chain.add_last(Box::new(level_commands(&level)?));

    let mut session = LevelSession::new(level, ReplayInterpreter::new(repo), chain);
    info!(
        level = session.level().name(),
        filters = ?session.chain().filter_names(),
        steps = script.steps.len(),
        "Replaying level"
    );

    let mut rejected = Vec::new();
    let mut solved_at_step = None;
    for (index, step) in script.steps.iter().enumerate() {
        session.interpreter().repo().stage(step.tree.clone()).await;
        match session.issue(&step.command).await? {
            CommandOutcome::Rejected { message } => {
                warn!(command = %step.command, %message, "Step rejected");
                rejected.push(step.command.clone());
            }
            CommandOutcome::Responded { output } => {
                info!(command = %step.command, %output, "Instant command");
            }
            CommandOutcome::Executed(_) => {
                if solved_at_step.is_none() && session.level().is_solved() {
                    solved_at_step = Some(index + 1);
                }
            }
        }
    }

    let level = session.into_level();
    Ok(ReplayReport {
        level: level.name().to_string(),
        steps: script.steps.len(),
        commands_issued: level.commands_issued(),
        par: level.par(),
        solved: level.is_solved(),
        solved_at_step,
        rejected,
    })
}
