//! Command pipeline for one level attempt.
//!
//! Commands go through the permission chain, then the interpreter, then the
//! level's two post-command hooks. A command is only considered done once the
//! level has released its completion signal, so commands never overlap.

use crate::{
    command::CommandRecord,
    level::Level,
    permission::{FilterVerdict, PermissionChain},
    signal::CompletionSignal,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, instrument};

/// Executes parsed commands against the simulated repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandInterpreter: Send + Sync {
    /// Runs `raw`. An `Err` means the interpreter itself failed; git-level
    /// failures are reported through [`CommandRecord::failed`].
    async fn execute(&self, raw: &str) -> Result<CommandRecord>;
}

/// What happened to an issued command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A filter refused the command; the interpreter never saw it.
    Rejected { message: String },
    /// A filter answered the command directly.
    Responded { output: String },
    /// The interpreter ran the command and the level has settled.
    Executed(CommandRecord),
}

pub struct LevelSession<I> {
    level: Level,
    interpreter: I,
    chain: PermissionChain,
}

impl<I: CommandInterpreter> LevelSession<I> {
    /// Wires `level` into the pipeline, installing its disabled-command
    /// filter ahead of everything already in `chain`.
    pub fn new(level: Level, interpreter: I, mut chain: PermissionChain) -> Self {
        level.install_permission_filter(&mut chain);
        Self {
            level,
            interpreter,
            chain,
        }
    }

    /// Processes one learner command through to completion.
    #[instrument(name = "issue_command", skip(self), fields(level = %self.level.name()))]
    pub async fn issue(&mut self, raw: &str) -> Result<CommandOutcome> {
        match self.chain.evaluate(raw) {
            FilterVerdict::Reject(message) => {
                info!(%message, "Command rejected");
                return Ok(CommandOutcome::Rejected { message });
            }
            FilterVerdict::Respond(output) => return Ok(CommandOutcome::Responded { output }),
            FilterVerdict::Pass => {}
        }

        let record = self
            .interpreter
            .execute(raw)
            .await
            .with_context(|| format!("Interpreter failed on '{raw}'"))?;

        self.level.after_command(&record);

        let (signal, waiter) = CompletionSignal::new();
        self.level.after_command_settled(signal).await;
        waiter.settled().await?;

        Ok(CommandOutcome::Executed(record))
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    pub fn chain(&self) -> &PermissionChain {
        &self.chain
    }

    pub fn into_level(self) -> Level {
        self.level
    }
}
