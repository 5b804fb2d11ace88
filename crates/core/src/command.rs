use serde::{Deserialize, Serialize};

/// Outcome reported by the interpreter for a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandStatus {
    Finished,
    Error,
}

/// An executed command as reported by the interpreter.
///
/// Records are created once by the interpreter and only read afterwards, so
/// every field is private behind an accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    raw_str: String,
    status: CommandStatus,
    result: Option<String>,
    error: Option<String>,
}

impl CommandRecord {
    /// A command that ran to completion, with optional terminal output.
    pub fn finished(raw_str: impl Into<String>, result: Option<String>) -> Self {
        Self {
            raw_str: raw_str.into(),
            status: CommandStatus::Finished,
            result,
            error: None,
        }
    }

    /// A command the interpreter accepted but that failed while running
    /// (e.g. checking out a branch that does not exist).
    pub fn failed(raw_str: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            raw_str: raw_str.into(),
            status: CommandStatus::Error,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn raw_str(&self) -> &str {
        &self.raw_str
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
