//! Error types for level construction and the command-settling protocol.

/// Failures raised by the level core.
///
/// Everything except [`LevelError::SignalDropped`] is a configuration-integrity
/// failure detected while a level is being built; such a level cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("Command category '{0}' is missing from the command registry")]
    MissingCategory(String),
    #[error("Disabled command '{0}' does not name a known command category")]
    UnknownCategory(String),
    #[error("Invalid pattern for command category '{category}': {source}")]
    InvalidPattern {
        category: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid {which} tree: {source}")]
    InvalidTree {
        which: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Completion signal was dropped without being released")]
    SignalDropped,
}
