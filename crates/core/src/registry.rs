//! Canonical Command Registry
//!
//! Maps every command category the interpreter understands to the pattern used
//! to recognise it in raw learner input. Scoring and command disabling both
//! classify through this registry so the two never disagree.

use crate::error::LevelError;
use regex::Regex;
use std::collections::BTreeMap;

/// Pattern table for the simulated git interpreter.
///
/// A subcommand must end at whitespace or at the end of the input, so
/// `git branchy` is not classified as `git branch`.
pub const GIT_COMMAND_PATTERNS: &[(&str, &str)] = &[
    ("git commit", r"^git +commit($|\s)"),
    ("git add", r"^git +add($|\s)"),
    ("git checkout", r"^git +checkout($|\s)"),
    ("git rebase", r"^git +rebase($|\s)"),
    ("git reset", r"^git +reset($|\s)"),
    ("git branch", r"^git +branch($|\s)"),
    ("git revert", r"^git +revert($|\s)"),
    ("git log", r"^git +log($|\s)"),
    ("git merge", r"^git +merge($|\s)"),
    ("git show", r"^git +show($|\s)"),
    ("git status", r"^git +status($|\s)"),
    ("git cherry-pick", r"^git +cherry-pick($|\s)"),
];

/// Category name to matcher mapping, built once and injected wherever
/// commands need classifying.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    patterns: BTreeMap<String, Regex>,
}

impl CommandRegistry {
    /// Compiles a registry from `(category, pattern)` pairs.
    pub fn from_patterns(entries: &[(&str, &str)]) -> Result<Self, LevelError> {
        let patterns = entries
            .iter()
            .map(|(category, pattern)| {
                Regex::new(pattern)
                    .map(|regex| (category.to_string(), regex))
                    .map_err(|source| LevelError::InvalidPattern {
                        category: category.to_string(),
                        source,
                    })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self { patterns })
    }

    /// The canonical registry for the git interpreter.
    pub fn git() -> Result<Self, LevelError> {
        Self::from_patterns(GIT_COMMAND_PATTERNS)
    }

    pub fn get(&self, category: &str) -> Option<&Regex> {
        self.patterns.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    /// Returns the category `raw` belongs to, if any.
    pub fn categorize(&self, raw: &str) -> Option<&str> {
        let raw = raw.trim();
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(raw))
            .map(|(category, _)| category.as_str())
    }
}
