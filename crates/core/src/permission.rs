//! Command Permission Chain
//!
//! An ordered list of filters consulted before a command reaches the
//! interpreter. The first filter that does not pass the command decides its
//! fate; a command only reaches the interpreter when every filter passes it.

use crate::{error::LevelError, registry::CommandRegistry};
use regex::Regex;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// Message shown to the learner when a disabled command is issued.
pub const DISABLED_COMMAND_MESSAGE: &str = "That git command is disabled for this level!";

/// What a filter decided about a raw command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    /// Not handled here, ask the next filter.
    Pass,
    /// Answered immediately without involving the interpreter.
    Respond(String),
    /// Refused; the message is surfaced to the learner.
    Reject(String),
}

/// A single stage of the permission chain.
pub trait CommandFilter: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, raw: &str) -> FilterVerdict;
}

#[derive(Default)]
pub struct PermissionChain {
    filters: VecDeque<Box<dyn CommandFilter>>,
}

impl PermissionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `filter` ahead of every filter already installed.
    pub fn add_first(&mut self, filter: Box<dyn CommandFilter>) {
        self.filters.push_front(filter);
    }

    pub fn add_last(&mut self, filter: Box<dyn CommandFilter>) {
        self.filters.push_back(filter);
    }

    /// Runs `raw` through the filters in order and returns the first verdict
    /// that is not [`FilterVerdict::Pass`].
    pub fn evaluate(&self, raw: &str) -> FilterVerdict {
        for filter in &self.filters {
            let verdict = filter.check(raw);
            if verdict != FilterVerdict::Pass {
                debug!(filter = filter.name(), command = raw, ?verdict, "Command intercepted");
                return verdict;
            }
        }
        FilterVerdict::Pass
    }

    /// True if a filter with `name` is installed.
    pub fn contains(&self, name: &str) -> bool {
        self.filters.iter().any(|f| f.name() == name)
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Rejects every command whose category a level has disabled.
///
/// The matchers are taken from the same [`CommandRegistry`] used for scoring.
#[derive(Debug, Clone)]
pub struct DisabledCommandFilter {
    disabled: Vec<(String, Regex)>,
}

impl DisabledCommandFilter {
    pub fn new(registry: &CommandRegistry, disabled: &BTreeSet<String>) -> Result<Self, LevelError> {
        let disabled = disabled
            .iter()
            .map(|category| {
                registry
                    .get(category)
                    .map(|regex| (category.clone(), regex.clone()))
                    .ok_or_else(|| LevelError::UnknownCategory(category.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { disabled })
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.disabled.iter().map(|(category, _)| category.as_str())
    }
}

impl CommandFilter for DisabledCommandFilter {
    fn name(&self) -> &str {
        "disabled-commands"
    }

    fn check(&self, raw: &str) -> FilterVerdict {
        let raw = raw.trim();
        if self.disabled.iter().any(|(_, regex)| regex.is_match(raw)) {
            FilterVerdict::Reject(DISABLED_COMMAND_MESSAGE.to_string())
        } else {
            FilterVerdict::Pass
        }
    }
}

/// Answers a fixed set of informational commands without the interpreter.
pub struct InstantCommandFilter {
    name: String,
    responses: Vec<(Regex, String)>,
}

impl InstantCommandFilter {
    /// Builds the filter from `(pattern, response)` pairs.
    pub fn new(name: impl Into<String>, entries: &[(&str, String)]) -> Result<Self, LevelError> {
        let name = name.into();
        let responses = entries
            .iter()
            .map(|(pattern, response)| {
                Regex::new(pattern)
                    .map(|regex| (regex, response.clone()))
                    .map_err(|source| LevelError::InvalidPattern {
                        category: pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, responses })
    }
}

impl CommandFilter for InstantCommandFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, raw: &str) -> FilterVerdict {
        let raw = raw.trim();
        self.responses
            .iter()
            .find(|(regex, _)| regex.is_match(raw))
            .map(|(_, response)| FilterVerdict::Respond(response.clone()))
            .unwrap_or(FilterVerdict::Pass)
    }
}
