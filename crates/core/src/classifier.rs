//! Significant Command Classifier
//!
//! Decides which executed commands count toward a learner's issued-command
//! tally. The counted categories are fixed; the matchers come from the
//! injected [`CommandRegistry`].

use crate::{error::LevelError, registry::CommandRegistry};
use regex::Regex;
use std::collections::BTreeMap;

/// Categories that count toward the issued-command tally.
pub const COUNTED_CATEGORIES: &[&str] = &[
    "git commit",
    "git checkout",
    "git rebase",
    "git reset",
    "git branch",
    "git revert",
    "git merge",
    "git cherry-pick",
];

/// The registry restricted to the counted categories.
#[derive(Debug, Clone)]
pub struct SignificantCommands {
    matchers: BTreeMap<String, Regex>,
}

impl SignificantCommands {
    /// Builds the classifier for [`COUNTED_CATEGORIES`].
    ///
    /// Fails if the registry lacks any counted category. That means the level
    /// and the interpreter have drifted apart and is never tolerated.
    pub fn new(registry: &CommandRegistry) -> Result<Self, LevelError> {
        Self::from_categories(registry, COUNTED_CATEGORIES)
    }

    pub fn from_categories(
        registry: &CommandRegistry,
        categories: &[&str],
    ) -> Result<Self, LevelError> {
        let matchers = categories
            .iter()
            .map(|category| {
                registry
                    .get(category)
                    .map(|regex| (category.to_string(), regex.clone()))
                    .ok_or_else(|| LevelError::MissingCategory(category.to_string()))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self { matchers })
    }

    /// True iff `raw` matches at least one counted category.
    pub fn is_significant(&self, raw: &str) -> bool {
        let raw = raw.trim();
        self.matchers.values().any(|regex| regex.is_match(raw))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.matchers.keys().map(String::as_str)
    }
}
