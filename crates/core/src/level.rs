//! Level State Machine
//!
//! Counts the significant commands a learner issues, checks the live tree
//! against the level's goal after every executed command and, once the goal
//! is reached, holds the command pipeline until the success animation has
//! finished playing.

use crate::{
    classifier::SignificantCommands,
    command::CommandRecord,
    compare::GoalComparator,
    definition::LevelDefinition,
    error::LevelError,
    permission::{CommandFilter, DisabledCommandFilter, PermissionChain},
    registry::CommandRegistry,
    signal::CompletionSignal,
    tree::{DEFAULT_GOAL_TREE, DEFAULT_START_TREE, GitTree},
    visuals::LevelVisuals,
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    Active,
    /// Terminal; a solved level never becomes active again.
    Solved,
}

/// One learner's attempt at a level.
///
/// All scoring state lives here and is only mutated through
/// [`Level::after_command`] and [`Level::after_command_settled`], which the
/// command pipeline calls once per executed command, in order.
pub struct Level {
    name: String,
    hint: Option<String>,
    start_tree: GitTree,
    goal_tree: GitTree,
    significant: SignificantCommands,
    disabled: Option<DisabledCommandFilter>,
    par: Option<usize>,
    commands_issued: u32,
    state: LevelState,
    goal_is_default: bool,
    start_is_default: bool,
    settle_pending: bool,
    protocol_violations: u32,
    comparator: Box<dyn GoalComparator>,
    visuals: Arc<dyn LevelVisuals>,
    animation_timeout: Option<Duration>,
}

impl Level {
    /// Builds a level from its definition.
    ///
    /// Fails when the registry is missing a counted or disabled category, or
    /// when a supplied tree cannot be parsed. A missing start or goal tree is
    /// replaced by the built-in default with a warning.
    pub fn new(
        definition: LevelDefinition,
        registry: &CommandRegistry,
        visuals: Arc<dyn LevelVisuals>,
        comparator: Box<dyn GoalComparator>,
    ) -> Result<Self, LevelError> {
        let name = definition.display_name().to_string();
        let significant = SignificantCommands::new(registry)?;

        let goal_is_default = definition.goal_tree.is_none();
        if goal_is_default {
            warn!(level = %name, "No goal tree specified, using the default goal");
        }
        let goal_tree = GitTree::parse(
            "goal",
            definition.goal_tree.as_deref().unwrap_or(DEFAULT_GOAL_TREE),
        )?;

        let start_is_default = definition.start_tree.is_none();
        if start_is_default {
            warn!(level = %name, "No start tree specified, using the default start");
        }
        let start_tree = GitTree::parse(
            "start",
            definition.start_tree.as_deref().unwrap_or(DEFAULT_START_TREE),
        )?;

        let disabled = definition
            .disabled_commands
            .as_ref()
            .map(|categories| DisabledCommandFilter::new(registry, categories))
            .transpose()?;

        let par = definition.solution_command.as_deref().map(|solution| {
            solution
                .split(';')
                .filter(|command| significant.is_significant(command))
                .count()
        });

        Ok(Self {
            name,
            hint: definition.hint,
            start_tree,
            goal_tree,
            significant,
            disabled,
            par,
            commands_issued: 0,
            state: LevelState::Active,
            goal_is_default,
            start_is_default,
            settle_pending: false,
            protocol_violations: 0,
            comparator,
            visuals,
            animation_timeout: None,
        })
    }

    /// Releases the pipeline after `timeout` even if the solved animation
    /// never reports completion. Without it the level waits indefinitely.
    pub fn with_animation_timeout(mut self, timeout: Duration) -> Self {
        self.animation_timeout = Some(timeout);
        self
    }

    /// Prepends the disabled-command filter, if the level defines one, so
    /// that it runs before every other filter. Installing into a chain that
    /// already holds it is a no-op.
    pub fn install_permission_filter(&self, chain: &mut PermissionChain) {
        if let Some(filter) = &self.disabled {
            if chain.contains(filter.name()) {
                return;
            }
            debug!(level = %self.name, categories = ?filter.categories().collect::<Vec<_>>(), "Installing disabled-command filter");
            chain.add_first(Box::new(filter.clone()));
        }
    }

    /// Called once for every command that ran in the interpreter.
    ///
    /// Every call must be followed by [`Level::after_command_settled`] before
    /// the next one. A missing settle is logged and counted in
    /// [`Level::protocol_violations`]; the lesson carries on.
    pub fn after_command(&mut self, command: &CommandRecord) {
        if self.settle_pending {
            self.protocol_violations = self.protocol_violations.saturating_add(1);
            error!(
                level = %self.name,
                command = command.raw_str(),
                "Command executed before the previous one settled"
            );
        }
        self.settle_pending = true;

        if self.significant.is_significant(command.raw_str()) {
            self.commands_issued = self.commands_issued.saturating_add(1);
        }
        debug!(
            level = %self.name,
            command = command.raw_str(),
            commands_issued = self.commands_issued,
            "Command executed"
        );
    }

    /// Called once per executed command, after [`Level::after_command`].
    ///
    /// `signal` is always released: immediately when the goal is not reached
    /// or the level is already solved, and only after the solved animation
    /// has finished when this command solved the level.
    pub async fn after_command_settled(&mut self, signal: CompletionSignal) {
        self.settle_pending = false;
        if self.is_solved() {
            signal.release();
            return;
        }

        let current = self.visuals.export_tree().await;
        if !self.comparator.compare_trees(&current, &self.goal_tree) {
            signal.release();
            return;
        }

        self.state = LevelState::Solved;
        info!(
            level = %self.name,
            commands_issued = self.commands_issued,
            par = ?self.par,
            "Level solved"
        );
        self.level_solved(signal).await;
    }

    async fn level_solved(&self, signal: CompletionSignal) {
        match self.animation_timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, self.visuals.finish_animation())
                    .await
                    .is_err()
                {
                    warn!(level = %self.name, ?limit, "Solved animation did not finish in time");
                }
            }
            None => self.visuals.finish_animation().await,
        }
        signal.release();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn start_tree(&self) -> &GitTree {
        &self.start_tree
    }

    pub fn goal_tree(&self) -> &GitTree {
        &self.goal_tree
    }

    pub fn commands_issued(&self) -> u32 {
        self.commands_issued
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn is_solved(&self) -> bool {
        self.state == LevelState::Solved
    }

    /// True when the definition had no goal and the default goal is in use.
    pub fn goal_is_default(&self) -> bool {
        self.goal_is_default
    }

    /// True when the definition had no start and the default start is in use.
    pub fn start_is_default(&self) -> bool {
        self.start_is_default
    }

    /// Number of times a command was executed before the previous one settled.
    pub fn protocol_violations(&self) -> u32 {
        self.protocol_violations
    }

    /// Significant commands in the reference solution, if one is defined.
    pub fn par(&self) -> Option<usize> {
        self.par
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compare::{MockGoalComparator, TreeCompare},
        permission::{DISABLED_COMMAND_MESSAGE, FilterVerdict},
        visuals::MockLevelVisuals,
    };
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use tokio::sync::{Mutex, oneshot};

    fn registry() -> CommandRegistry {
        CommandRegistry::git().unwrap()
    }

    fn default_goal() -> GitTree {
        GitTree::parse("goal", DEFAULT_GOAL_TREE).unwrap()
    }

    fn static_visuals(tree: GitTree, animations: usize) -> MockLevelVisuals {
        let mut visuals = MockLevelVisuals::new();
        visuals
            .expect_export_tree()
            .returning(move || tree.clone());
        visuals.expect_finish_animation().times(animations).returning(|| ());
        visuals
    }

    fn build(
        definition: LevelDefinition,
        visuals: impl LevelVisuals + 'static,
        comparator: impl GoalComparator + 'static,
    ) -> Level {
        Level::new(definition, &registry(), Arc::new(visuals), Box::new(comparator)).unwrap()
    }

    fn start_tree() -> GitTree {
        GitTree::parse("start", DEFAULT_START_TREE).unwrap()
    }

    fn unsolved_level() -> Level {
        build(LevelDefinition::default(), static_visuals(start_tree(), 0), TreeCompare)
    }

    /// Runs both hooks for one executed command, as the pipeline does.
    async fn issue(level: &mut Level, raw: &str) {
        level.after_command(&CommandRecord::finished(raw, None));
        let (signal, waiter) = CompletionSignal::new();
        level.after_command_settled(signal).await;
        waiter.settled().await.unwrap();
    }

    /// Every ordering of `items`.
    fn permutations(items: &[&'static str]) -> Vec<Vec<&'static str>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut all = Vec::new();
        for (index, first) in items.iter().enumerate() {
            let mut rest = items.to_vec();
            rest.remove(index);
            for mut tail in permutations(&rest) {
                tail.insert(0, *first);
                all.push(tail);
            }
        }
        all
    }

    /// Visuals whose solved animation only finishes when the test opens the gate.
    struct GatedVisuals {
        tree: GitTree,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl LevelVisuals for GatedVisuals {
        async fn export_tree(&self) -> GitTree {
            self.tree.clone()
        }

        async fn finish_animation(&self) {
            let gate = self.gate.lock().await.take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
        }
    }

    /// Visuals whose solved animation never finishes.
    struct StalledVisuals(GitTree);

    #[async_trait]
    impl LevelVisuals for StalledVisuals {
        async fn export_tree(&self) -> GitTree {
            self.0.clone()
        }

        async fn finish_animation(&self) {
            std::future::pending::<()>().await;
        }
    }

    #[tokio::test]
    async fn test_informational_commands_are_not_counted() {
        let mut level = unsolved_level();
        for _ in 0..5 {
            issue(&mut level, "git status").await;
        }
        assert_eq!(level.commands_issued(), 0);
        assert_eq!(level.protocol_violations(), 0);
    }

    #[tokio::test]
    async fn test_significant_commands_are_counted() {
        let mut level = unsolved_level();
        issue(&mut level, "git commit").await;
        issue(&mut level, "git branch b1").await;
        issue(&mut level, "git commit").await;
        issue(&mut level, "git log").await;
        issue(&mut level, "git commit").await;
        assert_eq!(level.commands_issued(), 4);
        assert_eq!(level.protocol_violations(), 0);
    }

    #[tokio::test]
    async fn test_count_is_independent_of_order() {
        let commands = ["git commit", "git status", "git branch b1", "git log", "git merge b1"];
        let orderings = permutations(&commands);
        assert_eq!(orderings.len(), 120);

        for ordering in orderings {
            let mut level = unsolved_level();
            for raw in &ordering {
                issue(&mut level, raw).await;
            }
            assert_eq!(level.commands_issued(), 3, "ordering {ordering:?}");
        }
    }

    #[tokio::test]
    async fn test_failed_commands_still_count() {
        let mut level = unsolved_level();
        level.after_command(&CommandRecord::failed("git checkout nope", "no such branch"));
        let (signal, waiter) = CompletionSignal::new();
        level.after_command_settled(signal).await;
        waiter.settled().await.unwrap();
        assert_eq!(level.commands_issued(), 1);
    }

    #[tokio::test]
    async fn test_count_saturates_instead_of_overflowing() {
        let mut level = unsolved_level();
        level.commands_issued = u32::MAX;
        issue(&mut level, "git commit").await;
        assert_eq!(level.commands_issued(), u32::MAX);
    }

    #[tokio::test]
    async fn test_execute_without_settle_is_reported() {
        let mut level = unsolved_level();
        let record = CommandRecord::finished("git commit", None);

        level.after_command(&record);
        assert_eq!(level.protocol_violations(), 0);
        level.after_command(&record);
        assert_eq!(level.protocol_violations(), 1);

        let (signal, waiter) = CompletionSignal::new();
        level.after_command_settled(signal).await;
        waiter.settled().await.unwrap();
        issue(&mut level, "git commit").await;
        assert_eq!(level.protocol_violations(), 1);
    }

    #[test]
    fn test_missing_trees_fall_back_to_defaults() {
        let level = build(LevelDefinition::default(), MockLevelVisuals::new(), TreeCompare);
        assert!(level.goal_is_default());
        assert!(level.start_is_default());
        assert_eq!(level.goal_tree(), &default_goal());
        assert_eq!(level.start_tree().commit_count(), 2);
        assert_eq!(level.state(), LevelState::Active);
        assert_eq!(level.par(), None);
    }

    #[test]
    fn test_supplied_trees_are_not_flagged_as_defaults() {
        let definition = LevelDefinition {
            start_tree: Some(DEFAULT_GOAL_TREE.to_string()),
            goal_tree: Some(DEFAULT_START_TREE.to_string()),
            ..Default::default()
        };
        let level = build(definition, MockLevelVisuals::new(), TreeCompare);
        assert!(!level.goal_is_default());
        assert!(!level.start_is_default());
        assert_eq!(level.goal_tree(), &start_tree());
    }

    #[test]
    fn test_invalid_goal_tree_is_fatal() {
        let definition = LevelDefinition {
            goal_tree: Some("not json".to_string()),
            ..Default::default()
        };
        let result = Level::new(
            definition,
            &registry(),
            Arc::new(MockLevelVisuals::new()),
            Box::new(TreeCompare),
        );
        assert!(matches!(
            result,
            Err(LevelError::InvalidTree { which: "goal", .. })
        ));
    }

    #[test]
    fn test_registry_drift_is_fatal() {
        let registry = CommandRegistry::from_patterns(&[("git commit", r"^git +commit")]).unwrap();
        let result = Level::new(
            LevelDefinition::default(),
            &registry,
            Arc::new(MockLevelVisuals::new()),
            Box::new(TreeCompare),
        );
        assert!(matches!(result, Err(LevelError::MissingCategory(_))));
    }

    #[test]
    fn test_unknown_disabled_command_is_fatal() {
        let definition = LevelDefinition {
            disabled_commands: Some(BTreeSet::from(["git stash".to_string()])),
            ..Default::default()
        };
        let result = Level::new(
            definition,
            &registry(),
            Arc::new(MockLevelVisuals::new()),
            Box::new(TreeCompare),
        );
        assert!(matches!(result, Err(LevelError::UnknownCategory(c)) if c == "git stash"));
    }

    #[test]
    fn test_par_counts_significant_solution_commands() {
        let definition = LevelDefinition {
            solution_command: Some("git checkout -b bugFix;git commit;git status;git merge bugFix".to_string()),
            ..Default::default()
        };
        let level = build(definition, MockLevelVisuals::new(), TreeCompare);
        assert_eq!(level.par(), Some(3));
    }

    #[test]
    fn test_disabled_filter_is_installed_first() {
        let definition = LevelDefinition {
            disabled_commands: Some(BTreeSet::from(["git branch".to_string()])),
            ..Default::default()
        };
        let level = build(definition, MockLevelVisuals::new(), TreeCompare);

        let mut chain = PermissionChain::new();
        chain.add_last(Box::new(
            crate::permission::InstantCommandFilter::new("help", &[(r"^help$", "usage".to_string())])
                .unwrap(),
        ));
        level.install_permission_filter(&mut chain);

        assert_eq!(chain.filter_names(), vec!["disabled-commands", "help"]);
        assert_eq!(
            chain.evaluate("git branch test"),
            FilterVerdict::Reject(DISABLED_COMMAND_MESSAGE.to_string())
        );
        assert_eq!(chain.evaluate("git commit"), FilterVerdict::Pass);
    }

    #[test]
    fn test_level_without_disabled_commands_installs_nothing() {
        let level = build(LevelDefinition::default(), MockLevelVisuals::new(), TreeCompare);
        let mut chain = PermissionChain::new();
        level.install_permission_filter(&mut chain);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_installing_filter_twice_is_a_no_op() {
        let definition = LevelDefinition {
            disabled_commands: Some(BTreeSet::from(["git branch".to_string()])),
            ..Default::default()
        };
        let level = build(definition, MockLevelVisuals::new(), TreeCompare);
        let mut chain = PermissionChain::new();
        level.install_permission_filter(&mut chain);
        level.install_permission_filter(&mut chain);
        assert_eq!(chain.filter_names(), vec!["disabled-commands"]);
    }

    #[tokio::test]
    async fn test_unsolved_command_releases_without_animation() {
        let start = GitTree::parse("start", DEFAULT_START_TREE).unwrap();
        let mut level = build(LevelDefinition::default(), static_visuals(start, 0), TreeCompare);

        let (signal, waiter) = CompletionSignal::new();
        level.after_command_settled(signal).await;

        assert!(waiter.settled().await.is_ok());
        assert!(!level.is_solved());
    }

    #[tokio::test]
    async fn test_solving_command_waits_for_animation() {
        let mut level = build(
            LevelDefinition::default(),
            static_visuals(default_goal(), 1),
            TreeCompare,
        );

        let (signal, waiter) = CompletionSignal::new();
        level.after_command_settled(signal).await;

        assert!(waiter.settled().await.is_ok());
        assert!(level.is_solved());
    }

    #[tokio::test]
    async fn test_release_happens_after_animation_resolves() {
        let (open_gate, gate) = oneshot::channel();
        let visuals = GatedVisuals {
            tree: default_goal(),
            gate: Mutex::new(Some(gate)),
        };
        let mut level = build(LevelDefinition::default(), visuals, TreeCompare);

        let (signal, mut waiter) = CompletionSignal::new();
        let task = tokio::spawn(async move {
            level.after_command_settled(signal).await;
            level
        });

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!waiter.is_settled());

        open_gate.send(()).unwrap();
        let level = task.await.unwrap();
        assert!(level.is_solved());
        assert!(waiter.is_settled());
    }

    #[tokio::test]
    async fn test_solved_level_short_circuits_comparison() {
        let mut comparator = MockGoalComparator::new();
        comparator.expect_compare_trees().times(1).return_const(true);
        let mut level = build(
            LevelDefinition::default(),
            static_visuals(default_goal(), 1),
            comparator,
        );

        for _ in 0..3 {
            let (signal, waiter) = CompletionSignal::new();
            level.after_command_settled(signal).await;
            assert!(waiter.settled().await.is_ok());
            assert!(level.is_solved());
        }
    }

    #[tokio::test]
    async fn test_animation_timeout_releases_stalled_level() {
        let mut level = build(
            LevelDefinition::default(),
            StalledVisuals(default_goal()),
            TreeCompare,
        )
        .with_animation_timeout(Duration::from_millis(10));

        let (signal, waiter) = CompletionSignal::new();
        level.after_command_settled(signal).await;

        assert!(waiter.settled().await.is_ok());
        assert!(level.is_solved());
    }
}
