//! Script replay service
//!
//! Loads mutation scripts and replays them against a fresh tree.

use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use crate::application::script::{Script, ScriptParser, ScriptStep};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{Mutation, Tree, TreeError};
use crate::infrastructure::traits::FileSystem;

/// How a replay treats rejected steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Stop at the first rejected step; later steps are skipped
    pub stop_on_error: bool,
    /// Apply every step or none of them
    pub atomic: bool,
    /// Run the full invariant check after every applied step
    pub verify: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            stop_on_error: true,
            atomic: false,
            verify: false,
        }
    }
}

impl From<&Settings> for ReplayOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            stop_on_error: settings.stop_on_error,
            atomic: false,
            verify: settings.verify_invariants,
        }
    }
}

/// What happened to one script step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    Rejected(TreeError<String>),
    /// Not attempted because an earlier step was rejected
    Skipped,
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub line: usize,
    pub mutation: Mutation<String>,
    pub outcome: StepOutcome,
}

/// Result of replaying one script.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    /// Tree after the replay
    pub tree: Tree<String>,
    /// Per-step outcomes, in script order
    pub steps: Vec<StepReport>,
}

impl ReplayReport {
    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Applied))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Rejected(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Skipped))
    }

    /// True if no step was rejected or skipped.
    pub fn is_clean(&self) -> bool {
        self.applied() == self.steps.len()
    }

    fn count(&self, pred: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(&s.outcome)).count()
    }
}

/// Service for loading and replaying mutation scripts.
pub struct ReplayService {
    fs: Arc<dyn FileSystem>,
    parser: ScriptParser,
}

impl ReplayService {
    /// Create a new replay service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            parser: ScriptParser::new(),
        }
    }

    /// Read and parse a script file.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Script> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::OperationFailed {
                context: format!("read script: {}", path.display()),
                source: "not a file".into(),
            });
        }
        let source = self
            .fs
            .read_to_string(path)
            .with_path_context("read script", path)?;
        self.parser.parse(&source)
    }

    /// Load a script file and replay it.
    pub fn replay_file(
        &self,
        path: &Path,
        default_root: &str,
        options: ReplayOptions,
    ) -> ApplicationResult<ReplayReport> {
        let script = self.load(path)?;
        self.replay(&script, default_root, options)
    }

    /// Replay `script` against a fresh tree rooted at the script's root, or
    /// at `default_root` when the script declares none.
    ///
    /// Rejected steps are part of the report, not errors. Errors are
    /// reserved for an atomic batch that fails and for invariant violations
    /// found in verify mode.
    #[instrument(level = "debug", skip(self, script))]
    pub fn replay(
        &self,
        script: &Script,
        default_root: &str,
        options: ReplayOptions,
    ) -> ApplicationResult<ReplayReport> {
        let mut tree = Tree::new(script.root_or(default_root).to_string());

        let steps = if options.atomic {
            self.replay_atomic(&mut tree, script)?
        } else {
            self.replay_steps(&mut tree, script, options)?
        };
        let report = ReplayReport { tree, steps };

        if options.verify {
            verify(&report.tree, script.steps.last().map_or(0, |s| s.line))?;
        }
        info!(
            applied = report.applied(),
            rejected = report.rejected(),
            skipped = report.skipped(),
            "replay finished"
        );
        Ok(report)
    }

    fn replay_atomic(
        &self,
        tree: &mut Tree<String>,
        script: &Script,
    ) -> ApplicationResult<Vec<StepReport>> {
        tree.apply_all(script.mutations()).map_err(|source| {
            let line = script.steps.get(source.index).map_or(0, |s| s.line);
            ApplicationError::AtomicRejected { line, source }
        })?;
        Ok(script
            .steps
            .iter()
            .map(|step| report(step, StepOutcome::Applied))
            .collect())
    }

    fn replay_steps(
        &self,
        tree: &mut Tree<String>,
        script: &Script,
        options: ReplayOptions,
    ) -> ApplicationResult<Vec<StepReport>> {
        let mut steps = Vec::with_capacity(script.steps.len());
        let mut halted = false;

        for step in &script.steps {
            if halted {
                steps.push(report(step, StepOutcome::Skipped));
                continue;
            }
            let outcome = match tree.apply(&step.mutation) {
                Ok(()) => {
                    debug!(line = step.line, mutation = %step.mutation, "applied");
                    if options.verify {
                        verify(tree, step.line)?;
                    }
                    StepOutcome::Applied
                }
                Err(e) => {
                    info!(line = step.line, mutation = %step.mutation, error = %e, "rejected");
                    halted = options.stop_on_error;
                    StepOutcome::Rejected(e)
                }
            };
            steps.push(report(step, outcome));
        }
        Ok(steps)
    }
}

fn report(step: &ScriptStep, outcome: StepOutcome) -> StepReport {
    StepReport {
        line: step.line,
        mutation: step.mutation.clone(),
        outcome,
    }
}

fn verify(tree: &Tree<String>, line: usize) -> ApplicationResult<()> {
    tree.check_invariants()
        .map_err(|violation| ApplicationError::Invariant { line, violation })
}

/// SHA-256 over the sorted `(node, parent)` pairs of `tree`.
///
/// Trees with the same root, domain and parent map share a digest; child
/// order does not matter.
pub fn tree_digest(tree: &Tree<String>) -> String {
    let mut pairs: Vec<_> = tree.parent_map().into_iter().collect();
    pairs.sort();

    let mut hasher = Sha256::new();
    hasher.update(tree.root().as_bytes());
    hasher.update(b"\n");
    for (node, parent) in &pairs {
        hasher.update(node.as_bytes());
        hasher.update(b"\t");
        hasher.update(parent.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
