//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Rejections returned by the tree mutators.
///
/// A rejected call never mutates the tree, so callers may retry with
/// corrected arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError<N> {
    #[error("node already present: {0:?}")]
    DuplicateNode(N),

    #[error("parent not present: {0:?}")]
    UnknownParent(N),

    #[error("node not found: {0:?}")]
    NotFound(N),

    #[error("node still has children: {0:?}")]
    NotLeaf(N),

    #[error("the root cannot be removed: {0:?}")]
    RootRemoval(N),

    #[error("the root cannot be moved: {0:?}")]
    RootMove(N),

    #[error("moving {node:?} under {target:?} would create a cycle")]
    CycleDetected { node: N, target: N },

    #[error("parent of {node:?} is {actual:?}, not {claimed:?}")]
    ParentMismatch { node: N, claimed: N, actual: N },

    #[error("invalid arguments: {reason}")]
    InvalidArguments { reason: &'static str },
}

/// Result type for tree operations.
pub type TreeResult<T, N> = Result<T, TreeError<N>>;

/// A broken structural invariant.
///
/// These are defects, not caller errors: the mutators never produce them on
/// a consistent tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("root is not live")]
    RootMissing,

    #[error("root does not map to itself")]
    RootNotSelfParented,

    #[error("node {node} has a parent outside the domain")]
    DanglingParent { node: String },

    #[error("node {node} does not reach the root")]
    Unrooted { node: String },

    #[error("identity index and arena disagree on {node}")]
    IndexMismatch { node: String },

    #[error("child list of {node} disagrees with parent pointers")]
    ChildListMismatch { node: String },
}
