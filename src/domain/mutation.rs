//! The only code paths that change a [`Tree`].
//!
//! Each mutator checks all of its preconditions first and only then commits,
//! so a rejected call leaves the tree exactly as it was.

use std::fmt;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::arena::{NodeId, Tree};
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::path;

/// A single structural change, as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<N> {
    /// Add `node` as a new leaf under `parent`.
    Add { node: N, parent: N },
    /// Remove the leaf `node`, currently under `parent`.
    Remove { node: N, parent: N },
    /// Reparent `node` (with its subtree) from `from` to `to`.
    Move { node: N, from: N, to: N },
}

impl<N: Clone> Mutation<N> {
    /// The mutation that undoes this one when applied right after it.
    pub fn inverse(&self) -> Self {
        match self {
            Self::Add { node, parent } => Self::Remove {
                node: node.clone(),
                parent: parent.clone(),
            },
            Self::Remove { node, parent } => Self::Add {
                node: node.clone(),
                parent: parent.clone(),
            },
            Self::Move { node, from, to } => Self::Move {
                node: node.clone(),
                from: to.clone(),
                to: from.clone(),
            },
        }
    }
}

impl<N: fmt::Display> fmt::Display for Mutation<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add { node, parent } => write!(f, "add {node} {parent}"),
            Self::Remove { node, parent } => write!(f, "remove {node} {parent}"),
            Self::Move { node, from, to } => write!(f, "move {node} {from} {to}"),
        }
    }
}

/// Rejection of one mutation inside an all-or-nothing batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("mutation #{index} rejected: {error}")]
pub struct BatchError<N> {
    /// Position of the rejected mutation in the batch
    pub index: usize,
    pub error: TreeError<N>,
}

impl<N: NodeId> Tree<N> {
    /// Adds `node` as a new leaf under `parent`.
    ///
    /// # Errors
    ///
    /// * [`TreeError::DuplicateNode`] if `node` is already live.
    /// * [`TreeError::UnknownParent`] if `parent` is not live.
    #[instrument(level = "debug", skip(self))]
    pub fn add(&mut self, node: N, parent: N) -> TreeResult<(), N> {
        if self.contains(&node) {
            return Err(reject(TreeError::DuplicateNode(node)));
        }
        let parent_idx = self
            .index_of(&parent)
            .ok_or_else(|| reject(TreeError::UnknownParent(parent)))?;

        self.insert_leaf(node, parent_idx);
        self.debug_assert_invariants();
        debug!("committed add");
        Ok(())
    }

    /// Removes the leaf `node`, whose current parent must be `parent`.
    ///
    /// # Errors
    ///
    /// * [`TreeError::NotFound`] if `node` is not live.
    /// * [`TreeError::RootRemoval`] if `node` is the root.
    /// * [`TreeError::ParentMismatch`] if `parent` is not the parent of `node`.
    /// * [`TreeError::NotLeaf`] if `node` still has children.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, node: &N, parent: &N) -> TreeResult<(), N> {
        let idx = self
            .index_of(node)
            .ok_or_else(|| reject(TreeError::NotFound(node.clone())))?;
        if idx == self.root_index() {
            return Err(reject(TreeError::RootRemoval(node.clone())));
        }
        self.expect_edge(node, parent)?;
        if !self.is_leaf(node) {
            return Err(reject(TreeError::NotLeaf(node.clone())));
        }

        self.remove_leaf(idx);
        self.debug_assert_invariants();
        debug!("committed remove");
        Ok(())
    }

    /// Reparents `node` from `from` to `to`, carrying its whole subtree.
    ///
    /// `to == from` is rejected rather than treated as a no-op, so a
    /// successful call always leaves `node` under a different parent.
    ///
    /// # Errors
    ///
    /// * [`TreeError::InvalidArguments`] if any two of `node`, `from` and
    ///   `to` are identical.
    /// * [`TreeError::NotFound`] if `node` is not live.
    /// * [`TreeError::RootMove`] if `node` is the root.
    /// * [`TreeError::UnknownParent`] if `to` is not live.
    /// * [`TreeError::ParentMismatch`] if `from` is not the parent of `node`.
    /// * [`TreeError::CycleDetected`] if `node` is an ancestor of `to`.
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(&mut self, node: &N, from: &N, to: &N) -> TreeResult<(), N> {
        if node == from {
            return Err(reject(TreeError::InvalidArguments {
                reason: "node and its current parent are identical",
            }));
        }
        if node == to {
            return Err(reject(TreeError::InvalidArguments {
                reason: "node and its new parent are identical",
            }));
        }
        if from == to {
            return Err(reject(TreeError::InvalidArguments {
                reason: "old and new parent are identical",
            }));
        }
        let idx = self
            .index_of(node)
            .ok_or_else(|| reject(TreeError::NotFound(node.clone())))?;
        if idx == self.root_index() {
            return Err(reject(TreeError::RootMove(node.clone())));
        }
        let to_idx = self
            .index_of(to)
            .ok_or_else(|| reject(TreeError::UnknownParent(to.clone())))?;
        self.expect_edge(node, from)?;
        // Walking up from `to` must not pass through `node`.
        if path::reachable(self, to, node) {
            return Err(reject(TreeError::CycleDetected {
                node: node.clone(),
                target: to.clone(),
            }));
        }
        assert!(
            !path::reachable(self, from, node),
            "[consistency] a node cannot be an ancestor of its own parent"
        );

        self.reattach(idx, to_idx);
        self.debug_assert_invariants();
        debug!("committed move");
        Ok(())
    }

    /// Applies one [`Mutation`].
    pub fn apply(&mut self, mutation: &Mutation<N>) -> TreeResult<(), N> {
        match mutation {
            Mutation::Add { node, parent } => self.add(node.clone(), parent.clone()),
            Mutation::Remove { node, parent } => self.remove(node, parent),
            Mutation::Move { node, from, to } => self.move_node(node, from, to),
        }
    }

    /// Applies `mutations` in order, all or nothing.
    ///
    /// Works on a copy of the tree; the copy replaces `self` only if every
    /// mutation is accepted.
    #[instrument(level = "debug", skip_all)]
    pub fn apply_all<'m, I>(&mut self, mutations: I) -> Result<(), BatchError<N>>
    where
        I: IntoIterator<Item = &'m Mutation<N>>,
        N: 'm,
    {
        let mut working = self.clone();
        for (index, mutation) in mutations.into_iter().enumerate() {
            working
                .apply(mutation)
                .map_err(|error| BatchError { index, error })?;
        }
        *self = working;
        Ok(())
    }

    fn expect_edge(&self, node: &N, parent: &N) -> TreeResult<(), N> {
        match self.parent_of(node) {
            Some(actual) if actual == parent && node != parent => Ok(()),
            Some(actual) => Err(reject(TreeError::ParentMismatch {
                node: node.clone(),
                claimed: parent.clone(),
                actual: actual.clone(),
            })),
            None => Err(reject(TreeError::NotFound(node.clone()))),
        }
    }
}

fn reject<N: NodeId>(error: TreeError<N>) -> TreeError<N> {
    debug!(%error, "rejected");
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    // R
    // └── A
    //     └── B
    //         └── C
    fn chain() -> Tree<&'static str> {
        let mut tree = Tree::new("R");
        tree.add("A", "R").unwrap();
        tree.add("B", "A").unwrap();
        tree.add("C", "B").unwrap();
        tree
    }

    #[test]
    fn test_move_splices_subtree() {
        let mut tree = chain();
        tree.move_node(&"B", &"A", &"R").unwrap();
        assert_eq!(tree.path_to_root(&"C"), vec!["C", "B", "R"]);
        assert_eq!(tree.path_to_root(&"A"), vec!["A", "R"]);
        assert!(tree.is_leaf(&"A"));
    }

    #[test]
    fn test_move_under_descendant_is_a_cycle() {
        let mut tree = chain();
        let before = tree.parent_map();
        let err = tree.move_node(&"A", &"R", &"B").unwrap_err();
        assert_eq!(err, TreeError::CycleDetected { node: "A", target: "B" });
        assert_eq!(tree.parent_map(), before);
    }

    #[test]
    fn test_move_to_same_parent_is_rejected() {
        let mut tree = chain();
        let err = tree.move_node(&"C", &"B", &"B").unwrap_err();
        assert!(matches!(err, TreeError::InvalidArguments { .. }));
    }

    #[test]
    fn test_remove_inner_node_is_rejected() {
        let mut tree = chain();
        assert_eq!(tree.remove(&"A", &"R"), Err(TreeError::NotLeaf("A")));
    }

    #[test]
    fn test_inverse_round_trip() {
        let mut tree = chain();
        let before = tree.parent_map();
        let mutation = Mutation::Move { node: "C", from: "B", to: "A" };
        tree.apply(&mutation).unwrap();
        tree.apply(&mutation.inverse()).unwrap();
        assert_eq!(tree.parent_map(), before);
    }

    #[test]
    fn test_apply_all_is_atomic() {
        let mut tree = chain();
        let before = tree.parent_map();
        let batch = vec![
            Mutation::Add { node: "D", parent: "C" },
            Mutation::Remove { node: "B", parent: "A" },
        ];
        let err = tree.apply_all(&batch).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.error, TreeError::NotLeaf("B"));
        assert_eq!(tree.parent_map(), before);
        assert!(!tree.contains(&"D"));
    }
}
