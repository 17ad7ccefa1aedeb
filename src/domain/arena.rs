use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::InvariantViolation;
use crate::domain::path::{self, ParentMap};

/// Identity of a tree node, supplied by the host.
pub trait NodeId: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> NodeId for T {}

/// Slot of one live node in the arena.
#[derive(Debug, Clone)]
pub struct TreeNode<N> {
    /// Host identity of this node
    pub id: N,
    /// Index of parent node in the arena, None only for the root
    pub(crate) parent: Option<Index>,
    /// Indices of child nodes in the arena, in insertion order
    pub(crate) children: Vec<Index>,
}

/// Rooted tree of parent pointers stored in a generational arena.
///
/// The arena's live slots are the domain; `parent` fields are the parent
/// map, with the root mapping to itself. Removed slots are never handed out
/// again under the same generation, so re-adding an identity yields a fresh
/// node.
///
/// Between calls the tree always satisfies:
/// the root is live and self-parented, every parent is live, and every node
/// reaches the root along a simple path.
#[derive(Debug, Clone)]
pub struct Tree<N> {
    /// Arena storage for all live nodes
    arena: Arena<TreeNode<N>>,
    /// Identity to slot lookup
    index: HashMap<N, Index>,
    /// Slot of the root node
    root: Index,
}

impl<N: NodeId> Tree<N> {
    /// Creates a tree whose domain is `{root}`.
    pub fn new(root: N) -> Self {
        let mut arena = Arena::new();
        let root_idx = arena.insert(TreeNode {
            id: root.clone(),
            parent: None,
            children: Vec::new(),
        });
        let mut index = HashMap::new();
        index.insert(root, root_idx);
        Self {
            arena,
            index,
            root: root_idx,
        }
    }

    pub fn root(&self) -> &N {
        &self.slot(self.root).id
    }

    pub fn contains(&self, id: &N) -> bool {
        self.index.contains_key(id)
    }

    /// Parent of `id`; the root is its own parent.
    ///
    /// Returns `None` if `id` is not live.
    pub fn parent_of(&self, id: &N) -> Option<&N> {
        let node = self.slot(self.index_of(id)?);
        let parent = node.parent.map_or(node, |p| self.slot(p));
        Some(&parent.id)
    }

    /// Children of `id` in insertion order. Empty if `id` is not live.
    pub fn children_of<'a>(&'a self, id: &N) -> impl Iterator<Item = &'a N> + 'a {
        let children = self
            .index_of(id)
            .map(|idx| self.slot(idx).children.as_slice())
            .unwrap_or(&[]);
        children.iter().map(move |&c| &self.slot(c).id)
    }

    /// True if `id` is live and nothing has it as parent.
    pub fn is_leaf(&self, id: &N) -> bool {
        self.index_of(id)
            .map_or(false, |idx| self.slot(idx).children.is_empty())
    }

    /// Path from `id` up to and including the root.
    ///
    /// `[root]` for the root itself, empty if `id` is not live.
    #[instrument(level = "trace", skip(self))]
    pub fn path_to_root(&self, id: &N) -> Vec<N> {
        path::ancestors(self, id).cloned().collect()
    }

    /// True if `ancestor` lies strictly above `node`.
    pub fn is_ancestor(&self, ancestor: &N, node: &N) -> bool {
        ancestor != node && self.contains(ancestor) && path::reachable(self, node, ancestor)
    }

    /// Number of edges between `id` and the root.
    pub fn depth_of(&self, id: &N) -> Option<usize> {
        path::ancestors(self, id).count().checked_sub(1)
    }

    /// Number of levels in the tree; 1 for a tree holding only the root.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((idx, level)) = stack.pop() {
            max = max.max(level);
            for &child in &self.slot(idx).children {
                stack.push((child, level + 1));
            }
        }
        max
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Collects all leaf nodes in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaves(&self) -> Vec<&N> {
        self.iter().filter(|id| self.is_leaf(id)).collect()
    }

    /// Pre-order traversal starting at the root.
    pub fn iter(&self) -> TreeIterator<'_, N> {
        TreeIterator::new(self, Some(self.root))
    }

    /// Post-order traversal starting at the root.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_, N> {
        PostOrderIterator::new(self, self.root)
    }

    /// Every node strictly below `id`, in pre-order.
    pub fn descendants(&self, id: &N) -> impl Iterator<Item = &N> + '_ {
        TreeIterator::new(self, self.index_of(id)).skip(1)
    }

    /// Snapshot of the parent map, root mapped to itself.
    pub fn parent_map(&self) -> HashMap<N, N> {
        self.arena
            .iter()
            .map(|(_, node)| {
                let parent = node.parent.map_or(node, |p| self.slot(p));
                (node.id.clone(), parent.id.clone())
            })
            .collect()
    }

    /// Verifies every structural invariant.
    ///
    /// Walks the whole tree; meant for tests, verified replays and debug
    /// builds.
    #[instrument(level = "debug", skip(self))]
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let root = self
            .arena
            .get(self.root)
            .ok_or(InvariantViolation::RootMissing)?;
        if root.parent.is_some() {
            return Err(InvariantViolation::RootNotSelfParented);
        }
        if self.index.len() != self.arena.len() {
            return Err(InvariantViolation::IndexMismatch {
                node: format!("{:?}", root.id),
            });
        }

        for (idx, node) in self.arena.iter() {
            let name = || format!("{:?}", node.id);
            if self.index.get(&node.id) != Some(&idx) {
                return Err(InvariantViolation::IndexMismatch { node: name() });
            }
            match node.parent {
                None if idx != self.root => {
                    return Err(InvariantViolation::Unrooted { node: name() });
                }
                None => {}
                Some(p) => {
                    let parent = self
                        .arena
                        .get(p)
                        .ok_or_else(|| InvariantViolation::DanglingParent { node: name() })?;
                    if !parent.children.contains(&idx) {
                        return Err(InvariantViolation::ChildListMismatch {
                            node: format!("{:?}", parent.id),
                        });
                    }
                }
            }
            for &child in &node.children {
                if self.arena.get(child).and_then(|c| c.parent) != Some(idx) {
                    return Err(InvariantViolation::ChildListMismatch { node: name() });
                }
            }
            if !self.reaches_root(idx) {
                return Err(InvariantViolation::Unrooted { node: name() });
            }
        }
        Ok(())
    }

    /// Raw parent walk that tolerates dangling slots and cycles.
    fn reaches_root(&self, start: Index) -> bool {
        let mut current = start;
        for _ in 0..=self.arena.len() {
            match self.arena.get(current).map(|node| node.parent) {
                None => return false,
                Some(None) => return current == self.root,
                Some(Some(parent)) => current = parent,
            }
        }
        false
    }

    /// Panics on a broken invariant in debug builds.
    pub(crate) fn debug_assert_invariants(&self) {
        if cfg!(debug_assertions) {
            if let Err(violation) = self.check_invariants() {
                panic!("[consistency] tree invariant broken: {violation}");
            }
        }
    }

    pub(crate) fn index_of(&self, id: &N) -> Option<Index> {
        self.index.get(id).copied()
    }

    pub(crate) fn root_index(&self) -> Index {
        self.root
    }

    pub(crate) fn slot(&self, idx: Index) -> &TreeNode<N> {
        self.arena
            .get(idx)
            .expect("[consistency] indices held by the tree must be live")
    }

    fn slot_mut(&mut self, idx: Index) -> &mut TreeNode<N> {
        self.arena
            .get_mut(idx)
            .expect("[consistency] indices held by the tree must be live")
    }

    /// Links a new node under `parent`. Preconditions are the caller's.
    pub(crate) fn insert_leaf(&mut self, id: N, parent: Index) -> Index {
        let idx = self.arena.insert(TreeNode {
            id: id.clone(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.slot_mut(parent).children.push(idx);
        self.index.insert(id, idx);
        idx
    }

    /// Unlinks a non-root leaf. Preconditions are the caller's.
    pub(crate) fn remove_leaf(&mut self, idx: Index) -> N {
        let node = self
            .arena
            .remove(idx)
            .expect("[consistency] removed node must be live");
        if let Some(parent) = node.parent {
            self.slot_mut(parent).children.retain(|&c| c != idx);
        }
        self.index.remove(&node.id);
        node.id
    }

    /// Points `idx` at `new_parent`, carrying its subtree along.
    /// Preconditions are the caller's.
    pub(crate) fn reattach(&mut self, idx: Index, new_parent: Index) {
        if let Some(old_parent) = self.slot(idx).parent {
            self.slot_mut(old_parent).children.retain(|&c| c != idx);
        }
        self.slot_mut(new_parent).children.push(idx);
        self.slot_mut(idx).parent = Some(new_parent);
    }
}

impl<N: NodeId> ParentMap<N> for Tree<N> {
    fn parent(&self, node: &N) -> Option<&N> {
        self.parent_of(node)
    }

    fn domain_size(&self) -> usize {
        self.node_count()
    }
}

pub struct TreeIterator<'a, N> {
    tree: &'a Tree<N>,
    stack: Vec<Index>,
}

impl<'a, N: NodeId> TreeIterator<'a, N> {
    fn new(tree: &'a Tree<N>, start: Option<Index>) -> Self {
        Self {
            tree,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a, N: NodeId> Iterator for TreeIterator<'a, N> {
    type Item = &'a N;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let node = self.tree.slot(current);
        // Push children in reverse order for left-to-right traversal
        self.stack.extend(node.children.iter().rev());
        Some(&node.id)
    }
}

pub struct PostOrderIterator<'a, N> {
    tree: &'a Tree<N>,
    stack: Vec<(Index, bool)>,
}

impl<'a, N: NodeId> PostOrderIterator<'a, N> {
    fn new(tree: &'a Tree<N>, start: Index) -> Self {
        Self {
            tree,
            stack: vec![(start, false)],
        }
    }
}

impl<'a, N: NodeId> Iterator for PostOrderIterator<'a, N> {
    type Item = &'a N;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            let node = self.tree.slot(current);
            if visited {
                return Some(&node.id);
            }
            self.stack.push((current, true));
            for &child in node.children.iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}
