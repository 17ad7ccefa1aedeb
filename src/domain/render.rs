use std::fmt;

use generational_arena::Index;
use termtree::Tree as TermTree;

use crate::domain::arena::{NodeId, Tree};

/// Deepest level drawn by [`TreeNodeConvert::to_tree_string`]; anything
/// below is summarized on its ancestor at this level.
pub const MAX_RENDER_DEPTH: usize = 256;

/// Conversion into a printable `termtree` view.
pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> TermTree<String>;
}

impl<N: NodeId + fmt::Display> TreeNodeConvert for Tree<N> {
    /// Builds the view bottom-up from a post-order walk, so arbitrarily deep
    /// trees need no recursion. Levels past [`MAX_RENDER_DEPTH`] are cut off.
    fn to_tree_string(&self) -> TermTree<String> {
        // (slot, level, children already pushed)
        let mut stack: Vec<(Index, usize, bool)> = vec![(self.root_index(), 0, false)];
        let mut built: Vec<TermTree<String>> = Vec::new();

        while let Some((idx, level, expanded)) = stack.pop() {
            let node = self.slot(idx);
            if level == MAX_RENDER_DEPTH && !node.children.is_empty() {
                let hidden = self.descendants(&node.id).count();
                built.push(TermTree::new(format!("{} ({hidden} more)", node.id)));
                continue;
            }
            if !expanded {
                stack.push((idx, level, true));
                for &child in node.children.iter().rev() {
                    stack.push((child, level + 1, false));
                }
                continue;
            }
            let first_child = built.len() - node.children.len();
            let mut view = TermTree::new(node.id.to_string());
            for child in built.drain(first_child..) {
                view.push(child);
            }
            built.push(view);
        }

        built
            .pop()
            .expect("[consistency] the root view is built last")
    }
}

impl<N: NodeId + fmt::Display> fmt::Display for Tree<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_tree_string())
    }
}
