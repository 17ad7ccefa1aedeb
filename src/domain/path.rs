//! Edges, simple paths and reachability along parent pointers.
//!
//! Everything here is pure and works over any [`ParentMap`]. Because a
//! parent map is a function, the only simple path that can leave a node is
//! the walk through its successive parents. Reachability is therefore a
//! bounded parent walk, and a path between two nodes is unique whenever it
//! exists.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use tracing::instrument;

use crate::domain::NodeId;

/// Read access to a parent function over a finite domain.
pub trait ParentMap<N> {
    /// Parent of `node`, or `None` when `node` is outside the domain.
    fn parent(&self, node: &N) -> Option<&N>;

    /// Number of nodes in the domain. Bounds every walk.
    fn domain_size(&self) -> usize;
}

impl<N: Eq + Hash> ParentMap<N> for HashMap<N, N> {
    fn parent(&self, node: &N) -> Option<&N> {
        self.get(node)
    }

    fn domain_size(&self) -> usize {
        self.len()
    }
}

/// True iff `parent(x) == y` and `x != y`.
pub fn is_edge<N: NodeId, M: ParentMap<N> + ?Sized>(map: &M, x: &N, y: &N) -> bool {
    x != y && map.parent(x) == Some(y)
}

/// True iff `seq` is a simple path from `x` to `y`.
///
/// The empty sequence is a path exactly when `x == y`. Otherwise `seq` starts
/// at `x`, every consecutive pair is an edge, no element repeats, the last
/// element has an edge to `y`, and `y` does not occur inside `seq`.
pub fn is_path<N: NodeId, M: ParentMap<N> + ?Sized>(map: &M, x: &N, y: &N, seq: &[N]) -> bool {
    let (first, last) = match (seq.first(), seq.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return x == y,
    };
    if first != x || !is_edge(map, last, y) {
        return false;
    }
    if !seq.windows(2).all(|pair| is_edge(map, &pair[0], &pair[1])) {
        return false;
    }
    let mut seen = HashSet::with_capacity(seq.len());
    seq.iter().all(|node| node != y && seen.insert(node))
}

/// Iterator over `start` and its successive parents.
///
/// Yields nothing when `start` is outside the domain. Stops after the root
/// (a self-parented node), before the first node outside the domain, and
/// before the first repeated node. Never yields more than
/// `domain_size() + 1` items, so a malformed map cannot make it spin.
pub struct Ancestors<'a, N, M: ?Sized> {
    map: &'a M,
    next: Option<&'a N>,
    seen: HashSet<&'a N>,
    budget: usize,
}

/// Walk from `start` towards the root.
pub fn ancestors<'a, N: NodeId, M: ParentMap<N> + ?Sized>(
    map: &'a M,
    start: &'a N,
) -> Ancestors<'a, N, M> {
    Ancestors {
        map,
        next: map.parent(start).map(|_| start),
        seen: HashSet::new(),
        budget: map.domain_size() + 1,
    }
}

impl<'a, N: NodeId, M: ParentMap<N> + ?Sized> Iterator for Ancestors<'a, N, M> {
    type Item = &'a N;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if self.budget == 0 || !self.seen.insert(current) {
            return None;
        }
        self.budget -= 1;
        let map = self.map;
        self.next = map
            .parent(current)
            .filter(|parent| *parent != current && map.parent(parent).is_some());
        Some(current)
    }
}

/// The unique simple path from `x` to `y`, if one exists.
///
/// The returned sequence starts at `x` and excludes `y`; it is empty when
/// `x == y`.
#[instrument(level = "trace", skip(map))]
pub fn path_between<N: NodeId, M: ParentMap<N> + ?Sized>(map: &M, x: &N, y: &N) -> Option<Vec<N>> {
    if x == y {
        return Some(Vec::new());
    }
    let mut seq = Vec::new();
    for node in ancestors(map, x) {
        if node == y {
            return Some(seq);
        }
        seq.push(node.clone());
    }
    None
}

/// True iff some simple path leads from `x` to `y`.
pub fn reachable<N: NodeId, M: ParentMap<N> + ?Sized>(map: &M, x: &N, y: &N) -> bool {
    x == y || ancestors(map, x).any(|node| node == y)
}
