//! The pointer flow graph.
//!
//! Directed, unlabeled edges between pointer nodes; an edge `s -> t` means
//! `pt(s)` is a subset of `pt(t)` at the fixed point. Successor lists are
//! vector-backed by dense pointer id; duplicate edges are ignored.

use rustc_hash::FxHashSet;

use super::elements::PointerId;

#[derive(Debug, Default)]
pub struct PointerFlowGraph {
    succs: Vec<Vec<PointerId>>,
    edge_set: FxHashSet<(PointerId, PointerId)>,
}

impl PointerFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `source -> target`. Returns whether the edge is new.
    pub fn add_edge(&mut self, source: PointerId, target: PointerId) -> bool {
        if !self.edge_set.insert((source, target)) {
            return false;
        }
        if self.succs.len() <= source.index() {
            self.succs.resize_with(source.index() + 1, Vec::new);
        }
        self.succs[source.index()].push(target);
        true
    }

    /// Successors of `pointer`; empty for pointers without outgoing edges.
    pub fn succs_of(&self, pointer: PointerId) -> &[PointerId] {
        self.succs
            .get(pointer.index())
            .map_or(&[], Vec::as_slice)
    }

    pub fn num_edges(&self) -> usize {
        self.edge_set.len()
    }

    /// All edges, for invariant checking.
    pub fn edges(&self) -> impl Iterator<Item = (PointerId, PointerId)> + '_ {
        self.succs.iter().enumerate().flat_map(|(s, targets)| {
            targets
                .iter()
                .map(move |&t| (PointerId(s as u32), t))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_reports_novelty() {
        let mut pfg = PointerFlowGraph::new();
        let a = PointerId(0);
        let b = PointerId(1);
        assert!(pfg.add_edge(a, b));
        assert!(!pfg.add_edge(a, b));
        assert_eq!(pfg.num_edges(), 1);
        assert_eq!(pfg.succs_of(a), &[b]);
    }

    #[test]
    fn test_unknown_pointer_has_no_succs() {
        let pfg = PointerFlowGraph::new();
        assert!(pfg.succs_of(PointerId(42)).is_empty());
    }

    #[test]
    fn test_edges_iteration() {
        let mut pfg = PointerFlowGraph::new();
        pfg.add_edge(PointerId(0), PointerId(1));
        pfg.add_edge(PointerId(0), PointerId(2));
        pfg.add_edge(PointerId(2), PointerId(0));
        let edges: Vec<_> = pfg.edges().collect();
        assert_eq!(edges.len(), 3);
        assert!(edges.contains(&(PointerId(2), PointerId(0))));
    }
}
