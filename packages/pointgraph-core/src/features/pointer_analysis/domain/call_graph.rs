//! The context-sensitive call graph.
//!
//! Reachable methods in discovery order, plus deduplicated typed edges
//! from call sites to callees. Both only grow.

use rustc_hash::FxHashSet;

use crate::shared::models::CallKind;

use super::elements::{CSCallSiteId, CSMethodId};

/// A call edge from a context-sensitive call site to its callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallEdge {
    pub kind: CallKind,
    pub call_site: CSCallSiteId,
    pub callee: CSMethodId,
}

#[derive(Debug, Default)]
pub struct CSCallGraph {
    reachable: Vec<CSMethodId>,
    reachable_set: FxHashSet<CSMethodId>,
    edges: Vec<CallEdge>,
    edge_set: FxHashSet<(CSCallSiteId, CSMethodId)>,
    entries: Vec<CSMethodId>,
}

impl CSCallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry method (it still needs `add_reachable_method`).
    pub fn add_entry_method(&mut self, method: CSMethodId) {
        self.entries.push(method);
    }

    pub fn entry_methods(&self) -> &[CSMethodId] {
        &self.entries
    }

    /// Mark a method reachable. Returns whether it is newly reachable.
    pub fn add_reachable_method(&mut self, method: CSMethodId) -> bool {
        if !self.reachable_set.insert(method) {
            return false;
        }
        self.reachable.push(method);
        true
    }

    pub fn is_reachable(&self, method: CSMethodId) -> bool {
        self.reachable_set.contains(&method)
    }

    /// Reachable methods in discovery order.
    pub fn reachable_methods(&self) -> &[CSMethodId] {
        &self.reachable
    }

    /// Install a call edge. Returns whether it is new; the kind of an
    /// already-present (call site, callee) pair is not updated.
    pub fn add_edge(&mut self, kind: CallKind, call_site: CSCallSiteId, callee: CSMethodId) -> bool {
        if !self.edge_set.insert((call_site, callee)) {
            return false;
        }
        self.edges.push(CallEdge {
            kind,
            call_site,
            callee,
        });
        true
    }

    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Callees reachable from a specific call site.
    pub fn callees_of(&self, call_site: CSCallSiteId) -> impl Iterator<Item = CSMethodId> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.call_site == call_site)
            .map(|e| e.callee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reachable_dedup_and_order() {
        let mut cg = CSCallGraph::new();
        assert!(cg.add_reachable_method(CSMethodId(1)));
        assert!(cg.add_reachable_method(CSMethodId(0)));
        assert!(!cg.add_reachable_method(CSMethodId(1)));
        assert_eq!(cg.reachable_methods(), &[CSMethodId(1), CSMethodId(0)]);
        assert!(cg.is_reachable(CSMethodId(0)));
        assert!(!cg.is_reachable(CSMethodId(2)));
    }

    #[test]
    fn test_edge_dedup() {
        let mut cg = CSCallGraph::new();
        assert!(cg.add_edge(CallKind::Static, CSCallSiteId(0), CSMethodId(0)));
        assert!(!cg.add_edge(CallKind::Static, CSCallSiteId(0), CSMethodId(0)));
        assert!(cg.add_edge(CallKind::Virtual, CSCallSiteId(0), CSMethodId(1)));
        assert_eq!(cg.num_edges(), 2);
    }

    #[test]
    fn test_callees_of_filters_by_site() {
        let mut cg = CSCallGraph::new();
        cg.add_edge(CallKind::Virtual, CSCallSiteId(0), CSMethodId(0));
        cg.add_edge(CallKind::Virtual, CSCallSiteId(1), CSMethodId(1));
        let callees: Vec<_> = cg.callees_of(CSCallSiteId(0)).collect();
        assert_eq!(callees, vec![CSMethodId(0)]);
    }
}
