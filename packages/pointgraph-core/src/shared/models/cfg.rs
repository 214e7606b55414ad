//! Per-method control-flow graphs with typed edges.
//!
//! Nodes are statement ids of a single method; edge kinds distinguish the
//! branch outcomes the dead-code detector prunes on.

use rustc_hash::FxHashMap;

use super::types::{MethodId, StmtId};

/// Why control flows from one statement to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Straight-line fall-through.
    Fall,
    /// Unconditional jump.
    Goto,
    /// Taken branch of an `if`.
    IfTrue,
    /// Not-taken branch of an `if`.
    IfFalse,
    /// `switch` case with the given match value.
    SwitchCase(i64),
    /// `switch` default target.
    SwitchDefault,
}

/// Outgoing CFG edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfgEdge {
    pub kind: EdgeKind,
    pub target: StmtId,
}

/// Control-flow graph of one method.
#[derive(Debug, Clone)]
pub struct Cfg {
    pub method: MethodId,
    entry: StmtId,
    exit: StmtId,
    out_edges: FxHashMap<StmtId, Vec<CfgEdge>>,
    nodes: Vec<StmtId>,
}

impl Cfg {
    pub fn entry(&self) -> StmtId {
        self.entry
    }

    pub fn exit(&self) -> StmtId {
        self.exit
    }

    pub fn out_edges(&self, stmt: StmtId) -> &[CfgEdge] {
        self.out_edges.get(&stmt).map_or(&[], Vec::as_slice)
    }

    /// All nodes, in registration order.
    pub fn nodes(&self) -> &[StmtId] {
        &self.nodes
    }
}

/// Builder for [`Cfg`]. Entry and exit are ordinary statement nodes
/// (typically `Nop` markers).
#[derive(Debug)]
pub struct CfgBuilder {
    method: MethodId,
    entry: StmtId,
    exit: StmtId,
    out_edges: FxHashMap<StmtId, Vec<CfgEdge>>,
    nodes: Vec<StmtId>,
    seen: rustc_hash::FxHashSet<StmtId>,
}

impl CfgBuilder {
    pub fn new(method: MethodId, entry: StmtId, exit: StmtId) -> Self {
        let mut b = Self {
            method,
            entry,
            exit,
            out_edges: FxHashMap::default(),
            nodes: Vec::new(),
            seen: rustc_hash::FxHashSet::default(),
        };
        b.register(entry);
        b.register(exit);
        b
    }

    fn register(&mut self, node: StmtId) {
        if self.seen.insert(node) {
            self.nodes.push(node);
        }
    }

    pub fn edge(&mut self, from: StmtId, kind: EdgeKind, to: StmtId) -> &mut Self {
        self.register(from);
        self.register(to);
        self.out_edges
            .entry(from)
            .or_default()
            .push(CfgEdge { kind, target: to });
        self
    }

    /// Fall-through edge, the common case.
    pub fn fall(&mut self, from: StmtId, to: StmtId) -> &mut Self {
        self.edge(from, EdgeKind::Fall, to)
    }

    pub fn build(self) -> Cfg {
        Cfg {
            method: self.method,
            entry: self.entry,
            exit: self.exit,
            out_edges: self.out_edges,
            nodes: self.nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_and_nodes() {
        let m = MethodId(0);
        let a = StmtId(0);
        let b = StmtId(1);
        let c = StmtId(2);
        let mut builder = CfgBuilder::new(m, a, c);
        builder.fall(a, b).edge(b, EdgeKind::Goto, c);
        let cfg = builder.build();

        assert_eq!(cfg.entry(), a);
        assert_eq!(cfg.exit(), c);
        assert_eq!(cfg.out_edges(a).len(), 1);
        assert_eq!(cfg.out_edges(b)[0].kind, EdgeKind::Goto);
        assert!(cfg.out_edges(c).is_empty());
        assert_eq!(cfg.nodes().len(), 3);
    }
}
