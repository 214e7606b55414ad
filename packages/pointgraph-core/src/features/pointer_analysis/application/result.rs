//! Final pointer-analysis results.
//!
//! The result owns the interner, heap model, graphs, and points-to map of
//! a finished solve. Auxiliary analyses deposit their outputs under a
//! string identifier, mirroring how the taint overlay publishes its flows.

use std::any::Any;
use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::features::pointer_analysis::domain::{
    CSCallGraph, CSManager, CSObjId, Context, ObjId, PointerFlowGraph, PointerId, PointerKind,
    PointsToSet,
};
use crate::features::pointer_analysis::ports::HeapModel;
use crate::features::taint_analysis::{TaintFlow, TAINT_FLOWS_ID};
use crate::shared::models::{MethodId, VarId};

/// Counters gathered during one solve.
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    pub reachable_methods: usize,
    pub call_edges: usize,
    pub pfg_edges: usize,
    pub tfg_edges: usize,
    pub worklist_polls: usize,
    /// Objects newly inserted into some points-to set.
    pub propagated_objects: usize,
    pub taint_flows: usize,
    pub duration_ms: f64,
}

/// Outcome of a context-sensitive solve.
pub struct PointerAnalysisResult {
    csm: CSManager,
    heap: Box<dyn HeapModel>,
    pfg: PointerFlowGraph,
    call_graph: CSCallGraph,
    pts: Vec<PointsToSet<CSObjId>>,
    stats: SolverStats,
    stored: FxHashMap<String, Box<dyn Any>>,
    empty: PointsToSet<CSObjId>,
}

impl PointerAnalysisResult {
    pub(crate) fn new(
        csm: CSManager,
        heap: Box<dyn HeapModel>,
        pfg: PointerFlowGraph,
        call_graph: CSCallGraph,
        pts: Vec<PointsToSet<CSObjId>>,
        stats: SolverStats,
    ) -> Self {
        Self {
            csm,
            heap,
            pfg,
            call_graph,
            pts,
            stats,
            stored: FxHashMap::default(),
            empty: PointsToSet::new(),
        }
    }

    pub fn cs_manager(&self) -> &CSManager {
        &self.csm
    }

    pub fn heap(&self) -> &dyn HeapModel {
        self.heap.as_ref()
    }

    pub fn call_graph(&self) -> &CSCallGraph {
        &self.call_graph
    }

    pub fn pointer_flow_graph(&self) -> &PointerFlowGraph {
        &self.pfg
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// Points-to set of a pointer node; uninstantiated pointers answer
    /// with the empty set.
    pub fn pt(&self, pointer: PointerId) -> &PointsToSet<CSObjId> {
        self.pts.get(pointer.index()).unwrap_or(&self.empty)
    }

    /// Points-to set of a variable under a specific context.
    pub fn pt_of_var(&self, ctx: &Context, var: VarId) -> &PointsToSet<CSObjId> {
        self.csm
            .find_ctx(ctx)
            .and_then(|c| self.csm.find_cs_var(c, var))
            .map_or(&self.empty, |p| self.pt(p))
    }

    /// Context-insensitive projection: all objects the variable may point
    /// to, merged over every context.
    pub fn points_to_objs(&self, var: VarId) -> PointsToSet<ObjId> {
        let mut merged = PointsToSet::new();
        for (pointer, kind) in self.csm.pointers() {
            if let PointerKind::CsVar { var: v, .. } = kind {
                if v == var {
                    for cs_obj in self.pt(pointer).iter() {
                        let (_, obj) = self.csm.cs_obj(cs_obj);
                        merged.add(obj);
                    }
                }
            }
        }
        merged
    }

    /// May the two variables refer to the same object in any context?
    pub fn may_alias(&self, a: VarId, b: VarId) -> bool {
        let pa = self.points_to_objs(a);
        let pb = self.points_to_objs(b);
        let result = pa.iter().any(|obj| pb.contains(obj));
        result
    }

    /// Is some context-sensitive instance of `method` reachable?
    pub fn is_method_reachable(&self, method: MethodId) -> bool {
        self.call_graph
            .reachable_methods()
            .iter()
            .any(|&m| self.csm.cs_method(m).1 == method)
    }

    /// Deposit an auxiliary analysis output under `id`.
    pub fn store(&mut self, id: &str, value: Box<dyn Any>) {
        self.stored.insert(id.to_string(), value);
    }

    /// Fetch an auxiliary analysis output.
    pub fn get<T: Any>(&self, id: &str) -> Option<&T> {
        self.stored.get(id).and_then(|v| v.downcast_ref())
    }

    /// Collected taint flows; empty when the overlay was disabled.
    pub fn taint_flows(&self) -> BTreeSet<TaintFlow> {
        self.get::<BTreeSet<TaintFlow>>(TAINT_FLOWS_ID)
            .cloned()
            .unwrap_or_default()
    }
}
