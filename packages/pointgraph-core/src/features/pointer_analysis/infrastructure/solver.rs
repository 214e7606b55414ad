//! The context-sensitive fixed-point solver.
//!
//! Inclusion-based whole-program pointer analysis over a dynamically
//! growing pointer flow graph and call graph, with the taint overlay
//! riding the same work list. Strictly single-threaded; termination
//! follows from monotone updates over a finite universe and the
//! delta-only propagation discipline.

use std::collections::BTreeSet;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use crate::errors::{PointgraphError, Result};
use crate::features::pointer_analysis::application::result::{
    PointerAnalysisResult, SolverStats,
};
use crate::features::pointer_analysis::domain::{
    CSCallGraph, CSManager, CSMethodId, CSObjId, CtxId, Discipline, PointerFlowGraph, PointerId,
    PointerKind, PointsToSet, WorkList,
};
use crate::features::pointer_analysis::ports::{CalleeResolver, ContextSelector, HeapModel};
use crate::features::taint_analysis::domain::ResolvedTaintConfig;
use crate::features::taint_analysis::{TaintFlow, TaintManager, TAINT_FLOWS_ID};
use crate::shared::models::{CallKind, FieldAccess, InvokeId, MethodId, Program, StmtKind, TypeId, VarId};

use super::heap::AllocSiteHeapModel;

/// Context-sensitive pointer-analysis solver with a taint overlay.
///
/// One instance performs one solve; all interner tables, graphs, and
/// points-to sets are owned by it and move into the result.
pub struct Solver<'a> {
    program: &'a Program,
    selector: &'a dyn ContextSelector,
    resolver: &'a dyn CalleeResolver,
    heap: Box<dyn HeapModel>,
    csm: CSManager,
    pfg: PointerFlowGraph,
    work_list: WorkList,
    call_graph: CSCallGraph,
    pts: Vec<PointsToSet<CSObjId>>,
    /// Taint flow graph: source pointer -> (target pointer, rewrite type).
    tfg: FxHashMap<PointerId, FxHashSet<(PointerId, TypeId)>>,
    taint: TaintManager,
    empty_ctx: CtxId,
    stats: SolverStats,
}

impl<'a> Solver<'a> {
    pub fn new(
        program: &'a Program,
        selector: &'a dyn ContextSelector,
        resolver: &'a dyn CalleeResolver,
    ) -> Self {
        let mut csm = CSManager::new();
        let empty_ctx = csm.get_ctx(&selector.empty_context());
        Self {
            program,
            selector,
            resolver,
            heap: Box::new(AllocSiteHeapModel::new()),
            csm,
            pfg: PointerFlowGraph::new(),
            work_list: WorkList::new(),
            call_graph: CSCallGraph::new(),
            pts: Vec::new(),
            tfg: FxHashMap::default(),
            taint: TaintManager::disabled(),
            empty_ctx,
            stats: SolverStats::default(),
        }
    }

    /// Enable the taint overlay.
    pub fn with_taint_config(mut self, config: ResolvedTaintConfig) -> Self {
        self.taint = TaintManager::new(config);
        self
    }

    /// Replace the heap model; the default interns one object per
    /// allocation site.
    pub fn with_heap_model(mut self, heap: Box<dyn HeapModel>) -> Self {
        self.heap = heap;
        self
    }

    /// Work-list polling order; the fixed point does not depend on it.
    pub fn with_discipline(mut self, discipline: Discipline) -> Self {
        self.work_list = WorkList::with_discipline(discipline);
        self
    }

    /// Run to the fixed point and collect results.
    pub fn solve(mut self) -> Result<PointerAnalysisResult> {
        let start = Instant::now();
        self.initialize()?;
        self.analyze();
        let flows = self.collect_taint_flows();

        self.stats.reachable_methods = self.call_graph.reachable_methods().len();
        self.stats.call_edges = self.call_graph.num_edges();
        self.stats.pfg_edges = self.pfg.num_edges();
        self.stats.tfg_edges = self.tfg.values().map(|targets| targets.len()).sum();
        self.stats.taint_flows = flows.len();
        self.stats.duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            reachable = self.stats.reachable_methods,
            pfg_edges = self.stats.pfg_edges,
            call_edges = self.stats.call_edges,
            polls = self.stats.worklist_polls,
            "pointer analysis converged"
        );

        let mut result = PointerAnalysisResult::new(
            self.csm,
            self.heap,
            self.pfg,
            self.call_graph,
            self.pts,
            self.stats,
        );
        result.store(TAINT_FLOWS_ID, Box::new(flows));
        Ok(result)
    }

    fn initialize(&mut self) -> Result<()> {
        let entry = self
            .program
            .entry()
            .ok_or_else(|| PointgraphError::analysis("program has no entry method"))?;
        info!(
            entry = %self.program.method(entry).signature,
            taint = self.taint.is_enabled(),
            "starting pointer analysis"
        );
        let cs_entry = self.csm.get_cs_method(self.empty_ctx, entry);
        self.call_graph.add_entry_method(cs_entry);
        self.add_reachable(cs_entry);
        Ok(())
    }

    /// Process a newly reachable context-sensitive method: translate its
    /// statements into PFG edges and initial facts, exactly once.
    fn add_reachable(&mut self, cs_method: CSMethodId) {
        if !self.call_graph.add_reachable_method(cs_method) {
            return;
        }
        let (ctx, method) = self.csm.cs_method(cs_method);
        debug!(method = %self.program.method(method).signature, "reachable");
        self.process_stmts(ctx, method);
    }

    fn process_stmts(&mut self, ctx: CtxId, method: MethodId) {
        let program = self.program;
        let selector = self.selector;
        for &sid in &program.method(method).ir.stmts {
            match program.stmt(sid).kind {
                StmtKind::New { lhs, ty } => {
                    let obj = self.heap.obj_of_alloc(sid, ty);
                    let heap_ctx = selector.select_heap_context(self.csm.context(ctx), obj);
                    let heap_ctx = self.csm.get_ctx(&heap_ctx);
                    let cs_obj = self.csm.get_cs_obj(heap_ctx, obj);
                    let target = self.csm.get_cs_var(ctx, lhs);
                    self.work_list
                        .add_entry(target, PointsToSet::singleton(cs_obj));
                }
                StmtKind::Copy { lhs, rhs } => {
                    let source = self.csm.get_cs_var(ctx, rhs);
                    let target = self.csm.get_cs_var(ctx, lhs);
                    self.add_pfg_edge(source, target);
                }
                StmtKind::StoreField {
                    base: None,
                    field,
                    rhs,
                } => {
                    let source = self.csm.get_cs_var(ctx, rhs);
                    let target = self.csm.get_static_field(field);
                    self.add_pfg_edge(source, target);
                }
                StmtKind::LoadField {
                    lhs,
                    base: None,
                    field,
                } => {
                    let source = self.csm.get_static_field(field);
                    let target = self.csm.get_cs_var(ctx, lhs);
                    self.add_pfg_edge(source, target);
                }
                StmtKind::Invoke(invoke) if program.invoke(invoke).kind == CallKind::Static => {
                    self.process_static_call(ctx, invoke);
                }
                // Instance field/array accesses and instance calls depend
                // on the receiver's points-to set; they fire in the delta
                // loop of `analyze`.
                _ => {}
            }
        }
    }

    fn process_static_call(&mut self, caller_ctx: CtxId, inv: InvokeId) {
        let program = self.program;
        let selector = self.selector;
        let invoke = program.invoke(inv);
        let Some(callee) = self.resolver.resolve(None, invoke) else {
            debug!(callee = %invoke.callee.name, "unresolvable static call");
            return;
        };
        let callee_ctx = selector.select_static_context(self.csm.context(caller_ctx), inv, callee);
        let callee_ctx = self.csm.get_ctx(&callee_ctx);
        let cs_call = self.csm.get_cs_call_site(caller_ctx, inv);
        let cs_callee = self.csm.get_cs_method(callee_ctx, callee);
        if self
            .call_graph
            .add_edge(CallKind::Static, cs_call, cs_callee)
        {
            self.add_reachable(cs_callee);
            self.install_call_edges(caller_ctx, inv, callee_ctx, callee, None);
        }
    }

    /// Parameter, return, and taint-transfer edges for a freshly installed
    /// call edge. `recv_ptr` is the receiver pointer for instance calls;
    /// receiver-based transfers are skipped for static calls.
    fn install_call_edges(
        &mut self,
        caller_ctx: CtxId,
        inv: InvokeId,
        callee_ctx: CtxId,
        callee: MethodId,
        recv_ptr: Option<PointerId>,
    ) {
        let program = self.program;
        let invoke = program.invoke(inv);
        let ir = &program.method(callee).ir;
        assert_eq!(
            invoke.args.len(),
            ir.params.len(),
            "arity mismatch calling {}",
            program.method(callee).signature
        );

        for (i, (&arg, &param)) in invoke.args.iter().zip(ir.params.iter()).enumerate() {
            let source = self.csm.get_cs_var(caller_ctx, arg);
            let target = self.csm.get_cs_var(callee_ctx, param);
            self.add_pfg_edge(source, target);

            if let Some(recv_ptr) = recv_ptr {
                for ty in self.taint.arg_to_base(callee, i as u32).to_vec() {
                    self.add_tfg_edge(source, recv_ptr, ty);
                }
            }
            if let Some(result) = invoke.result {
                for ty in self.taint.arg_to_result(callee, i as u32).to_vec() {
                    let result_ptr = self.csm.get_cs_var(caller_ctx, result);
                    self.add_tfg_edge(source, result_ptr, ty);
                }
            }
        }

        if let Some(result) = invoke.result {
            let result_ptr = self.csm.get_cs_var(caller_ctx, result);
            for &ret in &ir.ret_vars {
                let source = self.csm.get_cs_var(callee_ctx, ret);
                self.add_pfg_edge(source, result_ptr);
            }
            for ty in self.taint.sources_of(callee).to_vec() {
                let taint_obj = self.taint_cs_obj(inv, ty);
                self.work_list
                    .add_entry(result_ptr, PointsToSet::singleton(taint_obj));
            }
            if let Some(recv_ptr) = recv_ptr {
                for ty in self.taint.base_to_result(callee).to_vec() {
                    self.add_tfg_edge(recv_ptr, result_ptr, ty);
                }
            }
        }
    }

    /// Install a PFG edge; if it is new and the source already has facts,
    /// ship them to the target.
    fn add_pfg_edge(&mut self, source: PointerId, target: PointerId) {
        if !self.pfg.add_edge(source, target) {
            return;
        }
        if let Some(pt_source) = self.pts.get(source.index()) {
            if !pt_source.is_empty() {
                let pt_source = pt_source.clone();
                self.work_list.add_entry(target, pt_source);
            }
        }
    }

    /// Install a TFG edge; on first installation, re-emit every taint
    /// object currently in `pt(source)` at the target with the rewritten
    /// type. Non-taint objects never drive TFG transfers.
    fn add_tfg_edge(&mut self, source: PointerId, target: PointerId, ty: TypeId) {
        if !self.tfg.entry(source).or_default().insert((target, ty)) {
            return;
        }
        let taint_sources: Vec<InvokeId> = match self.pts.get(source.index()) {
            Some(pt) => pt
                .iter()
                .filter_map(|cs_obj| {
                    let (_, obj) = self.csm.cs_obj(cs_obj);
                    self.heap.source_call(obj)
                })
                .collect(),
            None => Vec::new(),
        };
        let mut out = PointsToSet::new();
        for source_call in taint_sources {
            out.add(self.taint_cs_obj(source_call, ty));
        }
        if !out.is_empty() {
            self.work_list.add_entry(target, out);
        }
    }

    fn taint_cs_obj(&mut self, source_call: InvokeId, ty: TypeId) -> CSObjId {
        self.taint.taint_obj(
            self.heap.as_mut(),
            &mut self.csm,
            self.empty_ctx,
            source_call,
            ty,
        )
    }

    /// Drain the work list to the fixed point.
    fn analyze(&mut self) {
        let program = self.program;
        while let Some(entry) = self.work_list.poll_entry() {
            self.stats.worklist_polls += 1;
            let delta = self.propagate(entry.pointer, &entry.pts);
            if delta.is_empty() {
                continue;
            }
            let PointerKind::CsVar { ctx, var } = self.csm.pointer(entry.pointer) else {
                continue;
            };
            let var_data = program.var(var);
            for cs_obj in delta.iter() {
                for &FieldAccess { field, var: rhs } in &var_data.store_fields {
                    let source = self.csm.get_cs_var(ctx, rhs);
                    let target = self.csm.get_instance_field(cs_obj, field);
                    self.add_pfg_edge(source, target);
                }
                for &FieldAccess { field, var: lhs } in &var_data.load_fields {
                    let source = self.csm.get_instance_field(cs_obj, field);
                    let target = self.csm.get_cs_var(ctx, lhs);
                    self.add_pfg_edge(source, target);
                }
                for &rhs in &var_data.store_arrays {
                    let source = self.csm.get_cs_var(ctx, rhs);
                    let target = self.csm.get_array_index(cs_obj);
                    self.add_pfg_edge(source, target);
                }
                for &lhs in &var_data.load_arrays {
                    let source = self.csm.get_array_index(cs_obj);
                    let target = self.csm.get_cs_var(ctx, lhs);
                    self.add_pfg_edge(source, target);
                }
                self.process_call(ctx, var, cs_obj);
            }
        }
    }

    /// Merge `pts` into `pt(pointer)`; returns the strictly new objects
    /// and fans them out to PFG successors. Fires the taint re-emission
    /// hook once per newly inserted taint object.
    fn propagate(&mut self, pointer: PointerId, pts: &PointsToSet<CSObjId>) -> PointsToSet<CSObjId> {
        let mut delta = PointsToSet::new();
        if pts.is_empty() {
            return delta;
        }
        for cs_obj in pts.iter() {
            if self.pts.len() <= pointer.index() {
                self.pts.resize_with(pointer.index() + 1, PointsToSet::new);
            }
            if !self.pts[pointer.index()].add(cs_obj) {
                continue;
            }
            delta.add(cs_obj);
            self.stats.propagated_objects += 1;

            let (_, obj) = self.csm.cs_obj(cs_obj);
            if let Some(source_call) = self.heap.source_call(obj) {
                if let Some(transfers) = self.tfg.get(&pointer) {
                    let transfers: Vec<(PointerId, TypeId)> = transfers.iter().copied().collect();
                    for (target, ty) in transfers {
                        let taint_obj = self.taint_cs_obj(source_call, ty);
                        self.work_list
                            .add_entry(target, PointsToSet::singleton(taint_obj));
                    }
                }
            }
        }
        if !delta.is_empty() {
            let succs = self.pfg.succs_of(pointer).to_vec();
            for succ in succs {
                self.work_list.add_entry(succ, delta.clone());
            }
        }
        delta
    }

    /// Process the instance calls on a receiver variable for one newly
    /// discovered receiver object.
    fn process_call(&mut self, ctx: CtxId, recv_var: VarId, recv_cs_obj: CSObjId) {
        let program = self.program;
        let selector = self.selector;
        for &inv in &program.var(recv_var).invokes {
            let invoke = program.invoke(inv);
            let (recv_heap_ctx, recv_obj) = self.csm.cs_obj(recv_cs_obj);
            let recv_ty = self.heap.obj(recv_obj).ty;
            let Some(callee) = self.resolver.resolve(Some(recv_ty), invoke) else {
                debug!(callee = %invoke.callee.name, "unresolvable instance call");
                continue;
            };
            let callee_ctx = selector.select_instance_context(
                self.csm.context(ctx),
                inv,
                self.csm.context(recv_heap_ctx),
                recv_obj,
                callee,
            );
            let callee_ctx = self.csm.get_ctx(&callee_ctx);

            let callee_ir = &program.method(callee).ir;
            let this = callee_ir.this.unwrap_or_else(|| {
                panic!(
                    "instance callee {} has no `this` variable",
                    program.method(callee).signature
                )
            });
            // Enqueued on every call-processing step, not only for new
            // edges; idempotent under the delta discipline.
            let this_ptr = self.csm.get_cs_var(callee_ctx, this);
            self.work_list
                .add_entry(this_ptr, PointsToSet::singleton(recv_cs_obj));

            let cs_call = self.csm.get_cs_call_site(ctx, inv);
            let cs_callee = self.csm.get_cs_method(callee_ctx, callee);
            if self.call_graph.add_edge(invoke.kind, cs_call, cs_callee) {
                self.add_reachable(cs_callee);
                let recv_ptr = self.csm.get_cs_var(ctx, recv_var);
                self.install_call_edges(ctx, inv, callee_ctx, callee, Some(recv_ptr));
            }
        }
    }

    /// For every call edge into a configured sink, report each taint
    /// object reaching the sink argument.
    fn collect_taint_flows(&mut self) -> BTreeSet<TaintFlow> {
        let mut flows = BTreeSet::new();
        if !self.taint.is_enabled() {
            return flows;
        }
        let program = self.program;
        let edges = self.call_graph.edges().to_vec();
        for edge in edges {
            let (ctx, inv) = self.csm.cs_call_site(edge.call_site);
            let (_, callee) = self.csm.cs_method(edge.callee);
            let invoke = program.invoke(inv);
            for (i, &arg) in invoke.args.iter().enumerate() {
                if !self.taint.is_sink(callee, i as u32) {
                    continue;
                }
                let arg_ptr = self.csm.get_cs_var(ctx, arg);
                let Some(pt) = self.pts.get(arg_ptr.index()) else {
                    continue;
                };
                for cs_obj in pt.iter() {
                    let (_, obj) = self.csm.cs_obj(cs_obj);
                    if let Some(source_call) = self.heap.source_call(obj) {
                        flows.insert(TaintFlow::new(source_call, inv, i as u32));
                    }
                }
            }
        }
        flows
    }
}
