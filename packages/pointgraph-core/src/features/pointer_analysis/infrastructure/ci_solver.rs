//! Context-insensitive pointer analysis.
//!
//! The simpler variant subsumed by the context-sensitive solver: pointer
//! nodes carry no context, heap objects are plain allocation sites, and
//! there is no taint overlay. Kept as an independent implementation so
//! the two solvers can be checked against each other.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use crate::errors::{PointgraphError, Result};
use crate::features::pointer_analysis::domain::{ObjId, PointsToSet};
use crate::features::pointer_analysis::ports::{CalleeResolver, HeapModel};
use crate::shared::models::types::define_id;
use crate::shared::models::{
    CallKind, FieldAccess, FieldId, InvokeId, MethodId, Program, StmtKind, VarId,
};

use super::heap::AllocSiteHeapModel;

define_id!(
    /// A context-free pointer node.
    CiPointerId
);

/// Context-free pointer node shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CiPointerKind {
    Var(VarId),
    StaticField(FieldId),
    InstanceField(ObjId, FieldId),
    ArrayIndex(ObjId),
}

#[derive(Debug, Default)]
struct CiInterner {
    pointers: Vec<CiPointerKind>,
    index: FxHashMap<CiPointerKind, CiPointerId>,
}

impl CiInterner {
    fn get(&mut self, kind: CiPointerKind) -> CiPointerId {
        if let Some(&id) = self.index.get(&kind) {
            return id;
        }
        let id = CiPointerId(self.pointers.len() as u32);
        self.pointers.push(kind);
        self.index.insert(kind, id);
        id
    }

    fn find(&self, kind: CiPointerKind) -> Option<CiPointerId> {
        self.index.get(&kind).copied()
    }

    fn kind(&self, id: CiPointerId) -> CiPointerKind {
        self.pointers[id.index()]
    }
}

/// Context-free call graph.
#[derive(Debug, Default)]
pub struct CiCallGraph {
    reachable: Vec<MethodId>,
    reachable_set: FxHashSet<MethodId>,
    edges: Vec<(CallKind, InvokeId, MethodId)>,
    edge_set: FxHashSet<(InvokeId, MethodId)>,
}

impl CiCallGraph {
    pub fn add_reachable_method(&mut self, method: MethodId) -> bool {
        if !self.reachable_set.insert(method) {
            return false;
        }
        self.reachable.push(method);
        true
    }

    pub fn add_edge(&mut self, kind: CallKind, call_site: InvokeId, callee: MethodId) -> bool {
        if !self.edge_set.insert((call_site, callee)) {
            return false;
        }
        self.edges.push((kind, call_site, callee));
        true
    }

    pub fn reachable_methods(&self) -> &[MethodId] {
        &self.reachable
    }

    pub fn edges(&self) -> &[(CallKind, InvokeId, MethodId)] {
        &self.edges
    }

    pub fn has_edge(&self, call_site: InvokeId, callee: MethodId) -> bool {
        self.edge_set.contains(&(call_site, callee))
    }
}

/// Outcome of a context-insensitive solve.
pub struct CiPointerAnalysisResult {
    interner: CiInterner,
    heap: AllocSiteHeapModel,
    call_graph: CiCallGraph,
    pts: Vec<PointsToSet<ObjId>>,
    empty: PointsToSet<ObjId>,
}

impl CiPointerAnalysisResult {
    pub fn call_graph(&self) -> &CiCallGraph {
        &self.call_graph
    }

    pub fn heap(&self) -> &AllocSiteHeapModel {
        &self.heap
    }

    /// Points-to set of a variable; unknown variables answer empty.
    pub fn pt_of_var(&self, var: VarId) -> &PointsToSet<ObjId> {
        self.interner
            .find(CiPointerKind::Var(var))
            .and_then(|p| self.pts.get(p.index()))
            .unwrap_or(&self.empty)
    }
}

/// Context-insensitive inclusion-based solver.
pub struct CiSolver<'a> {
    program: &'a Program,
    resolver: &'a dyn CalleeResolver,
    heap: AllocSiteHeapModel,
    interner: CiInterner,
    succs: Vec<Vec<CiPointerId>>,
    edge_set: FxHashSet<(CiPointerId, CiPointerId)>,
    work_list: VecDeque<(CiPointerId, PointsToSet<ObjId>)>,
    call_graph: CiCallGraph,
    pts: Vec<PointsToSet<ObjId>>,
}

impl<'a> CiSolver<'a> {
    pub fn new(program: &'a Program, resolver: &'a dyn CalleeResolver) -> Self {
        Self {
            program,
            resolver,
            heap: AllocSiteHeapModel::new(),
            interner: CiInterner::default(),
            succs: Vec::new(),
            edge_set: FxHashSet::default(),
            work_list: VecDeque::new(),
            call_graph: CiCallGraph::default(),
            pts: Vec::new(),
        }
    }

    pub fn solve(mut self) -> Result<CiPointerAnalysisResult> {
        let entry = self
            .program
            .entry()
            .ok_or_else(|| PointgraphError::analysis("program has no entry method"))?;
        info!(
            entry = %self.program.method(entry).signature,
            "starting context-insensitive pointer analysis"
        );
        self.add_reachable(entry);
        self.analyze();
        Ok(CiPointerAnalysisResult {
            interner: self.interner,
            heap: self.heap,
            call_graph: self.call_graph,
            pts: self.pts,
            empty: PointsToSet::new(),
        })
    }

    fn add_reachable(&mut self, method: MethodId) {
        if !self.call_graph.add_reachable_method(method) {
            return;
        }
        let program = self.program;
        for &sid in &program.method(method).ir.stmts {
            match program.stmt(sid).kind {
                StmtKind::New { lhs, ty } => {
                    let obj = self.heap.obj_of_alloc(sid, ty);
                    let target = self.interner.get(CiPointerKind::Var(lhs));
                    self.work_list.push_back((target, PointsToSet::singleton(obj)));
                }
                StmtKind::Copy { lhs, rhs } => {
                    let source = self.interner.get(CiPointerKind::Var(rhs));
                    let target = self.interner.get(CiPointerKind::Var(lhs));
                    self.add_pfg_edge(source, target);
                }
                StmtKind::StoreField {
                    base: None,
                    field,
                    rhs,
                } => {
                    let source = self.interner.get(CiPointerKind::Var(rhs));
                    let target = self.interner.get(CiPointerKind::StaticField(field));
                    self.add_pfg_edge(source, target);
                }
                StmtKind::LoadField {
                    lhs,
                    base: None,
                    field,
                } => {
                    let source = self.interner.get(CiPointerKind::StaticField(field));
                    let target = self.interner.get(CiPointerKind::Var(lhs));
                    self.add_pfg_edge(source, target);
                }
                StmtKind::Invoke(invoke) if program.invoke(invoke).kind == CallKind::Static => {
                    self.process_static_call(invoke);
                }
                _ => {}
            }
        }
    }

    fn process_static_call(&mut self, inv: InvokeId) {
        let invoke = self.program.invoke(inv);
        let Some(callee) = self.resolver.resolve(None, invoke) else {
            debug!(callee = %invoke.callee.name, "unresolvable static call");
            return;
        };
        if self.call_graph.add_edge(CallKind::Static, inv, callee) {
            self.add_reachable(callee);
            self.install_call_edges(inv, callee);
        }
    }

    fn install_call_edges(&mut self, inv: InvokeId, callee: MethodId) {
        let program = self.program;
        let invoke = program.invoke(inv);
        let ir = &program.method(callee).ir;
        assert_eq!(
            invoke.args.len(),
            ir.params.len(),
            "arity mismatch calling {}",
            program.method(callee).signature
        );
        for (&arg, &param) in invoke.args.iter().zip(ir.params.iter()) {
            let source = self.interner.get(CiPointerKind::Var(arg));
            let target = self.interner.get(CiPointerKind::Var(param));
            self.add_pfg_edge(source, target);
        }
        if let Some(result) = invoke.result {
            let result_ptr = self.interner.get(CiPointerKind::Var(result));
            for &ret in &ir.ret_vars {
                let source = self.interner.get(CiPointerKind::Var(ret));
                self.add_pfg_edge(source, result_ptr);
            }
        }
    }

    fn add_pfg_edge(&mut self, source: CiPointerId, target: CiPointerId) {
        if !self.edge_set.insert((source, target)) {
            return;
        }
        if self.succs.len() <= source.index() {
            self.succs.resize_with(source.index() + 1, Vec::new);
        }
        self.succs[source.index()].push(target);
        if let Some(pt_source) = self.pts.get(source.index()) {
            if !pt_source.is_empty() {
                let pt_source = pt_source.clone();
                self.work_list.push_back((target, pt_source));
            }
        }
    }

    fn analyze(&mut self) {
        let program = self.program;
        while let Some((pointer, pts)) = self.work_list.pop_front() {
            let delta = self.propagate(pointer, &pts);
            if delta.is_empty() {
                continue;
            }
            let CiPointerKind::Var(var) = self.interner.kind(pointer) else {
                continue;
            };
            let var_data = program.var(var);
            for obj in delta.iter() {
                for &FieldAccess { field, var: rhs } in &var_data.store_fields {
                    let source = self.interner.get(CiPointerKind::Var(rhs));
                    let target = self.interner.get(CiPointerKind::InstanceField(obj, field));
                    self.add_pfg_edge(source, target);
                }
                for &FieldAccess { field, var: lhs } in &var_data.load_fields {
                    let source = self.interner.get(CiPointerKind::InstanceField(obj, field));
                    let target = self.interner.get(CiPointerKind::Var(lhs));
                    self.add_pfg_edge(source, target);
                }
                for &rhs in &var_data.store_arrays {
                    let source = self.interner.get(CiPointerKind::Var(rhs));
                    let target = self.interner.get(CiPointerKind::ArrayIndex(obj));
                    self.add_pfg_edge(source, target);
                }
                for &lhs in &var_data.load_arrays {
                    let source = self.interner.get(CiPointerKind::ArrayIndex(obj));
                    let target = self.interner.get(CiPointerKind::Var(lhs));
                    self.add_pfg_edge(source, target);
                }
                self.process_call(var, obj);
            }
        }
    }

    fn propagate(&mut self, pointer: CiPointerId, pts: &PointsToSet<ObjId>) -> PointsToSet<ObjId> {
        let mut delta = PointsToSet::new();
        if pts.is_empty() {
            return delta;
        }
        for obj in pts.iter() {
            if self.pts.len() <= pointer.index() {
                self.pts.resize_with(pointer.index() + 1, PointsToSet::new);
            }
            if self.pts[pointer.index()].add(obj) {
                delta.add(obj);
            }
        }
        if !delta.is_empty() {
            let succs = self
                .succs
                .get(pointer.index())
                .cloned()
                .unwrap_or_default();
            for succ in succs {
                self.work_list.push_back((succ, delta.clone()));
            }
        }
        delta
    }

    fn process_call(&mut self, recv_var: VarId, recv_obj: ObjId) {
        let program = self.program;
        for &inv in &program.var(recv_var).invokes {
            let invoke = program.invoke(inv);
            let recv_ty = self.heap.obj(recv_obj).ty;
            let Some(callee) = self.resolver.resolve(Some(recv_ty), invoke) else {
                debug!(callee = %invoke.callee.name, "unresolvable instance call");
                continue;
            };
            let this = program.method(callee).ir.this.unwrap_or_else(|| {
                panic!(
                    "instance callee {} has no `this` variable",
                    program.method(callee).signature
                )
            });
            let this_ptr = self.interner.get(CiPointerKind::Var(this));
            self.work_list
                .push_back((this_ptr, PointsToSet::singleton(recv_obj)));
            if self.call_graph.add_edge(invoke.kind, inv, callee) {
                self.add_reachable(callee);
                self.install_call_edges(inv, callee);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::ProgramBuilder;

    #[test]
    fn test_copy_chain_merges_points_to() {
        let mut b = ProgramBuilder::new();
        let main = b.method("<Main: void main()>");
        let ty_a = b.ty("A");
        let x = b.var(main, "x");
        let y = b.var(main, "y");
        b.stmt_new(main, x, ty_a);
        b.stmt_copy(main, y, x);
        b.set_entry(main);
        let program = b.finish();

        let result = CiSolver::new(&program, &program.dispatch).solve().unwrap();
        assert_eq!(result.pt_of_var(x).len(), 1);
        assert_eq!(
            result.pt_of_var(x).iter().collect::<Vec<_>>(),
            result.pt_of_var(y).iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_unknown_var_answers_empty() {
        let mut b = ProgramBuilder::new();
        let main = b.method("<Main: void main()>");
        let unused = b.var(main, "unused");
        b.set_entry(main);
        let program = b.finish();

        let result = CiSolver::new(&program, &program.dispatch).solve().unwrap();
        assert!(result.pt_of_var(unused).is_empty());
    }

    #[test]
    fn test_missing_entry_is_an_error() {
        let program = ProgramBuilder::new().finish();
        assert!(CiSolver::new(&program, &program.dispatch).solve().is_err());
    }
}
