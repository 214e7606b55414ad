//! Context-sensitive elements and their interner.
//!
//! The [`CSManager`] canonicalizes every (context, syntactic element) pair
//! into a dense id through two-level hash maps, as required for
//! vector-backed points-to sets and adjacency lists. All operations are
//! total: they create the canonical node on first demand and never fail.

use rustc_hash::FxHashMap;

use crate::shared::models::types::define_id;
use crate::shared::models::{FieldId, InvokeId, MethodId, VarId};

use super::context::Context;

define_id!(
    /// A heap abstraction (allocation site or taint object).
    ObjId
);
define_id!(
    /// An interned context.
    CtxId
);
define_id!(
    /// A context-sensitive heap object: (context, object).
    CSObjId
);
define_id!(
    /// A pointer node of the pointer flow graph.
    PointerId
);
define_id!(
    /// A context-sensitive method: (context, method).
    CSMethodId
);
define_id!(
    /// A context-sensitive call site: (context, invocation).
    CSCallSiteId
);

/// The shape of a pointer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// Local variable in a method context.
    CsVar { ctx: CtxId, var: VarId },
    /// Static field, context-free.
    StaticField { field: FieldId },
    /// Instance field of a context-sensitive object.
    InstanceField { base: CSObjId, field: FieldId },
    /// All indices of an array abstraction, collapsed.
    ArrayIndex { base: CSObjId },
}

/// Interner for contexts, context-sensitive objects, pointer nodes,
/// methods, and call sites. One instance per solve; entities live for the
/// whole solve and are never deleted.
#[derive(Debug, Default)]
pub struct CSManager {
    contexts: Vec<Context>,
    ctx_index: FxHashMap<Context, CtxId>,

    cs_objs: Vec<(CtxId, ObjId)>,
    cs_obj_index: FxHashMap<(CtxId, ObjId), CSObjId>,

    pointers: Vec<PointerKind>,
    cs_var_index: FxHashMap<(CtxId, VarId), PointerId>,
    static_field_index: FxHashMap<FieldId, PointerId>,
    instance_field_index: FxHashMap<(CSObjId, FieldId), PointerId>,
    array_index_index: FxHashMap<CSObjId, PointerId>,

    cs_methods: Vec<(CtxId, MethodId)>,
    cs_method_index: FxHashMap<(CtxId, MethodId), CSMethodId>,

    cs_call_sites: Vec<(CtxId, InvokeId)>,
    cs_call_site_index: FxHashMap<(CtxId, InvokeId), CSCallSiteId>,
}

impl CSManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a context value.
    pub fn get_ctx(&mut self, ctx: &Context) -> CtxId {
        if let Some(&id) = self.ctx_index.get(ctx) {
            return id;
        }
        let id = CtxId(self.contexts.len() as u32);
        self.contexts.push(ctx.clone());
        self.ctx_index.insert(ctx.clone(), id);
        id
    }

    pub fn find_ctx(&self, ctx: &Context) -> Option<CtxId> {
        self.ctx_index.get(ctx).copied()
    }

    pub fn context(&self, id: CtxId) -> &Context {
        &self.contexts[id.index()]
    }

    pub fn get_cs_obj(&mut self, ctx: CtxId, obj: ObjId) -> CSObjId {
        if let Some(&id) = self.cs_obj_index.get(&(ctx, obj)) {
            return id;
        }
        let id = CSObjId(self.cs_objs.len() as u32);
        self.cs_objs.push((ctx, obj));
        self.cs_obj_index.insert((ctx, obj), id);
        id
    }

    /// The (context, object) pair behind a context-sensitive object.
    pub fn cs_obj(&self, id: CSObjId) -> (CtxId, ObjId) {
        self.cs_objs[id.index()]
    }

    fn intern_pointer(&mut self, kind: PointerKind) -> PointerId {
        let id = PointerId(self.pointers.len() as u32);
        self.pointers.push(kind);
        id
    }

    pub fn get_cs_var(&mut self, ctx: CtxId, var: VarId) -> PointerId {
        if let Some(&id) = self.cs_var_index.get(&(ctx, var)) {
            return id;
        }
        let id = self.intern_pointer(PointerKind::CsVar { ctx, var });
        self.cs_var_index.insert((ctx, var), id);
        id
    }

    pub fn find_cs_var(&self, ctx: CtxId, var: VarId) -> Option<PointerId> {
        self.cs_var_index.get(&(ctx, var)).copied()
    }

    pub fn get_static_field(&mut self, field: FieldId) -> PointerId {
        if let Some(&id) = self.static_field_index.get(&field) {
            return id;
        }
        let id = self.intern_pointer(PointerKind::StaticField { field });
        self.static_field_index.insert(field, id);
        id
    }

    pub fn get_instance_field(&mut self, base: CSObjId, field: FieldId) -> PointerId {
        if let Some(&id) = self.instance_field_index.get(&(base, field)) {
            return id;
        }
        let id = self.intern_pointer(PointerKind::InstanceField { base, field });
        self.instance_field_index.insert((base, field), id);
        id
    }

    pub fn get_array_index(&mut self, base: CSObjId) -> PointerId {
        if let Some(&id) = self.array_index_index.get(&base) {
            return id;
        }
        let id = self.intern_pointer(PointerKind::ArrayIndex { base });
        self.array_index_index.insert(base, id);
        id
    }

    pub fn pointer(&self, id: PointerId) -> PointerKind {
        self.pointers[id.index()]
    }

    pub fn num_pointers(&self) -> usize {
        self.pointers.len()
    }

    /// All interned pointer nodes with their ids, in creation order.
    pub fn pointers(&self) -> impl Iterator<Item = (PointerId, PointerKind)> + '_ {
        self.pointers
            .iter()
            .enumerate()
            .map(|(i, &kind)| (PointerId(i as u32), kind))
    }

    pub fn get_cs_method(&mut self, ctx: CtxId, method: MethodId) -> CSMethodId {
        if let Some(&id) = self.cs_method_index.get(&(ctx, method)) {
            return id;
        }
        let id = CSMethodId(self.cs_methods.len() as u32);
        self.cs_methods.push((ctx, method));
        self.cs_method_index.insert((ctx, method), id);
        id
    }

    pub fn cs_method(&self, id: CSMethodId) -> (CtxId, MethodId) {
        self.cs_methods[id.index()]
    }

    pub fn get_cs_call_site(&mut self, ctx: CtxId, invoke: InvokeId) -> CSCallSiteId {
        if let Some(&id) = self.cs_call_site_index.get(&(ctx, invoke)) {
            return id;
        }
        let id = CSCallSiteId(self.cs_call_sites.len() as u32);
        self.cs_call_sites.push((ctx, invoke));
        self.cs_call_site_index.insert((ctx, invoke), id);
        id
    }

    pub fn cs_call_site(&self, id: CSCallSiteId) -> (CtxId, InvokeId) {
        self.cs_call_sites[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_interning_is_canonical() {
        let mut csm = CSManager::new();
        let empty = csm.get_ctx(&Context::empty());
        assert_eq!(csm.get_ctx(&Context::empty()), empty);
        assert!(csm.context(empty).is_empty());
    }

    #[test]
    fn test_cs_var_interning_is_canonical() {
        let mut csm = CSManager::new();
        let c = csm.get_ctx(&Context::empty());
        let p1 = csm.get_cs_var(c, VarId(0));
        let p2 = csm.get_cs_var(c, VarId(0));
        let p3 = csm.get_cs_var(c, VarId(1));
        assert_eq!(p1, p2);
        assert_ne!(p1, p3);
        assert_eq!(csm.pointer(p1), PointerKind::CsVar { ctx: c, var: VarId(0) });
    }

    #[test]
    fn test_pointer_variants_do_not_collide() {
        let mut csm = CSManager::new();
        let c = csm.get_ctx(&Context::empty());
        let obj = csm.get_cs_obj(c, ObjId(0));
        let f = FieldId(0);
        let a = csm.get_static_field(f);
        let b = csm.get_instance_field(obj, f);
        let d = csm.get_array_index(obj);
        assert_ne!(a, b);
        assert_ne!(b, d);
        assert_eq!(csm.num_pointers(), 3);
    }

    #[test]
    fn test_cs_obj_round_trip() {
        let mut csm = CSManager::new();
        let c = csm.get_ctx(&Context::empty());
        let id = csm.get_cs_obj(c, ObjId(7));
        assert_eq!(csm.cs_obj(id), (c, ObjId(7)));
        assert_eq!(csm.get_cs_obj(c, ObjId(7)), id);
    }

    #[test]
    fn test_cs_method_and_call_site_interning() {
        let mut csm = CSManager::new();
        let c = csm.get_ctx(&Context::empty());
        let m = csm.get_cs_method(c, MethodId(3));
        assert_eq!(csm.get_cs_method(c, MethodId(3)), m);
        assert_eq!(csm.cs_method(m), (c, MethodId(3)));

        let s = csm.get_cs_call_site(c, InvokeId(5));
        assert_eq!(csm.get_cs_call_site(c, InvokeId(5)), s);
        assert_eq!(csm.cs_call_site(s), (c, InvokeId(5)));
    }
}
