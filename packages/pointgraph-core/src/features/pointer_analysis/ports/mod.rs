//! Ports: the narrow interfaces through which the solver consumes its
//! external collaborators (context selection, heap abstraction, and
//! callee resolution).

use crate::shared::models::{DispatchTable, Invoke, InvokeId, MethodId, StmtId, TypeId};

use super::domain::{Context, ObjId};

/// Chooses analysis contexts for callees and heap objects.
///
/// Any deterministic selector is allowed; the solver treats the returned
/// contexts as opaque values and interns them.
pub trait ContextSelector {
    /// The distinguished initial context.
    fn empty_context(&self) -> Context {
        Context::empty()
    }

    /// Context for the callee of a static call.
    fn select_static_context(
        &self,
        caller_ctx: &Context,
        call_site: InvokeId,
        callee: MethodId,
    ) -> Context;

    /// Context for the callee of an instance call, given the receiver
    /// object and its heap context.
    fn select_instance_context(
        &self,
        caller_ctx: &Context,
        call_site: InvokeId,
        recv_ctx: &Context,
        recv_obj: ObjId,
        callee: MethodId,
    ) -> Context;

    /// Heap context for an object allocated in a method analyzed under
    /// `method_ctx`.
    fn select_heap_context(&self, method_ctx: &Context, obj: ObjId) -> Context;
}

/// Kinds of heap abstractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjKind {
    /// Ordinary object, one per allocation site.
    Alloc { site: StmtId },
    /// Synthetic taint object, identified by the source call that produced
    /// it and its (possibly rewritten) type.
    Taint { source: InvokeId },
}

/// A heap abstraction with its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjData {
    pub kind: ObjKind,
    pub ty: TypeId,
}

/// Synthesizes and resolves heap abstractions.
pub trait HeapModel {
    /// Canonical object for an allocation statement.
    fn obj_of_alloc(&mut self, site: StmtId, ty: TypeId) -> ObjId;

    /// Canonical taint object for a source call and a type. Repeated calls
    /// with equal inputs return the same object.
    fn make_taint(&mut self, source: InvokeId, ty: TypeId) -> ObjId;

    fn obj(&self, id: ObjId) -> &ObjData;

    fn is_taint(&self, id: ObjId) -> bool {
        matches!(self.obj(id).kind, ObjKind::Taint { .. })
    }

    /// Source call of a taint object; `None` for ordinary objects.
    fn source_call(&self, id: ObjId) -> Option<InvokeId> {
        match self.obj(id).kind {
            ObjKind::Taint { source } => Some(source),
            ObjKind::Alloc { .. } => None,
        }
    }
}

/// Resolves call sites to concrete callees.
///
/// Returning `None` means "no method": the solver installs no edge and
/// does not fail.
pub trait CalleeResolver {
    fn resolve(&self, recv_ty: Option<TypeId>, invoke: &Invoke) -> Option<MethodId>;
}

impl CalleeResolver for DispatchTable {
    fn resolve(&self, recv_ty: Option<TypeId>, invoke: &Invoke) -> Option<MethodId> {
        DispatchTable::resolve(self, recv_ty, invoke)
    }
}
