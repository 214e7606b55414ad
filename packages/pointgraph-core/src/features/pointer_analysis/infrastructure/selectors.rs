//! Shipped context selectors.
//!
//! The solver accepts any [`ContextSelector`]; these cover the common
//! strategies. `heap_k` bounds how much of the allocating method's context
//! an object's heap context keeps.

use crate::features::pointer_analysis::domain::{Context, ContextElem, ObjId};
use crate::features::pointer_analysis::ports::ContextSelector;
use crate::shared::models::{InvokeId, MethodId};

/// Every context is the empty context; reduces the analysis to a
/// context-insensitive one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextInsensitiveSelector;

impl ContextSelector for ContextInsensitiveSelector {
    fn select_static_context(&self, _: &Context, _: InvokeId, _: MethodId) -> Context {
        Context::empty()
    }

    fn select_instance_context(
        &self,
        _: &Context,
        _: InvokeId,
        _: &Context,
        _: ObjId,
        _: MethodId,
    ) -> Context {
        Context::empty()
    }

    fn select_heap_context(&self, _: &Context, _: ObjId) -> Context {
        Context::empty()
    }
}

/// k-limited call-site sensitivity (k-CFA).
#[derive(Debug, Clone, Copy)]
pub struct KCallSiteSelector {
    /// Call-string depth for method contexts.
    pub k: usize,
    /// Depth kept for heap contexts.
    pub heap_k: usize,
}

impl KCallSiteSelector {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap_k: k.saturating_sub(1),
        }
    }
}

impl ContextSelector for KCallSiteSelector {
    fn select_static_context(
        &self,
        caller_ctx: &Context,
        call_site: InvokeId,
        _: MethodId,
    ) -> Context {
        caller_ctx.push(ContextElem::CallSite(call_site), self.k)
    }

    fn select_instance_context(
        &self,
        caller_ctx: &Context,
        call_site: InvokeId,
        _: &Context,
        _: ObjId,
        _: MethodId,
    ) -> Context {
        caller_ctx.push(ContextElem::CallSite(call_site), self.k)
    }

    fn select_heap_context(&self, method_ctx: &Context, _: ObjId) -> Context {
        method_ctx.suffix(self.heap_k)
    }
}

/// k-limited object sensitivity: instance callees are analyzed under their
/// receiver object's identity; static callees inherit the caller context.
#[derive(Debug, Clone, Copy)]
pub struct KObjectSelector {
    pub k: usize,
    pub heap_k: usize,
}

impl KObjectSelector {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap_k: k.saturating_sub(1),
        }
    }
}

impl ContextSelector for KObjectSelector {
    fn select_static_context(
        &self,
        caller_ctx: &Context,
        _: InvokeId,
        _: MethodId,
    ) -> Context {
        caller_ctx.clone()
    }

    fn select_instance_context(
        &self,
        _: &Context,
        _: InvokeId,
        recv_ctx: &Context,
        recv_obj: ObjId,
        _: MethodId,
    ) -> Context {
        recv_ctx.push(ContextElem::HeapObj(recv_obj), self.k)
    }

    fn select_heap_context(&self, method_ctx: &Context, _: ObjId) -> Context {
        method_ctx.suffix(self.heap_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_insensitive_selector_returns_empty() {
        let s = ContextInsensitiveSelector;
        let caller = Context::empty().push(ContextElem::CallSite(InvokeId(1)), 4);
        assert!(s
            .select_static_context(&caller, InvokeId(2), MethodId(0))
            .is_empty());
        assert!(s.select_heap_context(&caller, ObjId(0)).is_empty());
    }

    #[test]
    fn test_one_call_site_selector_keeps_last_site() {
        let s = KCallSiteSelector::new(1);
        let caller = Context::empty().push(ContextElem::CallSite(InvokeId(1)), 1);
        let ctx = s.select_static_context(&caller, InvokeId(2), MethodId(0));
        assert_eq!(ctx.elems(), &[ContextElem::CallSite(InvokeId(2))]);
        // 1-call-site keeps no heap context
        assert!(s.select_heap_context(&ctx, ObjId(0)).is_empty());
    }

    #[test]
    fn test_two_call_site_selector_builds_strings() {
        let s = KCallSiteSelector::new(2);
        let c1 = s.select_static_context(&Context::empty(), InvokeId(1), MethodId(0));
        let c2 = s.select_static_context(&c1, InvokeId(2), MethodId(1));
        assert_eq!(
            c2.elems(),
            &[
                ContextElem::CallSite(InvokeId(1)),
                ContextElem::CallSite(InvokeId(2)),
            ]
        );
        assert_eq!(s.select_heap_context(&c2, ObjId(0)).depth(), 1);
    }

    #[test]
    fn test_object_selector_uses_receiver() {
        let s = KObjectSelector::new(1);
        let ctx = s.select_instance_context(
            &Context::empty(),
            InvokeId(0),
            &Context::empty(),
            ObjId(7),
            MethodId(0),
        );
        assert_eq!(ctx.elems(), &[ContextElem::HeapObj(ObjId(7))]);
    }
}
