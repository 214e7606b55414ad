//! The taint manager.
//!
//! Owns the resolved configuration and synthesizes taint objects on
//! demand. The solver calls into it at its hook points and passes the
//! collaborators (heap model, interner) as parameters, so the manager
//! keeps no reference back into the solver.

use crate::features::pointer_analysis::domain::{CSManager, CSObjId, CtxId, ObjId};
use crate::features::pointer_analysis::ports::HeapModel;
use crate::shared::models::{InvokeId, MethodId, TypeId};

use super::super::domain::config::{ResolvedTaintConfig, BASE, RESULT};

/// Identifier under which collected taint flows are stored on the
/// analysis result.
pub const TAINT_FLOWS_ID: &str = "taint-analysis";

#[derive(Debug, Default)]
pub struct TaintManager {
    config: ResolvedTaintConfig,
}

impl TaintManager {
    pub fn new(config: ResolvedTaintConfig) -> Self {
        Self { config }
    }

    /// A manager with no sources, sinks, or transfers: every hook becomes
    /// a no-op.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.is_empty()
    }

    /// Canonical context-sensitive taint object for a source call and a
    /// type. Taint objects always pair with the empty context.
    pub fn taint_obj(
        &self,
        heap: &mut dyn HeapModel,
        csm: &mut CSManager,
        empty_ctx: CtxId,
        source_call: InvokeId,
        ty: TypeId,
    ) -> CSObjId {
        let obj = heap.make_taint(source_call, ty);
        csm.get_cs_obj(empty_ctx, obj)
    }

    pub fn is_taint(&self, heap: &dyn HeapModel, obj: ObjId) -> bool {
        heap.is_taint(obj)
    }

    /// Source call of a taint object.
    ///
    /// # Panics
    /// Panics if `obj` is not a taint object; callers filter first.
    pub fn source_call(&self, heap: &dyn HeapModel, obj: ObjId) -> InvokeId {
        heap.source_call(obj)
            .expect("source_call queried on a non-taint object")
    }

    /// Taint types produced by calls to `method`.
    pub fn sources_of(&self, method: MethodId) -> &[TypeId] {
        self.config.sources_of(method)
    }

    /// Rewrite types for argument `index` flowing to the call result.
    pub fn arg_to_result(&self, method: MethodId, index: u32) -> &[TypeId] {
        self.config.transfers_of(method, index as i32, RESULT)
    }

    /// Rewrite types for argument `index` flowing back to the receiver.
    pub fn arg_to_base(&self, method: MethodId, index: u32) -> &[TypeId] {
        self.config.transfers_of(method, index as i32, BASE)
    }

    /// Rewrite types for the receiver flowing to the call result.
    pub fn base_to_result(&self, method: MethodId) -> &[TypeId] {
        self.config.transfers_of(method, BASE, RESULT)
    }

    pub fn is_sink(&self, method: MethodId, index: u32) -> bool {
        self.config.is_sink(method, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pointer_analysis::domain::Context;
    use crate::features::pointer_analysis::infrastructure::heap::AllocSiteHeapModel;
    use crate::features::taint_analysis::domain::config::TaintConfig;
    use crate::shared::models::ProgramBuilder;

    fn manager_for(yaml: &str) -> (TaintManager, crate::shared::models::Program) {
        let mut b = ProgramBuilder::new();
        b.method("<Src: T get()>");
        b.method("<Wrap: T of(T)>");
        b.method("<Snk: void use(T)>");
        let mut program = b.finish();
        let config = TaintConfig::from_yaml(yaml).unwrap().resolve(&mut program);
        (TaintManager::new(config), program)
    }

    #[test]
    fn test_disabled_manager_is_a_no_op() {
        let manager = TaintManager::disabled();
        assert!(!manager.is_enabled());
        assert!(manager.sources_of(MethodId(0)).is_empty());
        assert!(!manager.is_sink(MethodId(0), 0));
    }

    #[test]
    fn test_config_queries() {
        let (manager, program) = manager_for(
            r#"
sources:
  - { method: "<Src: T get()>", type: "T" }
sinks:
  - { method: "<Snk: void use(T)>", index: 0 }
transfers:
  - { method: "<Wrap: T of(T)>", from: 0, to: result, type: "T" }
"#,
        );
        let src = program.method_by_signature("<Src: T get()>").unwrap();
        let wrap = program.method_by_signature("<Wrap: T of(T)>").unwrap();
        let snk = program.method_by_signature("<Snk: void use(T)>").unwrap();
        let t = program.types.get("T").unwrap();

        assert!(manager.is_enabled());
        assert_eq!(manager.sources_of(src), &[t]);
        assert_eq!(manager.arg_to_result(wrap, 0), &[t]);
        assert!(manager.arg_to_result(wrap, 1).is_empty());
        assert!(manager.arg_to_base(wrap, 0).is_empty());
        assert!(manager.base_to_result(wrap).is_empty());
        assert!(manager.is_sink(snk, 0));
        assert!(!manager.is_sink(snk, 1));
    }

    #[test]
    fn test_taint_objects_carry_the_empty_context() {
        let (manager, _) = manager_for("{}");
        let mut heap = AllocSiteHeapModel::new();
        let mut csm = CSManager::new();
        let empty = csm.get_ctx(&Context::empty());

        let t1 = manager.taint_obj(&mut heap, &mut csm, empty, InvokeId(0), TypeId(0));
        let t2 = manager.taint_obj(&mut heap, &mut csm, empty, InvokeId(0), TypeId(0));
        assert_eq!(t1, t2);

        let (ctx, obj) = csm.cs_obj(t1);
        assert_eq!(ctx, empty);
        assert!(manager.is_taint(&heap, obj));
        assert_eq!(manager.source_call(&heap, obj), InvokeId(0));
    }
}
