//! Programmatic construction of [`Program`] values.
//!
//! The builder is the crate's stand-in for a real IR front end: tests and
//! embedders declare methods, variables, and statements, link dispatch
//! entries, and call [`ProgramBuilder::finish`], which seals the program
//! and computes the per-variable relevance indexes the solver relies on.

use rustc_hash::FxHashMap;

use super::ir::{
    CallKind, Condition, FieldAccess, Invoke, Method, MethodIr, MethodRef, Program, Stmt, StmtKind,
    VarData,
};
use super::types::{FieldId, FieldTable, InvokeId, MethodId, StmtId, TypeId, TypeTable, VarId};

/// Builder for [`Program`]. See the module docs for the construction flow.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    types: TypeTable,
    fields: FieldTable,
    methods: Vec<Method>,
    method_index: FxHashMap<String, MethodId>,
    vars: Vec<VarData>,
    stmts: Vec<Stmt>,
    invokes: Vec<Invoke>,
    program: Program,
    entry: Option<MethodId>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ty(&mut self, name: &str) -> TypeId {
        self.types.intern(name)
    }

    pub fn field(&mut self, name: &str) -> FieldId {
        self.fields.intern(name)
    }

    /// Declare a method by its unique signature string.
    ///
    /// # Panics
    /// Panics if the signature was already declared.
    pub fn method(&mut self, signature: &str) -> MethodId {
        assert!(
            !self.method_index.contains_key(signature),
            "duplicate method signature: {signature}"
        );
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(Method {
            id,
            signature: signature.to_string(),
            ir: MethodIr::default(),
        });
        self.method_index.insert(signature.to_string(), id);
        id
    }

    /// Declare a fresh local variable in `method`.
    pub fn var(&mut self, method: MethodId, name: &str) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(VarData {
            name: name.to_string(),
            container: Some(method),
            ..VarData::default()
        });
        id
    }

    pub fn set_entry(&mut self, method: MethodId) {
        self.entry = Some(method);
    }

    pub fn set_this(&mut self, method: MethodId, var: VarId) {
        self.methods[method.index()].ir.this = Some(var);
    }

    pub fn add_param(&mut self, method: MethodId, var: VarId) {
        self.methods[method.index()].ir.params.push(var);
    }

    pub fn add_ret_var(&mut self, method: MethodId, var: VarId) {
        self.methods[method.index()].ir.ret_vars.push(var);
    }

    pub fn link_static(&mut self, signature: &str, method: MethodId) {
        self.program.dispatch.link_static(signature, method);
    }

    pub fn link_virtual(&mut self, recv_ty: TypeId, name: &str, method: MethodId) {
        self.program.dispatch.link_virtual(recv_ty, name, method);
    }

    fn push_stmt(&mut self, method: MethodId, kind: StmtKind) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        let index = self.methods[method.index()].ir.stmts.len();
        self.stmts.push(Stmt {
            id,
            container: method,
            index,
            kind,
        });
        self.methods[method.index()].ir.stmts.push(id);
        id
    }

    /// `lhs = new ty()`
    pub fn stmt_new(&mut self, method: MethodId, lhs: VarId, ty: TypeId) -> StmtId {
        self.push_stmt(method, StmtKind::New { lhs, ty })
    }

    /// `lhs = rhs`
    pub fn stmt_copy(&mut self, method: MethodId, lhs: VarId, rhs: VarId) -> StmtId {
        self.push_stmt(method, StmtKind::Copy { lhs, rhs })
    }

    /// `lhs = (ty) rhs`
    pub fn stmt_cast(&mut self, method: MethodId, lhs: VarId, rhs: VarId, ty: TypeId) -> StmtId {
        self.push_stmt(method, StmtKind::Cast { lhs, rhs, ty })
    }

    /// `lhs = value`
    pub fn stmt_literal(&mut self, method: MethodId, lhs: VarId, value: i64) -> StmtId {
        self.push_stmt(method, StmtKind::AssignLiteral { lhs, value })
    }

    /// `lhs = x op y`
    pub fn stmt_binary(
        &mut self,
        method: MethodId,
        lhs: VarId,
        op: super::ir::BinaryOp,
        x: super::ir::Operand,
        y: super::ir::Operand,
    ) -> StmtId {
        self.push_stmt(method, StmtKind::Binary { lhs, op, x, y })
    }

    /// `lhs = base.field` (instance) / `lhs = T.field` (static, `base` None)
    pub fn stmt_load_field(
        &mut self,
        method: MethodId,
        lhs: VarId,
        base: Option<VarId>,
        field: FieldId,
    ) -> StmtId {
        self.push_stmt(method, StmtKind::LoadField { lhs, base, field })
    }

    /// `base.field = rhs` / `T.field = rhs`
    pub fn stmt_store_field(
        &mut self,
        method: MethodId,
        base: Option<VarId>,
        field: FieldId,
        rhs: VarId,
    ) -> StmtId {
        self.push_stmt(method, StmtKind::StoreField { base, field, rhs })
    }

    /// `lhs = base[_]`
    pub fn stmt_load_array(&mut self, method: MethodId, lhs: VarId, base: VarId) -> StmtId {
        self.push_stmt(method, StmtKind::LoadArray { lhs, base })
    }

    /// `base[_] = rhs`
    pub fn stmt_store_array(&mut self, method: MethodId, base: VarId, rhs: VarId) -> StmtId {
        self.push_stmt(method, StmtKind::StoreArray { base, rhs })
    }

    /// `[result =] recv.callee(args)` / `[result =] T.callee(args)`
    ///
    /// # Panics
    /// Panics if a static-dispatch call carries a receiver or an instance
    /// call lacks one — that is malformed IR.
    #[allow(clippy::too_many_arguments)]
    pub fn stmt_invoke(
        &mut self,
        method: MethodId,
        kind: CallKind,
        callee: &str,
        recv: Option<VarId>,
        args: Vec<VarId>,
        result: Option<VarId>,
    ) -> (StmtId, InvokeId) {
        match kind {
            CallKind::Static => {
                assert!(recv.is_none(), "static call with a receiver: {callee}")
            }
            _ => assert!(recv.is_some(), "instance call without a receiver: {callee}"),
        }
        let invoke_id = InvokeId(self.invokes.len() as u32);
        self.invokes.push(Invoke {
            id: invoke_id,
            kind,
            callee: MethodRef {
                name: callee.to_string(),
            },
            recv,
            args,
            result,
            container: method,
        });
        let stmt = self.push_stmt(method, StmtKind::Invoke(invoke_id));
        (stmt, invoke_id)
    }

    /// `if (cond)`
    pub fn stmt_if(&mut self, method: MethodId, cond: Condition) -> StmtId {
        self.push_stmt(method, StmtKind::If { cond })
    }

    /// `switch (var)`
    pub fn stmt_switch(&mut self, method: MethodId, var: VarId) -> StmtId {
        self.push_stmt(method, StmtKind::Switch { var })
    }

    /// `return [value]`
    pub fn stmt_return(&mut self, method: MethodId, value: Option<VarId>) -> StmtId {
        self.push_stmt(method, StmtKind::Return { value })
    }

    pub fn stmt_nop(&mut self, method: MethodId) -> StmtId {
        self.push_stmt(method, StmtKind::Nop)
    }

    /// Seal the program: moves all tables in and computes the per-variable
    /// relevance indexes (instance field/array accesses, invocations).
    pub fn finish(mut self) -> Program {
        for stmt in &self.stmts {
            match stmt.kind {
                StmtKind::StoreField {
                    base: Some(base),
                    field,
                    rhs,
                } => {
                    self.vars[base.index()]
                        .store_fields
                        .push(FieldAccess { field, var: rhs });
                }
                StmtKind::LoadField {
                    lhs,
                    base: Some(base),
                    field,
                } => {
                    self.vars[base.index()]
                        .load_fields
                        .push(FieldAccess { field, var: lhs });
                }
                StmtKind::StoreArray { base, rhs } => {
                    self.vars[base.index()].store_arrays.push(rhs);
                }
                StmtKind::LoadArray { lhs, base } => {
                    self.vars[base.index()].load_arrays.push(lhs);
                }
                StmtKind::Invoke(invoke) => {
                    if let Some(recv) = self.invokes[invoke.index()].recv {
                        self.vars[recv.index()].invokes.push(invoke);
                    }
                }
                _ => {}
            }
        }
        let mut program = self.program;
        program.types = self.types;
        program.fields = self.fields;
        program.methods = self.methods;
        program.method_index = self.method_index;
        program.vars = self.vars;
        program.stmts = self.stmts;
        program.invokes = self.invokes;
        program.entry = self.entry;
        program
    }
}
