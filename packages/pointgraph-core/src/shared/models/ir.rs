//! Object-oriented intermediate representation consumed by the analyses.
//!
//! The IR is deliberately flat: statements, variables, and invocation sites
//! live in program-wide tables and refer to each other through dense ids.
//! Methods keep ordered lists of their statement ids, and every variable
//! carries precomputed relevance indexes (instance field/array accesses and
//! invocations on it) so the pointer-analysis delta loop never scans a
//! method body.

use rustc_hash::FxHashMap;

use super::types::{FieldId, InvokeId, MethodId, StmtId, TypeId, VarId};

/// How a call site dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Static,
    Virtual,
    Interface,
    Special,
}

impl CallKind {
    /// Static and special calls resolve without consulting the receiver's
    /// runtime type.
    pub fn is_static_dispatch(self) -> bool {
        matches!(self, CallKind::Static | CallKind::Special)
    }
}

/// Unresolved callee reference carried by an invocation site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// Signature key for static dispatch, method name for virtual dispatch.
    pub name: String,
}

/// An invocation site.
#[derive(Debug, Clone)]
pub struct Invoke {
    pub id: InvokeId,
    pub kind: CallKind,
    pub callee: MethodRef,
    /// Receiver variable; `None` for static calls.
    pub recv: Option<VarId>,
    pub args: Vec<VarId>,
    /// Left-hand side receiving the call result, if any.
    pub result: Option<VarId>,
    /// Enclosing method.
    pub container: MethodId,
}

/// Integer comparison operators usable in `if` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Arithmetic operators for binary assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Division and remainder may fault on a zero divisor.
    pub fn may_fault(self) -> bool {
        matches!(self, BinaryOp::Div | BinaryOp::Rem)
    }
}

/// A variable reference or integer literal operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Var(VarId),
    Const(i64),
}

/// Branch condition of an `if` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub op: CmpOp,
    pub x: Operand,
    pub y: Operand,
}

/// Statement shapes, dispatched by a single `match` in each analysis.
#[derive(Debug, Clone, Copy)]
pub enum StmtKind {
    /// `x = new T()`
    New { lhs: VarId, ty: TypeId },
    /// `x = y`
    Copy { lhs: VarId, rhs: VarId },
    /// `x = (T) y` — irrelevant to the pointer flow graph, side-effecting
    /// for dead-code purposes.
    Cast { lhs: VarId, rhs: VarId, ty: TypeId },
    /// `x = 42`
    AssignLiteral { lhs: VarId, value: i64 },
    /// `x = a op b`
    Binary {
        lhs: VarId,
        op: BinaryOp,
        x: Operand,
        y: Operand,
    },
    /// `x = base.f` (instance) or `x = T.f` (static, `base` is `None`)
    LoadField {
        lhs: VarId,
        base: Option<VarId>,
        field: FieldId,
    },
    /// `base.f = y` or `T.f = y`
    StoreField {
        base: Option<VarId>,
        field: FieldId,
        rhs: VarId,
    },
    /// `x = base[i]` — all indices collapse to one abstraction
    LoadArray { lhs: VarId, base: VarId },
    /// `base[i] = y`
    StoreArray { base: VarId, rhs: VarId },
    /// `[r =] recv.m(args)` or `[r =] T.m(args)`
    Invoke(InvokeId),
    /// `if (cond)` — successors are typed CFG edges
    If { cond: Condition },
    /// `switch (v)` — case targets are typed CFG edges
    Switch { var: VarId },
    /// `return [v]`
    Return { value: Option<VarId> },
    /// No-op; also used as CFG entry/exit marker
    Nop,
}

impl StmtKind {
    /// Variable defined by this statement, if it is an assignment.
    pub fn def_var(&self) -> Option<VarId> {
        match *self {
            StmtKind::New { lhs, .. }
            | StmtKind::Copy { lhs, .. }
            | StmtKind::Cast { lhs, .. }
            | StmtKind::AssignLiteral { lhs, .. }
            | StmtKind::Binary { lhs, .. }
            | StmtKind::LoadField { lhs, .. }
            | StmtKind::LoadArray { lhs, .. } => Some(lhs),
            _ => None,
        }
    }
}

/// A statement with its program-wide id and per-method index.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: StmtId,
    pub container: MethodId,
    /// Position within the containing method's statement list.
    pub index: usize,
    pub kind: StmtKind,
}

/// Instance field access recorded on the base variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAccess {
    pub field: FieldId,
    /// The non-base variable of the access: rhs for stores, lhs for loads.
    pub var: VarId,
}

/// A local variable with its relevance indexes.
#[derive(Debug, Clone, Default)]
pub struct VarData {
    pub name: String,
    pub container: Option<MethodId>,
    /// `self.f = y` statements with this variable as base.
    pub store_fields: Vec<FieldAccess>,
    /// `x = self.f` statements with this variable as base.
    pub load_fields: Vec<FieldAccess>,
    /// rhs of `self[i] = y` statements with this variable as base.
    pub store_arrays: Vec<VarId>,
    /// lhs of `x = self[i]` statements with this variable as base.
    pub load_arrays: Vec<VarId>,
    /// Invocations with this variable as receiver.
    pub invokes: Vec<InvokeId>,
}

/// Per-method IR: statements plus the parameter/return plumbing the
/// inter-procedural edges need.
#[derive(Debug, Clone, Default)]
pub struct MethodIr {
    pub stmts: Vec<StmtId>,
    pub params: Vec<VarId>,
    pub ret_vars: Vec<VarId>,
    pub this: Option<VarId>,
}

/// A method with a unique signature string.
#[derive(Debug, Clone)]
pub struct Method {
    pub id: MethodId,
    pub signature: String,
    pub ir: MethodIr,
}

/// Resolves call sites to concrete methods.
///
/// Static and special calls look up the exact signature; virtual and
/// interface calls look up `(receiver type, method name)`. Entries are
/// registered explicitly by whoever builds the program — the table does
/// not walk a class hierarchy.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    statics: FxHashMap<String, MethodId>,
    virtuals: FxHashMap<(TypeId, String), MethodId>,
}

impl DispatchTable {
    pub fn link_static(&mut self, signature: &str, method: MethodId) {
        self.statics.insert(signature.to_string(), method);
    }

    pub fn link_virtual(&mut self, recv_ty: TypeId, name: &str, method: MethodId) {
        self.virtuals.insert((recv_ty, name.to_string()), method);
    }

    /// Resolve a call site; `None` means "no method" and installs no edge.
    pub fn resolve(&self, recv_ty: Option<TypeId>, invoke: &Invoke) -> Option<MethodId> {
        if invoke.kind.is_static_dispatch() {
            self.statics.get(&invoke.callee.name).copied()
        } else {
            let ty = recv_ty?;
            self.virtuals.get(&(ty, invoke.callee.name.clone())).copied()
        }
    }
}

/// The whole analyzed program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub types: super::types::TypeTable,
    pub fields: super::types::FieldTable,
    pub(crate) methods: Vec<Method>,
    pub(crate) vars: Vec<VarData>,
    pub(crate) stmts: Vec<Stmt>,
    pub(crate) invokes: Vec<Invoke>,
    pub(crate) method_index: FxHashMap<String, MethodId>,
    pub dispatch: DispatchTable,
    pub(crate) entry: Option<MethodId>,
}

impl Program {
    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    pub fn method_by_signature(&self, signature: &str) -> Option<MethodId> {
        self.method_index.get(signature).copied()
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter()
    }

    pub fn var(&self, id: VarId) -> &VarData {
        &self.vars[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn invoke(&self, id: InvokeId) -> &Invoke {
        &self.invokes[id.index()]
    }

    pub fn method_stmts(&self, id: MethodId) -> impl Iterator<Item = &Stmt> {
        self.methods[id.index()]
            .ir
            .stmts
            .iter()
            .map(move |&s| self.stmt(s))
    }

    /// Program entry point, if one was declared.
    pub fn entry(&self) -> Option<MethodId> {
        self.entry
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_stmts(&self) -> usize {
        self.stmts.len()
    }
}
