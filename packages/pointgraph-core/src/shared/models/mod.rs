//! Shared program model: dense ids, IR, builder, and control-flow graphs.

pub mod builder;
pub mod cfg;
pub mod ir;
pub mod types;

pub use builder::ProgramBuilder;
pub use cfg::{Cfg, CfgBuilder, CfgEdge, EdgeKind};
pub use ir::{
    BinaryOp, CallKind, CmpOp, Condition, DispatchTable, FieldAccess, Invoke, Method, MethodIr,
    MethodRef, Operand, Program, Stmt, StmtKind, VarData,
};
pub use types::{FieldId, InvokeId, MethodId, StmtId, TypeId, VarId};
