//! Domain model of the pointer analysis: interned elements, points-to
//! sets, the pointer flow graph, the work list, and the call graph.

pub mod call_graph;
pub mod context;
pub mod elements;
pub mod pointer_flow_graph;
pub mod points_to_set;
pub mod work_list;

pub use call_graph::{CSCallGraph, CallEdge};
pub use context::{Context, ContextElem};
pub use elements::{
    CSCallSiteId, CSManager, CSMethodId, CSObjId, CtxId, ObjId, PointerId, PointerKind,
};
pub use pointer_flow_graph::PointerFlowGraph;
pub use points_to_set::PointsToSet;
pub use work_list::{Discipline, WorkList};
