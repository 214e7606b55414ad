//! Whole-program, context-sensitive, inclusion-based pointer analysis.
//!
//! The solver computes a monotone fixed point over a dynamically growing
//! pointer flow graph and call graph: newly reachable methods contribute
//! flow edges, new points-to facts discover call edges, and new call
//! edges make more methods reachable. A context-insensitive variant is
//! provided for cross-checking.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{PointerAnalysisResult, SolverStats};
pub use domain::{Context, ContextElem, Discipline, PointsToSet};
pub use infrastructure::{
    AllocSiteHeapModel, CiPointerAnalysisResult, CiSolver, ContextInsensitiveSelector,
    KCallSiteSelector, KObjectSelector, Solver,
};
pub use ports::{CalleeResolver, ContextSelector, HeapModel, ObjData, ObjKind};
