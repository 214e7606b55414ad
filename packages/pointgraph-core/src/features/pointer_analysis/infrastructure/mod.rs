//! Solver implementations and default collaborators.

pub mod ci_solver;
pub mod heap;
pub mod selectors;
pub mod solver;

pub use ci_solver::{CiPointerAnalysisResult, CiSolver};
pub use heap::AllocSiteHeapModel;
pub use selectors::{ContextInsensitiveSelector, KCallSiteSelector, KObjectSelector};
pub use solver::Solver;
