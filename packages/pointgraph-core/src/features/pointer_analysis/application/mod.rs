//! Application layer: analysis results exposed to consumers.

pub mod result;

pub use result::{PointerAnalysisResult, SolverStats};
