//! Dead-code detection.
//!
//! Combines reachability over a constant-pruned CFG with a liveness
//! filter for side-effect-free assignments. Consumes precomputed
//! constant-propagation and live-variable results.

pub mod domain;
pub mod infrastructure;

pub use domain::{ConstFact, ConstValue, ConstantResult, LivenessResult};
pub use infrastructure::DeadCodeDetector;
