//! Taint infrastructure.

pub mod manager;

pub use manager::{TaintManager, TAINT_FLOWS_ID};
