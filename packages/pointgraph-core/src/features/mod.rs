//! Feature modules: vertical slices over the shared program model.

pub mod dead_code;
pub mod pointer_analysis;
pub mod taint_analysis;
