//! Taint domain model: configuration schema and reported flows.

pub mod config;
pub mod flow;

pub use config::{
    ResolvedTaintConfig, SinkSpec, SourceSpec, TaintConfig, TransferEnd, TransferSpec, BASE,
    RESULT,
};
pub use flow::TaintFlow;
