//! Taint-propagation overlay.
//!
//! Taint is modeled as synthetic heap objects that co-propagate through
//! the pointer flow graph; a taint flow graph adds type-rewriting
//! transfers between pointer nodes. The solver drives the overlay at four
//! hook points: call-edge installation, propagation of new taint objects,
//! source injection, and sink collection.

pub mod domain;
pub mod infrastructure;

pub use domain::{TaintConfig, TaintFlow, TransferEnd, BASE, RESULT};
pub use infrastructure::{TaintManager, TAINT_FLOWS_ID};
