/*
 * Pointgraph Core - Whole-Program Pointer & Taint Analysis
 *
 * Feature-First Architecture:
 * - shared/      : Program model (dense ids, IR, builder, CFG)
 * - features/    : Vertical slices (pointer_analysis, taint_analysis, dead_code)
 * - config/      : String-keyed analysis options
 *
 * The pointer analysis is inclusion-based (Andersen-style) and
 * context-sensitive behind a pluggable context selector; taint
 * propagation piggybacks on the same fixed-point loop through synthetic
 * heap objects and a taint flow graph. A context-insensitive solver and
 * a dead-code detector round out the core.
 */

/// Shared program model.
pub mod shared;

/// Feature modules.
pub mod features;

/// Analysis options.
pub mod config;

/// Error types.
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{AnalysisOptions, TAINT_CONFIG_KEY};
pub use errors::{PointgraphError, Result};
pub use features::dead_code::{
    ConstFact, ConstValue, ConstantResult, DeadCodeDetector, LivenessResult,
};
pub use features::pointer_analysis::{
    CiPointerAnalysisResult, CiSolver, Context, ContextInsensitiveSelector, ContextSelector,
    Discipline, KCallSiteSelector, KObjectSelector, PointerAnalysisResult, Solver, SolverStats,
};
pub use features::taint_analysis::{TaintConfig, TaintFlow, TaintManager, TAINT_FLOWS_ID};
pub use shared::models::{Program, ProgramBuilder};
