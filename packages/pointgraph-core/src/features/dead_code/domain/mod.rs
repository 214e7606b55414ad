//! Input facts consumed by the dead-code detector.
//!
//! The detector does not run its own dataflow analyses; it consumes a
//! constant-propagation result (in-fact per statement) and a live-variable
//! result (out-fact per statement) produced elsewhere.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::shared::models::{StmtId, VarId};

/// Constant-propagation lattice value for one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstValue {
    /// No information (bottom).
    #[default]
    Undef,
    /// Exactly this constant.
    Const(i64),
    /// Not a constant (top).
    Nac,
}

impl ConstValue {
    pub fn is_constant(self) -> bool {
        matches!(self, ConstValue::Const(_))
    }

    pub fn as_constant(self) -> Option<i64> {
        match self {
            ConstValue::Const(v) => Some(v),
            _ => None,
        }
    }
}

/// Variable-to-value map at one program point.
#[derive(Debug, Clone, Default)]
pub struct ConstFact {
    values: FxHashMap<VarId, ConstValue>,
}

impl ConstFact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, var: VarId, value: ConstValue) -> &mut Self {
        self.values.insert(var, value);
        self
    }

    /// Absent variables are `Undef`.
    pub fn value_of(&self, var: VarId) -> ConstValue {
        self.values.get(&var).copied().unwrap_or_default()
    }
}

/// Constant-propagation result: the in-fact of each statement.
#[derive(Debug, Clone, Default)]
pub struct ConstantResult {
    in_facts: FxHashMap<StmtId, ConstFact>,
    empty: ConstFact,
}

impl ConstantResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_in_fact(&mut self, stmt: StmtId, fact: ConstFact) -> &mut Self {
        self.in_facts.insert(stmt, fact);
        self
    }

    /// Statements without a recorded fact answer with the empty fact.
    pub fn in_fact(&self, stmt: StmtId) -> &ConstFact {
        self.in_facts.get(&stmt).unwrap_or(&self.empty)
    }
}

/// Live-variable result: the out-fact of each statement.
#[derive(Debug, Clone, Default)]
pub struct LivenessResult {
    out_facts: FxHashMap<StmtId, FxHashSet<VarId>>,
}

impl LivenessResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_live_out(&mut self, stmt: StmtId, vars: impl IntoIterator<Item = VarId>) -> &mut Self {
        self.out_facts
            .entry(stmt)
            .or_default()
            .extend(vars);
        self
    }

    /// Absent statements have nothing live.
    pub fn is_live_out(&self, stmt: StmtId, var: VarId) -> bool {
        self.out_facts
            .get(&stmt)
            .is_some_and(|live| live.contains(&var))
    }
}
