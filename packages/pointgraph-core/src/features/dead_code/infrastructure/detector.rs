//! Dead-code detection over a per-method CFG.
//!
//! Two kinds of dead code are reported: statements unreachable from the
//! CFG entry once constant branches are pruned, and side-effect-free
//! assignments whose left-hand side is not live afterwards.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::shared::models::{
    Cfg, CmpOp, Condition, EdgeKind, Operand, Program, StmtId, StmtKind,
};

use super::super::domain::{ConstFact, ConstValue, ConstantResult, LivenessResult};

pub struct DeadCodeDetector<'a> {
    program: &'a Program,
}

impl<'a> DeadCodeDetector<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    /// Find dead statements, ordered by statement index.
    pub fn analyze(
        &self,
        cfg: &Cfg,
        constants: &ConstantResult,
        liveness: &LivenessResult,
    ) -> Vec<StmtId> {
        let mut dead: FxHashSet<StmtId> = FxHashSet::default();
        let mut visited: FxHashSet<StmtId> = FxHashSet::default();
        let mut queue: VecDeque<StmtId> = VecDeque::new();

        queue.push_back(cfg.entry());
        visited.insert(cfg.entry());

        while let Some(current) = queue.pop_front() {
            let stmt = self.program.stmt(current);
            let visit = |target: StmtId, queue: &mut VecDeque<StmtId>,
                             visited: &mut FxHashSet<StmtId>| {
                if visited.insert(target) {
                    queue.push_back(target);
                }
            };
            match stmt.kind {
                StmtKind::If { cond } => {
                    if let Some(value) = eval_condition(cond, constants.in_fact(current)) {
                        let taken = if value == 1 {
                            EdgeKind::IfTrue
                        } else {
                            EdgeKind::IfFalse
                        };
                        for edge in cfg.out_edges(current) {
                            if edge.kind == taken {
                                visit(edge.target, &mut queue, &mut visited);
                            }
                        }
                        continue;
                    }
                }
                StmtKind::Switch { var } => {
                    if let ConstValue::Const(value) = constants.in_fact(current).value_of(var) {
                        let mut matched = false;
                        for edge in cfg.out_edges(current) {
                            if edge.kind == EdgeKind::SwitchCase(value) {
                                visit(edge.target, &mut queue, &mut visited);
                                matched = true;
                            }
                        }
                        if !matched {
                            for edge in cfg.out_edges(current) {
                                if edge.kind == EdgeKind::SwitchDefault {
                                    visit(edge.target, &mut queue, &mut visited);
                                }
                            }
                        }
                        continue;
                    }
                }
                ref kind => {
                    if let Some(lhs) = kind.def_var() {
                        if !liveness.is_live_out(current, lhs) && has_no_side_effect(kind) {
                            dead.insert(current);
                        }
                    }
                }
            }
            for edge in cfg.out_edges(current) {
                visit(edge.target, &mut queue, &mut visited);
            }
        }

        for &node in cfg.nodes() {
            if node != cfg.exit() && !visited.contains(&node) {
                dead.insert(node);
            }
        }

        let mut result: Vec<StmtId> = dead.into_iter().collect();
        result.sort_by_key(|&s| self.program.stmt(s).index);
        result
    }
}

/// Evaluate a branch condition under a constant fact; `Some(1)`/`Some(0)`
/// when both operands are constants.
fn eval_condition(cond: Condition, fact: &ConstFact) -> Option<i64> {
    let x = eval_operand(cond.x, fact)?;
    let y = eval_operand(cond.y, fact)?;
    let holds = match cond.op {
        CmpOp::Eq => x == y,
        CmpOp::Ne => x != y,
        CmpOp::Lt => x < y,
        CmpOp::Le => x <= y,
        CmpOp::Gt => x > y,
        CmpOp::Ge => x >= y,
    };
    Some(holds as i64)
}

fn eval_operand(operand: Operand, fact: &ConstFact) -> Option<i64> {
    match operand {
        Operand::Const(value) => Some(value),
        Operand::Var(var) => fact.value_of(var).as_constant(),
    }
}

/// Whether an assignment's right-hand side is free of observable effects.
/// Allocation, casts, and field/array accesses may fault or touch the
/// heap; division and remainder may fault on zero.
fn has_no_side_effect(kind: &StmtKind) -> bool {
    match kind {
        StmtKind::Copy { .. } | StmtKind::AssignLiteral { .. } => true,
        StmtKind::Binary { op, .. } => !op.may_fault(),
        StmtKind::New { .. }
        | StmtKind::Cast { .. }
        | StmtKind::LoadField { .. }
        | StmtKind::LoadArray { .. } => false,
        _ => true,
    }
}
