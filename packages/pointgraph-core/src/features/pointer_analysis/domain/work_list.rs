//! The solver work list.
//!
//! A multiset of (pointer, points-to set) entries. Duplicate pointers are
//! permitted; the solver's set-difference in `propagate` makes re-delivery
//! harmless. The fixed point is independent of polling order, so a LIFO
//! discipline is offered for the order-independence tests.

use std::collections::VecDeque;

use super::elements::{CSObjId, PointerId};
use super::points_to_set::PointsToSet;

/// Polling order. The result of a solve must not depend on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Discipline {
    #[default]
    Fifo,
    Lifo,
}

/// One unit of pending propagation work.
#[derive(Debug)]
pub struct Entry {
    pub pointer: PointerId,
    pub pts: PointsToSet<CSObjId>,
}

#[derive(Debug, Default)]
pub struct WorkList {
    entries: VecDeque<Entry>,
    discipline: Discipline,
}

impl WorkList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discipline(discipline: Discipline) -> Self {
        Self {
            entries: VecDeque::new(),
            discipline,
        }
    }

    pub fn add_entry(&mut self, pointer: PointerId, pts: PointsToSet<CSObjId>) {
        self.entries.push_back(Entry { pointer, pts });
    }

    pub fn poll_entry(&mut self) -> Option<Entry> {
        match self.discipline {
            Discipline::Fifo => self.entries.pop_front(),
            Discipline::Lifo => self.entries.pop_back(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut wl = WorkList::new();
        wl.add_entry(PointerId(0), PointsToSet::singleton(CSObjId(0)));
        wl.add_entry(PointerId(1), PointsToSet::singleton(CSObjId(1)));
        assert_eq!(wl.poll_entry().unwrap().pointer, PointerId(0));
        assert_eq!(wl.poll_entry().unwrap().pointer, PointerId(1));
        assert!(wl.poll_entry().is_none());
    }

    #[test]
    fn test_lifo_order() {
        let mut wl = WorkList::with_discipline(Discipline::Lifo);
        wl.add_entry(PointerId(0), PointsToSet::new());
        wl.add_entry(PointerId(1), PointsToSet::new());
        assert_eq!(wl.poll_entry().unwrap().pointer, PointerId(1));
    }

    #[test]
    fn test_duplicate_pointers_are_kept() {
        let mut wl = WorkList::new();
        wl.add_entry(PointerId(0), PointsToSet::singleton(CSObjId(0)));
        wl.add_entry(PointerId(0), PointsToSet::singleton(CSObjId(1)));
        assert_eq!(wl.len(), 2);
    }
}
