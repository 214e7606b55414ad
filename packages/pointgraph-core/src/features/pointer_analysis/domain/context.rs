//! Analysis contexts.
//!
//! A context is a bounded sequence of discriminating elements (call sites,
//! heap objects, or types, depending on the selector). The solver treats
//! contexts as opaque values: two contexts are the same abstract context
//! iff they compare equal.

use crate::shared::models::{InvokeId, TypeId};

use super::elements::ObjId;

/// One element of a context string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextElem {
    CallSite(InvokeId),
    HeapObj(ObjId),
    Type(TypeId),
}

/// An analysis context. The empty context is the distinguished initial
/// context; taint objects always live in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Context {
    elems: Vec<ContextElem>,
}

impl Context {
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.elems.len()
    }

    pub fn elems(&self) -> &[ContextElem] {
        &self.elems
    }

    /// Append `elem`, keeping only the most recent `limit` elements.
    /// A zero limit yields the empty context.
    pub fn push(&self, elem: ContextElem, limit: usize) -> Context {
        if limit == 0 {
            return Context::empty();
        }
        let mut elems = self.elems.clone();
        elems.push(elem);
        if elems.len() > limit {
            elems.drain(..elems.len() - limit);
        }
        Context { elems }
    }

    /// The most recent `limit` elements, used for heap contexts.
    pub fn suffix(&self, limit: usize) -> Context {
        if limit >= self.elems.len() {
            return self.clone();
        }
        Context {
            elems: self.elems[self.elems.len() - limit..].to_vec(),
        }
    }
}
