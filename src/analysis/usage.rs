//! Usage collector backing the dead-code detector (spec §4.7, SPEC_FULL
//! §4 C7 supplement).

use crate::index::Index;
use crate::ir::{Symbol, SymbolId};

/// Answers "does this Symbol have any recorded incoming reference?" —
/// a thin, named wrapper over the Index's own reference projection so
/// the dead-code detector doesn't reach into `Index` internals directly.
pub struct UsageCollector<'a> {
    index: &'a Index,
}

impl<'a> UsageCollector<'a> {
    /// Wrap `index`.
    pub fn new(index: &'a Index) -> Self {
        Self { index }
    }

    /// Whether `id` has at least one incoming reference.
    pub fn is_referenced(&self, id: &SymbolId) -> bool {
        self.index.has_incoming_reference(id)
    }

    /// Every Symbol with zero recorded incoming references.
    pub fn unreferenced(&self) -> Vec<&'a Symbol> {
        self.index.all_symbols().filter(|s| !self.index.has_incoming_reference(&s.id)).collect()
    }
}
