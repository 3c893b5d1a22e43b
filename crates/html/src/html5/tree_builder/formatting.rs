//! Active formatting elements list.
//!
//! `reconstruct_active_formatting_elements` and the adoption agency
//! algorithm that would maintain this list are explicit no-op stubs per
//! §9 ("the source's ... are no-ops or TODOs ... keep them as explicit
//! stubs ... do not guess what the author intended"). The list itself is
//! kept so the stub has somewhere to push to, matching the shape a later
//! pass would need.

use crate::html5::shared::{AtomId, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FormattingEntry {
    pub(crate) id: NodeId,
    pub(crate) name: AtomId,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ActiveFormattingList {
    items: Vec<FormattingEntry>,
}

impl ActiveFormattingList {
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    #[allow(dead_code, reason = "adoption agency lands in a later milestone, see DESIGN.md")]
    pub(crate) fn push(&mut self, entry: FormattingEntry) {
        self.items.push(entry);
    }

    #[allow(dead_code, reason = "adoption agency lands in a later milestone, see DESIGN.md")]
    pub(crate) fn pop(&mut self) -> Option<FormattingEntry> {
        self.items.pop()
    }
}
