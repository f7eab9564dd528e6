//! Linear undo/redo ledger of surface snapshots
//!
//! The ledger only stores and navigates [`Snapshot`]s; applying one back to
//! a surface is the caller's job.

use std::collections::VecDeque;

use tracing::debug;

use crate::surface::Snapshot;

/// Bounded linear history with a cursor
///
/// The cursor points at the entry matching the surface's current state, or
/// is `None` when the ledger is empty.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    entries: VecDeque<Snapshot>,
    cursor: Option<usize>,
    limit: Option<usize>,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HistoryLedger {
    /// Create a ledger keeping at most `limit` entries (`None` = unbounded)
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            limit: limit.map(|l| l.max(1)),
        }
    }

    /// Record a new state
    ///
    /// Entries past the cursor are discarded first. Pushing a snapshot equal
    /// to the current entry is ignored. Returns whether an entry was added.
    pub fn push(&mut self, snapshot: Snapshot) -> bool {
        if self.current() == Some(&snapshot) {
            return false;
        }

        let keep = self.cursor.map_or(0, |c| c + 1);
        if keep < self.entries.len() {
            debug!("History: discarding {} redo entries", self.entries.len() - keep);
            self.entries.truncate(keep);
        }

        self.entries.push_back(snapshot);
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                self.entries.pop_front();
            }
        }
        self.cursor = Some(self.entries.len() - 1);
        true
    }

    /// Step back, returning the snapshot to restore
    pub fn undo(&mut self) -> Option<Snapshot> {
        let cursor = self.cursor.filter(|&c| c > 0)?;
        self.cursor = Some(cursor - 1);
        self.entries.get(cursor - 1).cloned()
    }

    /// Step forward, returning the snapshot to restore
    pub fn redo(&mut self) -> Option<Snapshot> {
        let next = self.cursor.map_or(0, |c| c + 1);
        let snapshot = self.entries.get(next).cloned()?;
        self.cursor = Some(next);
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.entries.len()
    }

    /// Entry matching the current state
    pub fn current(&self) -> Option<&Snapshot> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ObjectBase, ObjectKind, TextObject};
    use crate::surface::DrawingSurface;

    fn snapshot_with(texts: &[&str]) -> Snapshot {
        let mut surface = DrawingSurface::blank(375, 525);
        for text in texts {
            surface.add_object(
                ObjectBase::at(10.0, 10.0),
                ObjectKind::Text(TextObject::new(*text)),
            );
        }
        surface.serialize().unwrap()
    }

    #[test]
    fn test_empty_ledger() {
        let mut ledger = HistoryLedger::default();
        assert!(!ledger.can_undo());
        assert!(!ledger.can_redo());
        assert!(ledger.undo().is_none());
        assert!(ledger.redo().is_none());
        assert_eq!(ledger.cursor(), None);
    }

    #[test]
    fn test_undo_then_redo() {
        let a = snapshot_with(&["a"]);
        let b = snapshot_with(&["a", "b"]);
        let mut ledger = HistoryLedger::default();
        ledger.push(a.clone());
        ledger.push(b.clone());

        assert_eq!(ledger.undo(), Some(a));
        assert!(ledger.can_redo());
        assert_eq!(ledger.redo(), Some(b.clone()));
        assert_eq!(ledger.current(), Some(&b));
        assert!(!ledger.can_redo());
    }

    #[test]
    fn test_push_after_undo_truncates() {
        let a = snapshot_with(&["a"]);
        let b = snapshot_with(&["a", "b"]);
        let c = snapshot_with(&["a", "c"]);
        let mut ledger = HistoryLedger::default();
        ledger.push(a.clone());
        ledger.push(b);
        ledger.undo();
        ledger.push(c.clone());

        assert!(!ledger.can_redo());
        assert!(ledger.redo().is_none());
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.current(), Some(&c));
        assert_eq!(ledger.undo(), Some(a));
    }

    #[test]
    fn test_undo_stops_at_first_entry() {
        let mut ledger = HistoryLedger::default();
        ledger.push(snapshot_with(&[]));
        assert!(!ledger.can_undo());
        assert!(ledger.undo().is_none());
        assert_eq!(ledger.cursor(), Some(0));
    }

    #[test]
    fn test_duplicate_push_is_ignored() {
        let a = snapshot_with(&["a"]);
        let mut ledger = HistoryLedger::default();
        assert!(ledger.push(a.clone()));
        assert!(!ledger.push(a));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut ledger = HistoryLedger::new(Some(3));
        let snapshots: Vec<_> = (0..5)
            .map(|n| snapshot_with(&vec!["x"; n + 1]))
            .collect();
        for snapshot in &snapshots {
            ledger.push(snapshot.clone());
        }

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.cursor(), Some(2));
        assert_eq!(ledger.undo(), Some(snapshots[3].clone()));
        assert_eq!(ledger.undo(), Some(snapshots[2].clone()));
        assert!(ledger.undo().is_none());
    }

    #[test]
    fn test_clear() {
        let mut ledger = HistoryLedger::new(Some(10));
        ledger.push(snapshot_with(&["a"]));
        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.current(), None);
        assert_eq!(ledger.limit(), Some(10));
    }
}
