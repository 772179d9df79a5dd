use crate::error::{CashFlowError, Result};
use crate::ledger::Ledger;
use crate::schema::DEFAULT_HISTORY_CAPACITY;
use log::debug;
use std::collections::VecDeque;

/// Bounded stack of ledger snapshots for undo. The top is the state the
/// ledger is in at rest; the oldest snapshot is dropped on overflow.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<Ledger>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Records a copy of `ledger` unless it equals the current top.
    /// Returns whether a snapshot was pushed.
    pub fn snapshot(&mut self, ledger: &Ledger) -> bool {
        if self.snapshots.back() == Some(ledger) {
            return false;
        }
        if self.snapshots.len() >= self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(ledger.clone());
        debug!("Saved ledger snapshot ({} of {})", self.snapshots.len(), self.capacity);
        true
    }

    /// Discards the current top and returns the snapshot beneath it.
    pub fn undo(&mut self) -> Result<Ledger> {
        if self.snapshots.len() <= 1 {
            return Err(CashFlowError::NothingToUndo);
        }
        self.snapshots.pop_back();
        self.snapshots
            .back()
            .cloned()
            .ok_or(CashFlowError::NothingToUndo)
    }

    pub fn current(&self) -> Option<&Ledger> {
        self.snapshots.back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn can_undo(&self) -> bool {
        self.snapshots.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::BASE_PALETTE;
    use crate::ledger::SeriesTag;
    use crate::schema::SeriesId;

    fn ledger_with(n: u32) -> Ledger {
        let tag = SeriesTag::new(SeriesId(1), BASE_PALETTE[0], "S");
        let mut ledger = Ledger::new();
        ledger
            .append((0..n).map(|p| tag.entry(p, 1.0)).collect())
            .unwrap();
        ledger
    }

    #[test]
    fn test_duplicate_snapshot_is_skipped() {
        let mut history = History::default();
        assert!(history.snapshot(&ledger_with(0)));
        assert!(!history.snapshot(&ledger_with(0)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_capacity_bound() {
        let mut history = History::default();
        for n in 0..12 {
            history.snapshot(&ledger_with(n));
            assert!(history.len() <= 5);
        }
        assert_eq!(history.len(), 5);
        assert_eq!(history.current(), Some(&ledger_with(11)));
    }

    #[test]
    fn test_undo_walks_back_until_one_remains() {
        let mut history = History::new(5);
        history.snapshot(&ledger_with(0));
        history.snapshot(&ledger_with(1));
        history.snapshot(&ledger_with(2));

        assert_eq!(history.undo().unwrap(), ledger_with(1));
        assert_eq!(history.undo().unwrap(), ledger_with(0));
        assert!(matches!(history.undo(), Err(CashFlowError::NothingToUndo)));
        assert_eq!(history.len(), 1);
    }
}
