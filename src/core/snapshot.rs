//! Bounded history of bank snapshots
//!
//! The store keeps the most recent snapshot generations, oldest first. When
//! a push exceeds the capacity the oldest generation is evicted. The store
//! has its own mutex, independent of the bank's ledger lock.

use crate::types::BankSnapshot;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Number of generations kept by default
pub const DEFAULT_SNAPSHOT_CAPACITY: usize = 120;

/// FIFO-bounded snapshot history
#[derive(Debug)]
pub struct SnapshotStore {
    capacity: usize,
    history: Mutex<VecDeque<Arc<BankSnapshot>>>,
}

impl SnapshotStore {
    /// Create an empty store holding at most `capacity` generations
    ///
    /// A zero capacity is bumped to one so a pushed snapshot is always
    /// retrievable until the next push.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            history: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of generations currently stored
    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }

    /// Append a generation, evicting the oldest beyond capacity
    pub fn push(&self, snapshot: BankSnapshot) -> Arc<BankSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut history = self.history.lock();
        history.push_back(Arc::clone(&snapshot));
        while history.len() > self.capacity {
            history.pop_front();
        }
        snapshot
    }

    /// The snapshot `generations` back from the newest (1 = newest)
    ///
    /// Returns the stored length as the error when the request cannot be
    /// served (`generations` is zero or exceeds the history).
    pub fn generations_back(&self, generations: usize) -> Result<Arc<BankSnapshot>, usize> {
        let history = self.history.lock();
        if generations == 0 || generations > history.len() {
            return Err(history.len());
        }

        Ok(Arc::clone(&history[history.len() - generations]))
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_CAPACITY)
    }
}
