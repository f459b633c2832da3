//! Shared priority queue of VIP commands
//!
//! Highest priority is served first; equal priorities drain in arrival
//! order. Push and pop are serialized by a single mutex.
//!
//! The queue also counts commands that were pushed but not yet reported
//! [`complete`](VipQueue::complete), so the engine can tell "empty" (nothing
//! queued) apart from "idle" (nothing queued and nothing in flight).

use crate::types::{AtmId, Command, Priority};
use parking_lot::Mutex;
use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// A queued VIP command with the ATM it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VipEntry {
    pub priority: Priority,
    sequence: Reverse<u64>,
    pub atm: AtmId,
    pub command: Command,
}

impl Ord for VipEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for VipEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

/// Max-priority queue with FIFO tie-breaking
#[derive(Debug, Default)]
pub struct VipQueue {
    heap: Mutex<BinaryHeap<VipEntry>>,
    next_sequence: AtomicU64,
    pending: AtomicUsize,
}

impl VipQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `command` from `atm` at `priority`
    pub fn push(&self, atm: AtmId, priority: Priority, command: Command) {
        let mut heap = self.heap.lock();
        // Sequence is drawn under the lock so arrival order matches heap order
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        self.pending.fetch_add(1, Ordering::SeqCst);
        heap.push(VipEntry {
            priority,
            sequence: Reverse(sequence),
            atm,
            command,
        });
    }

    /// Dequeue the highest-priority entry, if any
    ///
    /// The caller must report [`complete`](Self::complete) once the entry
    /// has been executed.
    pub fn pop(&self) -> Option<VipEntry> {
        self.heap.lock().pop()
    }

    /// Report that a popped entry finished executing
    pub fn complete(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    /// Number of entries waiting in the queue
    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.lock().is_empty()
    }

    /// Nothing queued and nothing in flight
    pub fn is_idle(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0
    }
}
