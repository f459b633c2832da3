//! Registry of ATM worker streams
//!
//! Tracks, per ATM id, whether the stream has been asked to close and whether
//! it has finished, plus a process-wide completion counter the engine polls
//! to know when every stream is done.
//!
//! # Thread Safety
//!
//! Entries live in a `DashMap`, so a close request from one stream and the
//! closed-flag check of another only contend on the same shard. The
//! completion counter is a plain atomic.

use crate::types::{AtmId, CommandError};
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lifecycle state of one ATM stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtmStream {
    /// Command file feeding this stream
    pub path: PathBuf,
    /// Set by a close-ATM command; checked between commands
    pub closed: bool,
    /// Set once the stream stopped reading commands
    pub finished: bool,
}

/// All ATM streams known to the engine
#[derive(Debug, Default)]
pub struct AtmRegistry {
    streams: DashMap<AtmId, AtmStream>,
    completed: AtomicUsize,
}

impl AtmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stream under `atm`, replacing any previous entry
    pub fn register(&self, atm: AtmId, path: impl Into<PathBuf>) {
        self.streams.insert(
            atm,
            AtmStream {
                path: path.into(),
                closed: false,
                finished: false,
            },
        );
    }

    /// Number of registered streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Mark `target` as closed on behalf of `source`
    ///
    /// # Errors
    ///
    /// - `AtmNotFound` if `target` was never registered
    /// - `AtmAlreadyClosed` if `target` is already closed
    pub fn close(&self, source: AtmId, target: AtmId) -> Result<(), CommandError> {
        let mut stream = self
            .streams
            .get_mut(&target)
            .ok_or(CommandError::AtmNotFound { atm: target })?;

        if stream.closed {
            return Err(CommandError::AtmAlreadyClosed { atm: target });
        }
        stream.closed = true;
        tracing::debug!(source, target, "ATM marked closed");
        Ok(())
    }

    /// Whether the stream `atm` must stop before its next command
    ///
    /// Unknown ids are treated as terminated.
    pub fn should_terminate(&self, atm: AtmId) -> bool {
        self.streams.get(&atm).map_or(true, |stream| stream.closed)
    }

    /// Record that `atm` stopped reading commands
    ///
    /// Counts each stream at most once.
    pub fn mark_completed(&self, atm: AtmId) {
        if let Some(mut stream) = self.streams.get_mut(&atm) {
            if !stream.finished {
                stream.finished = true;
                self.completed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Number of streams that have finished
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Whether every registered stream has finished
    pub fn all_completed(&self) -> bool {
        self.completed_count() >= self.streams.len()
    }

    /// Copy of the state of `atm`
    pub fn stream(&self, atm: AtmId) -> Option<AtmStream> {
        self.streams.get(&atm).map(|stream| stream.clone())
    }
}
