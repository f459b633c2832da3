//! Core business logic module
//!
//! This module contains the shared state every worker operates on:
//! - `account` - Account with its readers-writer balance lock
//! - `bank` - Ledger dispatch, ordered transfer locking, commission, rollback
//! - `snapshot` - Bounded snapshot history
//! - `registry` - ATM stream lifecycle and completion counter
//! - `traits` - Seams for the audit sink and command execution

pub mod account;
pub mod bank;
pub mod registry;
pub mod snapshot;
pub mod traits;

pub use account::{Account, AccountWriteGuard};
pub use bank::{Bank, TransferReceipt};
pub use registry::{AtmRegistry, AtmStream};
pub use snapshot::{SnapshotStore, DEFAULT_SNAPSHOT_CAPACITY};
pub use traits::{AuditSink, CommandExecutor};
