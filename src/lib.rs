//! ATM Bank Engine Library
//! # Overview
//!
//! This library runs many concurrent ATM command streams against one shared
//! bank, keeping balances consistent under contention, taking periodic
//! snapshots for rollback and giving VIP and persistent commands their own
//! scheduling policy.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (ids, snapshots, commands, errors, audit events)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Shared state:
//!   - [`core::account`] - Per-account readers-writer lock protocol
//!   - [`core::bank`] - Ledger dispatch, ordered transfer locking, commission, rollback
//!   - [`core::snapshot`] - Bounded snapshot history
//!   - [`core::registry`] - ATM stream lifecycle
//! - [`scheduler`] - Command classification, VIP queue and worker pool
//! - [`io`] - Command files, audit trail, status screen and final CSV
//! - [`runtime`] - Engine configuration and orchestration
//!
//! # Operations
//!
//! Each command line names one operation:
//!
//! - **Open** (`O`): Create an account with an initial balance
//! - **Deposit** (`D`) / **Withdraw** (`W`): Credit or debit an account
//! - **Balance** (`B`): Read an account's balance
//! - **Quit** (`Q`): Delete an account
//! - **Transfer** (`T`): Move funds between two accounts atomically
//! - **Close** (`C`): Stop another ATM after its current command
//! - **Rollback** (`R`): Restore the bank to an earlier snapshot generation
//!
//! # Result Codes
//!
//! Every account operation reports a stable [`types::ResultCode`]:
//! `0` success, `-1` account exists, `-2` account not found, `-3` wrong
//! password, `-4` insufficient funds, `-5` target account not found, `-6`
//! balance overflow.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod runtime;
pub mod scheduler;
pub mod types;

pub use core::{Account, AtmRegistry, Bank, SnapshotStore};
pub use io::write_accounts_csv;
pub use runtime::{Engine, EngineConfig, RunReport};
pub use scheduler::{CommandRouter, PriorityScheduler, RetryPolicy, VipQueue};
pub use types::{
    AccountId, AuditEvent, BankError, BankSnapshot, Command, CommandError, EngineError,
    ResultCode,
};
