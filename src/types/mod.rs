//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account identifiers and value snapshots
//! - `audit`: Events recorded in the audit trail
//! - `command`: Typed commands and their scheduling classification
//! - `error`: Error types and stable result codes

pub mod account;
pub mod audit;
pub mod command;
pub mod error;

pub use account::{AccountId, AccountSnapshot, Amount, Balance, BankSnapshot};
pub use audit::AuditEvent;
pub use command::{AtmId, Classification, Command, Operation, Priority};
pub use error::{BankError, CommandError, EngineError, ParseError, ResultCode};
