//! I/O module
//!
//! Handles command-file ingestion and everything the engine writes out.
//!
//! # Components
//!
//! - `command_parser` - Line tokens to typed, classified commands
//! - `command_reader` - Asynchronous reader of ATM command files
//! - `audit` - Audit line wording plus file and in-memory sinks
//! - `report` - Status screen and final account CSV

pub mod audit;
pub mod command_parser;
pub mod command_reader;
pub mod report;

pub use audit::{format_line, FileAuditLog, MemoryAuditLog};
pub use command_parser::{parse_command, parse_tokens};
pub use command_reader::CommandReader;
pub use report::{render_status, write_accounts_csv};
