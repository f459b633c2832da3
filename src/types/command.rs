//! Command types for the ATM bank engine
//!
//! A [`Command`] is the typed, validated form of one line of an ATM command
//! file. It carries the banking [`Operation`] together with its scheduling
//! [`Classification`], both derived once at parse time.

use super::account::{AccountId, Amount};

/// Identifier of an ATM worker stream (1-based, in command-line order)
pub type AtmId = u32;

/// VIP priority; higher values are served first
pub type Priority = u32;

/// Banking operation requested by a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Open a new account with an initial balance
    Open {
        account: AccountId,
        password: String,
        initial_balance: Amount,
    },

    /// Credit an account
    Deposit {
        account: AccountId,
        password: String,
        amount: Amount,
    },

    /// Debit an account (requires sufficient balance)
    Withdraw {
        account: AccountId,
        password: String,
        amount: Amount,
    },

    /// Read an account's balance
    Balance { account: AccountId, password: String },

    /// Remove an account from the bank
    Delete { account: AccountId, password: String },

    /// Move funds between two accounts
    Transfer {
        account: AccountId,
        password: String,
        target: AccountId,
        amount: Amount,
    },

    /// Mark another ATM stream as closed
    CloseAtm { target: AtmId },

    /// Restore the bank to an earlier snapshot generation
    Rollback { iterations: usize },
}

impl Operation {
    /// Short lowercase name, used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Open { .. } => "open",
            Operation::Deposit { .. } => "deposit",
            Operation::Withdraw { .. } => "withdraw",
            Operation::Balance { .. } => "balance",
            Operation::Delete { .. } => "delete",
            Operation::Transfer { .. } => "transfer",
            Operation::CloseAtm { .. } => "close",
            Operation::Rollback { .. } => "rollback",
        }
    }
}

/// Scheduling class of a command
///
/// A command is exactly one of these. When a line carries both markers the
/// VIP marker wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Dispatched once; the outcome is final
    Regular,

    /// Queued for the priority scheduler
    Vip { priority: Priority },

    /// Retried a bounded number of times while it keeps failing
    Persistent,
}

/// A parsed, classified command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Original line, kept for audit messages
    pub raw: String,

    /// The banking operation
    pub operation: Operation,

    /// How the command is scheduled
    pub classification: Classification,
}

impl Command {
    pub fn new(raw: impl Into<String>, operation: Operation, classification: Classification) -> Self {
        Self {
            raw: raw.into(),
            operation,
            classification,
        }
    }

    /// Build an unclassified (regular) command
    pub fn regular(raw: impl Into<String>, operation: Operation) -> Self {
        Self::new(raw, operation, Classification::Regular)
    }
}
