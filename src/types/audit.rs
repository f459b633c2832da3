//! Audit events emitted by the engine
//!
//! Every state-changing operation produces exactly one event, whether it
//! succeeded or failed with a domain outcome. Turning events into text lines
//! is the job of the sink (see [`crate::io::audit`]).

use super::account::{AccountId, Amount, Balance};
use super::command::AtmId;
use super::error::CommandError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    AccountOpened {
        atm: AtmId,
        account: AccountId,
        password: String,
        initial_balance: Balance,
    },

    BalanceRead {
        atm: AtmId,
        account: AccountId,
        balance: Balance,
    },

    Deposited {
        atm: AtmId,
        account: AccountId,
        amount: Amount,
        balance: Balance,
    },

    Withdrew {
        atm: AtmId,
        account: AccountId,
        amount: Amount,
        balance: Balance,
    },

    AccountClosed {
        atm: AtmId,
        account: AccountId,
        balance: Balance,
    },

    Transferred {
        atm: AtmId,
        source: AccountId,
        target: AccountId,
        amount: Amount,
        source_balance: Balance,
        target_balance: Balance,
    },

    /// Emitted by the bank itself, once per account per sweep
    CommissionCharged {
        percent: u32,
        account: AccountId,
        amount: Amount,
    },

    AtmClosed { source: AtmId, target: AtmId },

    RolledBack { atm: AtmId, generations: usize },

    /// A command failed with a domain outcome
    Rejected { atm: AtmId, error: CommandError },

    /// A persistent command kept failing after every allowed attempt
    PersistentGaveUp {
        atm: AtmId,
        attempts: usize,
        command: String,
    },
}

impl AuditEvent {
    pub fn rejected(atm: AtmId, error: impl Into<CommandError>) -> Self {
        AuditEvent::Rejected {
            atm,
            error: error.into(),
        }
    }

    /// Whether the event records a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            AuditEvent::Rejected { .. } | AuditEvent::PersistentGaveUp { .. }
        )
    }
}
