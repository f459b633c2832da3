//! Account-related value types for the ATM bank engine
//!
//! The live, lockable account lives in [`crate::core::account`]. This module
//! only holds identifiers and the plain value copies used by snapshots,
//! rollback and reporting.

use serde::Serialize;

/// Account identifier
pub type AccountId = u32;

/// Account balance (whole currency units)
pub type Balance = i64;

/// Amount carried by a deposit, withdrawal or transfer
///
/// Always non-negative; the command parser rejects negative values.
pub type Amount = i64;

/// Immutable value copy of a single account
///
/// Captured while the account's read lock is held, so the three fields are
/// mutually consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    /// The account id
    #[serde(rename = "account")]
    pub id: AccountId,

    /// Current balance at capture time
    pub balance: Balance,

    /// The account password (plaintext, as stored)
    pub password: String,
}

/// Value copy of every account in the bank at one instant
///
/// Accounts are ordered by ascending id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankSnapshot {
    pub accounts: Vec<AccountSnapshot>,
}

impl BankSnapshot {
    /// Balance of the given account in this snapshot, if present
    pub fn balance_of(&self, id: AccountId) -> Option<Balance> {
        self.accounts
            .binary_search_by_key(&id, |account| account.id)
            .ok()
            .map(|index| self.accounts[index].balance)
    }

    /// Sum of all balances in this snapshot
    pub fn total_balance(&self) -> Balance {
        self.accounts.iter().map(|account| account.balance).sum()
    }
}
