//! The bank: ordered account collection, ledger lock, snapshots and rollback
//!
//! # Locking
//!
//! ```text
//! Bank
//!     ├── RwLock<Vec<Account>>  ledger lock, accounts sorted by id
//!     │       read  = deposit, withdraw, balance, transfer, commission, snapshot
//!     │       write = create, delete, rollback swap
//!     ├── Account::balance      per-account RwLock (see core::account)
//!     └── SnapshotStore         own mutex, never held across the ledger lock
//! ```
//!
//! The ledger read lock only keeps the set of accounts stable; balance
//! safety comes from each account's own lock. Whenever more than one account
//! lock is held (transfers, snapshot capture) they are taken in ascending id
//! order, so no cycle of waiters can form.
//!
//! Audit events are recorded after every domain lock has been released.

use super::account::Account;
use super::snapshot::SnapshotStore;
use super::traits::AuditSink;
use crate::types::{
    AccountId, Amount, AtmId, AuditEvent, Balance, BankError, BankSnapshot, CommandError,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Balances of both sides after a successful transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    pub source_balance: Balance,
    pub target_balance: Balance,
}

/// The shared ledger
pub struct Bank {
    accounts: RwLock<Vec<Account>>,
    bank_balance: AtomicI64,
    snapshots: SnapshotStore,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bank")
            .field("accounts", &self.accounts)
            .field("bank_balance", &self.bank_balance)
            .field("snapshots", &self.snapshots)
            .finish_non_exhaustive()
    }
}

impl Bank {
    /// Create an empty bank with the default snapshot capacity
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self::with_snapshot_store(SnapshotStore::default(), audit)
    }

    pub fn with_snapshot_store(snapshots: SnapshotStore, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            accounts: RwLock::new(Vec::new()),
            bank_balance: AtomicI64::new(0),
            snapshots,
            audit,
        }
    }

    /// Position of `id` in an id-sorted account slice
    ///
    /// Takes the slice the caller already holds under the ledger lock and
    /// never locks anything itself.
    pub fn lookup(accounts: &[Account], id: AccountId) -> Result<usize, BankError> {
        accounts
            .binary_search_by_key(&id, Account::id)
            .map_err(|_| BankError::account_not_found(id))
    }

    /// Open a new account
    pub fn create_account(
        &self,
        atm: AtmId,
        id: AccountId,
        password: &str,
        initial_balance: Balance,
    ) -> Result<(), BankError> {
        let result = {
            let mut accounts = self.accounts.write();
            match accounts.binary_search_by_key(&id, Account::id) {
                Ok(_) => Err(BankError::account_exists(id)),
                Err(position) => {
                    accounts.insert(position, Account::new(id, password, initial_balance));
                    Ok(())
                }
            }
        };

        self.audit_outcome(atm, &result, |_| AuditEvent::AccountOpened {
            atm,
            account: id,
            password: password.to_string(),
            initial_balance,
        });
        result
    }

    /// Remove an account; returns its final balance
    pub fn delete_account(
        &self,
        atm: AtmId,
        id: AccountId,
        password: &str,
    ) -> Result<Balance, BankError> {
        let result = {
            let mut accounts = self.accounts.write();
            Self::lookup(&accounts, id).and_then(|index| {
                let balance = accounts[index].get_balance(password)?;
                accounts.remove(index);
                Ok(balance)
            })
        };

        self.audit_outcome(atm, &result, |balance| AuditEvent::AccountClosed {
            atm,
            account: id,
            balance: *balance,
        });
        result
    }

    /// Credit an account; returns the new balance
    pub fn deposit(
        &self,
        atm: AtmId,
        id: AccountId,
        password: &str,
        amount: Amount,
    ) -> Result<Balance, BankError> {
        let result = self.with_account(id, |account| account.deposit(amount, password));

        self.audit_outcome(atm, &result, |balance| AuditEvent::Deposited {
            atm,
            account: id,
            amount,
            balance: *balance,
        });
        result
    }

    /// Debit an account; returns the new balance
    pub fn withdraw(
        &self,
        atm: AtmId,
        id: AccountId,
        password: &str,
        amount: Amount,
    ) -> Result<Balance, BankError> {
        let result = self.with_account(id, |account| account.withdraw(amount, password));

        self.audit_outcome(atm, &result, |balance| AuditEvent::Withdrew {
            atm,
            account: id,
            amount,
            balance: *balance,
        });
        result
    }

    /// Read an account's balance
    pub fn get_balance(
        &self,
        atm: AtmId,
        id: AccountId,
        password: &str,
    ) -> Result<Balance, BankError> {
        let result = self.with_account(id, |account| account.get_balance(password));

        self.audit_outcome(atm, &result, |balance| AuditEvent::BalanceRead {
            atm,
            account: id,
            balance: *balance,
        });
        result
    }

    /// Move `amount` from `source` to `target`
    ///
    /// Both account write locks are taken lower id first, whatever the
    /// request direction. Neither balance changes unless the source can be
    /// debited and the target can be credited.
    pub fn transfer(
        &self,
        atm: AtmId,
        source: AccountId,
        password: &str,
        target: AccountId,
        amount: Amount,
    ) -> Result<TransferReceipt, BankError> {
        let result = {
            let accounts = self.accounts.read();
            Self::transfer_locked(&accounts, source, password, target, amount)
        };

        self.audit_outcome(atm, &result, |receipt| AuditEvent::Transferred {
            atm,
            source,
            target,
            amount,
            source_balance: receipt.source_balance,
            target_balance: receipt.target_balance,
        });
        result
    }

    fn transfer_locked(
        accounts: &[Account],
        source: AccountId,
        password: &str,
        target: AccountId,
        amount: Amount,
    ) -> Result<TransferReceipt, BankError> {
        let source_index = Self::lookup(accounts, source)?;
        let target_index = Self::lookup(accounts, target)
            .map_err(|_| BankError::target_account_not_found(target))?;

        let source_account = &accounts[source_index];
        let target_account = &accounts[target_index];

        if !source_account.check_password(password) {
            return Err(BankError::wrong_password(source));
        }

        if source_index == target_index {
            return source_account.write_locked(|account| {
                if account.balance() < amount {
                    return Err(BankError::insufficient_funds(source, account.balance(), amount));
                }
                Ok(TransferReceipt {
                    source_balance: account.balance(),
                    target_balance: account.balance(),
                })
            });
        }

        let (first, second) = if source_account.id() < target_account.id() {
            (source_account, target_account)
        } else {
            (target_account, source_account)
        };
        let mut first_guard = first.lock_write();
        let mut second_guard = second.lock_write();

        let (source_guard, target_guard) = if first.id() == source {
            (&mut first_guard, &mut second_guard)
        } else {
            (&mut second_guard, &mut first_guard)
        };

        // Both sides are checked before either balance is written
        let result = source_guard.debited(amount).and_then(|source_balance| {
            let target_balance = target_guard.credited(amount)?;
            source_guard.commit(source_balance);
            target_guard.commit(target_balance);
            Ok(TransferReceipt {
                source_balance,
                target_balance,
            })
        });

        // Release in reverse acquisition order
        drop(second_guard);
        drop(first_guard);
        result
    }

    /// Charge `percent`% commission on every account
    ///
    /// Each account is charged under its own write lock. The total is added
    /// to the bank's own balance and returned.
    pub fn charge_commission(&self, percent: u32) -> Amount {
        let charged: Vec<(AccountId, Amount)> = {
            let accounts = self.accounts.read();
            accounts
                .iter()
                .map(|account| (account.id(), account.commission(percent)))
                .collect()
        };

        let total: Amount = charged
            .iter()
            .fold(0, |total, (_, amount)| total.saturating_add(*amount));
        self.bank_balance.fetch_add(total, Ordering::SeqCst);

        for (account, amount) in charged {
            self.audit.record(AuditEvent::CommissionCharged {
                percent,
                account,
                amount,
            });
        }
        total
    }

    /// Commission collected so far
    pub fn bank_balance(&self) -> Balance {
        self.bank_balance.load(Ordering::SeqCst)
    }

    /// Consistent value copy of every account
    ///
    /// Every account's read lock is held (ascending id order) until the copy
    /// completes, so no transfer can be observed half applied.
    pub fn capture_snapshot(&self) -> BankSnapshot {
        let accounts = self.accounts.read();
        let balances: Vec<_> = accounts.iter().map(Account::lock_read).collect();

        BankSnapshot {
            accounts: accounts
                .iter()
                .zip(&balances)
                .map(|(account, balance)| account.snapshot_with(**balance))
                .collect(),
        }
    }

    /// Capture a snapshot and append it to the history as a new generation
    pub fn save_snapshot(&self) -> Arc<BankSnapshot> {
        let snapshot = self.capture_snapshot();
        self.snapshots.push(snapshot)
    }

    /// Number of snapshot generations currently stored
    pub fn snapshot_generations(&self) -> usize {
        self.snapshots.len()
    }

    /// Replace the live accounts with the snapshot `generations` back
    ///
    /// The swap happens under the ledger write lock. Asking for more
    /// generations than stored (or zero) changes nothing and is reported.
    pub fn rollback(&self, atm: AtmId, generations: usize) -> Result<(), CommandError> {
        let result = self
            .snapshots
            .generations_back(generations)
            .map_err(|available| CommandError::RollbackUnavailable {
                requested: generations,
                available,
            })
            .map(|snapshot| {
                let restored: Vec<Account> =
                    snapshot.accounts.iter().map(Account::from_snapshot).collect();
                *self.accounts.write() = restored;
            });

        match &result {
            Ok(()) => self.audit.record(AuditEvent::RolledBack { atm, generations }),
            Err(error) => self.audit.record(AuditEvent::rejected(atm, error.clone())),
        }
        result
    }

    /// Number of open accounts
    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }

    fn with_account<T>(
        &self,
        id: AccountId,
        operation: impl FnOnce(&Account) -> Result<T, BankError>,
    ) -> Result<T, BankError> {
        let accounts = self.accounts.read();
        let index = Self::lookup(&accounts, id)?;
        operation(&accounts[index])
    }

    fn audit_outcome<T>(
        &self,
        atm: AtmId,
        result: &Result<T, BankError>,
        on_success: impl FnOnce(&T) -> AuditEvent,
    ) {
        let event = match result {
            Ok(value) => on_success(value),
            Err(error) => AuditEvent::rejected(atm, error.clone()),
        };
        self.audit.record(event);
    }
}
