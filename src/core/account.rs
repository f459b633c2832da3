//! Lockable account with a readers-writer balance lock
//!
//! Each [`Account`] guards its balance with its own `parking_lot::RwLock`.
//! Any number of readers may hold the lock together; a writer is exclusive.
//! `parking_lot`'s lock is eventually fair, so a writer queued behind a
//! stream of readers is not starved.
//!
//! # Lock protocol
//!
//! - [`Account::read_locked`] / [`Account::write_locked`] run a closure while the
//!   lock is held. The guard is released on every exit path, including early
//!   returns and panics.
//! - [`Account::lock_write`] hands out an [`AccountWriteGuard`] for callers that
//!   must hold several account locks at once (transfers). The unlocked
//!   mutation primitives `deposit_without_lock` / `withdraw_without_lock` only
//!   exist on that guard, so they cannot be called without holding the lock.
//!
//! The id and password are immutable after creation and need no lock.

use crate::types::{AccountId, AccountSnapshot, Amount, Balance, BankError};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A single bank account
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    password: String,
    balance: RwLock<Balance>,
}

/// Exclusive access to one account's balance
///
/// Dropping the guard releases the account's write lock.
#[derive(Debug)]
pub struct AccountWriteGuard<'a> {
    id: AccountId,
    balance: RwLockWriteGuard<'a, Balance>,
}

impl AccountWriteGuard<'_> {
    /// The id of the locked account
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Current balance
    pub fn balance(&self) -> Balance {
        *self.balance
    }

    /// Balance after crediting `amount`, without applying it
    ///
    /// # Errors
    ///
    /// `BalanceOverflow` when the result does not fit in a [`Balance`].
    pub fn credited(&self, amount: Amount) -> Result<Balance, BankError> {
        self.balance
            .checked_add(amount)
            .ok_or_else(|| BankError::balance_overflow(self.id, amount))
    }

    /// Balance after debiting `amount`, without applying it
    ///
    /// # Errors
    ///
    /// `InsufficientFunds` when `amount` exceeds the balance.
    pub fn debited(&self, amount: Amount) -> Result<Balance, BankError> {
        if *self.balance < amount {
            return Err(BankError::insufficient_funds(self.id, *self.balance, amount));
        }
        Ok(*self.balance - amount)
    }

    /// Credit the account; returns the new balance
    ///
    /// Leaves the balance untouched and returns `BalanceOverflow` when the
    /// credit does not fit.
    pub fn deposit_without_lock(&mut self, amount: Amount) -> Result<Balance, BankError> {
        let balance = self.credited(amount)?;
        *self.balance = balance;
        Ok(balance)
    }

    /// Debit the account; returns the new balance
    ///
    /// Leaves the balance untouched and returns `InsufficientFunds` when
    /// `amount` exceeds it.
    pub fn withdraw_without_lock(&mut self, amount: Amount) -> Result<Balance, BankError> {
        let balance = self.debited(amount)?;
        *self.balance = balance;
        Ok(balance)
    }

    /// Store a balance computed by [`Self::credited`] or [`Self::debited`]
    pub(crate) fn commit(&mut self, balance: Balance) {
        *self.balance = balance;
    }
}

impl Account {
    pub fn new(id: AccountId, password: impl Into<String>, initial_balance: Balance) -> Self {
        Self {
            id,
            password: password.into(),
            balance: RwLock::new(initial_balance),
        }
    }

    /// Rebuild a live account from a snapshot copy
    pub fn from_snapshot(snapshot: &AccountSnapshot) -> Self {
        Self::new(snapshot.id, snapshot.password.clone(), snapshot.balance)
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn check_password(&self, password: &str) -> bool {
        self.password == password
    }

    /// Run `operation` with the balance read-locked
    pub fn read_locked<R>(&self, operation: impl FnOnce(Balance) -> R) -> R {
        let balance = self.balance.read();
        operation(*balance)
    }

    /// Run `operation` with the balance write-locked
    pub fn write_locked<R>(&self, operation: impl FnOnce(&mut AccountWriteGuard<'_>) -> R) -> R {
        let mut guard = self.lock_write();
        operation(&mut guard)
    }

    /// Acquire the write lock and keep it until the guard is dropped
    pub fn lock_write(&self) -> AccountWriteGuard<'_> {
        AccountWriteGuard {
            id: self.id,
            balance: self.balance.write(),
        }
    }

    /// Acquire the read lock and keep it until the guard is dropped
    pub(crate) fn lock_read(&self) -> RwLockReadGuard<'_, Balance> {
        self.balance.read()
    }

    /// Read the balance after checking the password
    pub fn get_balance(&self, password: &str) -> Result<Balance, BankError> {
        self.read_locked(|balance| {
            if !self.check_password(password) {
                return Err(BankError::wrong_password(self.id));
            }
            Ok(balance)
        })
    }

    /// Credit the account after checking the password; returns the new balance
    pub fn deposit(&self, amount: Amount, password: &str) -> Result<Balance, BankError> {
        self.write_locked(|account| {
            if !self.check_password(password) {
                return Err(BankError::wrong_password(self.id));
            }
            account.deposit_without_lock(amount)
        })
    }

    /// Debit the account after checking the password; returns the new balance
    pub fn withdraw(&self, amount: Amount, password: &str) -> Result<Balance, BankError> {
        self.write_locked(|account| {
            if !self.check_password(password) {
                return Err(BankError::wrong_password(self.id));
            }
            account.withdraw_without_lock(amount)
        })
    }

    /// Skim `percent`% of the balance (rounded half away from zero)
    ///
    /// Returns the amount taken.
    pub fn commission(&self, percent: u32) -> Amount {
        self.write_locked(|account| {
            let skim = commission_amount(account.balance(), percent);
            *account.balance -= skim;
            skim
        })
    }

    /// Value copy of this account, taken under the read lock
    pub fn snapshot(&self) -> AccountSnapshot {
        self.read_locked(|balance| self.snapshot_with(balance))
    }

    /// Value copy using a balance the caller read under this account's lock
    pub(crate) fn snapshot_with(&self, balance: Balance) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id,
            balance,
            password: self.password.clone(),
        }
    }
}

/// `round(balance * percent / 100)`, rounding half away from zero
pub fn commission_amount(balance: Balance, percent: u32) -> Amount {
    let scaled = i128::from(balance) * i128::from(percent);
    let magnitude = (scaled.abs() + 50) / 100;
    let skim = if scaled < 0 { -magnitude } else { magnitude };
    // |skim| <= |balance| for percent <= 100
    skim as Amount
}
