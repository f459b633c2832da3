//! Error types for the ATM bank engine
//!
//! This module defines every error the engine can produce.
//!
//! # Error Categories
//!
//! - **Domain outcomes** ([`BankError`]): account exists, account not found, wrong
//!   password, insufficient funds, target account not found, balance overflow.
//!   Always audited,
//!   never fatal, each with a stable numeric [`ResultCode`].
//! - **Command failures** ([`CommandError`]): a domain outcome, or a failed
//!   close-ATM / rollback request.
//! - **Input errors** ([`ParseError`]): malformed command lines. The line is
//!   skipped and processing continues.
//! - **Fatal errors** ([`EngineError`]): missing input files, I/O failures,
//!   runtime construction failures. These stop the process.

use super::account::{AccountId, Amount, Balance};
use super::command::AtmId;
use thiserror::Error;

/// Stable numeric result code of an account or ledger operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ResultCode {
    Success = 0,
    AccountExists = -1,
    AccountNotFound = -2,
    WrongPassword = -3,
    InsufficientFunds = -4,
    TargetAccountNotFound = -5,
    BalanceOverflow = -6,
}

impl ResultCode {
    /// Result code of an operation outcome (`Success` for `Ok`)
    pub fn of<T>(result: &Result<T, BankError>) -> Self {
        match result {
            Ok(_) => ResultCode::Success,
            Err(error) => error.result_code(),
        }
    }

    /// The numeric value of this code
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Domain outcome of an account or ledger operation
///
/// The Display text is the reason shown in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    /// An account with this id already exists
    #[error("account with the same id exists")]
    AccountExists {
        /// Requested account id
        account: AccountId,
    },

    /// The (source) account does not exist
    #[error("account id {account} does not exist")]
    AccountNotFound {
        /// Requested account id
        account: AccountId,
    },

    /// Password did not match the stored one
    #[error("password for account id {account} is incorrect")]
    WrongPassword {
        /// Account whose password was checked
        account: AccountId,
    },

    /// Balance is lower than the requested amount; nothing was changed
    #[error("account id {account} balance is lower than {requested}")]
    InsufficientFunds {
        /// Account that was debited
        account: AccountId,
        /// Balance at the time of the check
        balance: Balance,
        /// Requested amount
        requested: Amount,
    },

    /// The target account of a transfer does not exist
    #[error("account id {account} does not exist")]
    TargetAccountNotFound {
        /// Requested target account id
        account: AccountId,
    },

    /// Crediting the amount would overflow the balance; nothing was changed
    #[error("account id {account} balance cannot hold another {requested}")]
    BalanceOverflow {
        /// Account that would be credited
        account: AccountId,
        /// Requested amount
        requested: Amount,
    },
}

impl BankError {
    /// Stable result code of this outcome
    pub fn result_code(&self) -> ResultCode {
        match self {
            BankError::AccountExists { .. } => ResultCode::AccountExists,
            BankError::AccountNotFound { .. } => ResultCode::AccountNotFound,
            BankError::WrongPassword { .. } => ResultCode::WrongPassword,
            BankError::InsufficientFunds { .. } => ResultCode::InsufficientFunds,
            BankError::TargetAccountNotFound { .. } => ResultCode::TargetAccountNotFound,
            BankError::BalanceOverflow { .. } => ResultCode::BalanceOverflow,
        }
    }

    /// Numeric value of [`Self::result_code`]
    pub fn code(&self) -> i32 {
        self.result_code().code()
    }

    /// Create an AccountExists error
    pub fn account_exists(account: AccountId) -> Self {
        BankError::AccountExists { account }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: AccountId) -> Self {
        BankError::AccountNotFound { account }
    }

    /// Create a WrongPassword error
    pub fn wrong_password(account: AccountId) -> Self {
        BankError::WrongPassword { account }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, balance: Balance, requested: Amount) -> Self {
        BankError::InsufficientFunds {
            account,
            balance,
            requested,
        }
    }

    /// Create a TargetAccountNotFound error
    pub fn target_account_not_found(account: AccountId) -> Self {
        BankError::TargetAccountNotFound { account }
    }

    /// Create a BalanceOverflow error
    pub fn balance_overflow(account: AccountId, requested: Amount) -> Self {
        BankError::BalanceOverflow { account, requested }
    }
}

/// Failure of a dispatched command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Account or ledger operation failed
    #[error(transparent)]
    Bank(#[from] BankError),

    /// Close-ATM target is not a registered stream
    #[error("ATM ID {atm} does not exist")]
    AtmNotFound {
        /// Requested target ATM
        atm: AtmId,
    },

    /// Close-ATM target was already closed
    #[error("ATM ID {atm} is already in a closed state")]
    AtmAlreadyClosed {
        /// Requested target ATM
        atm: AtmId,
    },

    /// Not enough snapshot generations stored for the requested rollback
    #[error("rollback to {requested} bank iterations ago is not available ({available} stored)")]
    RollbackUnavailable {
        /// Requested number of generations
        requested: usize,
        /// Generations currently stored
        available: usize,
    },
}

/// Malformed command line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Line contains no tokens
    #[error("empty command line")]
    Empty,

    /// First token does not name a known operation
    #[error("unknown operation '{token}'")]
    UnknownOperation {
        /// The offending token
        token: String,
    },

    /// An operand required by the operation is missing
    #[error("{operation} command is missing its {operand}")]
    MissingOperand {
        /// Operation name
        operation: &'static str,
        /// Name of the missing operand
        operand: &'static str,
    },

    /// An operand is not a valid non-negative integer
    #[error("invalid {field} '{value}'")]
    InvalidNumber {
        /// Name of the operand
        field: &'static str,
        /// The offending text
        value: String,
    },

    /// VIP marker carries a priority outside 1..=100
    #[error("invalid VIP priority '{value}'")]
    InvalidPriority {
        /// The offending text
        value: String,
    },
}

impl ParseError {
    /// Create a MissingOperand error
    pub fn missing_operand(operation: &'static str, operand: &'static str) -> Self {
        ParseError::MissingOperand { operation, operand }
    }

    /// Create an InvalidNumber error
    pub fn invalid_number(field: &'static str, value: &str) -> Self {
        ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        }
    }
}

/// Fatal error that stops the engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// An ATM command file does not exist
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error while opening or reading a file
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// The async runtime could not be created
    #[error("Failed to create runtime: {message}")]
    Runtime {
        /// Description of the failure
        message: String,
    },

    /// A worker task panicked or was aborted
    #[error("Worker task failed: {message}")]
    TaskFailed {
        /// Description of the failure
        message: String,
    },
}

impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(error: tokio::task::JoinError) -> Self {
        EngineError::TaskFailed {
            message: error.to_string(),
        }
    }
}
