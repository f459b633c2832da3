//! Audit trail formatting and sinks
//!
//! - [`format_line`] renders an [`AuditEvent`] as one line of text
//! - [`FileAuditLog`] appends lines to a log file
//! - [`MemoryAuditLog`] keeps events in memory (tests, benchmarks)
//!
//! Both sinks take a short-lived mutex per event, so callers never need to
//! hold a bank lock while recording.

use crate::core::AuditSink;
use crate::types::{AuditEvent, CommandError};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Render an event as a single audit line (without trailing newline)
pub fn format_line(event: &AuditEvent) -> String {
    match event {
        AuditEvent::AccountOpened {
            atm,
            account,
            password,
            initial_balance,
        } => format!(
            "{atm}: New account id is {account} with password {password} and initial balance {initial_balance}"
        ),
        AuditEvent::BalanceRead {
            atm,
            account,
            balance,
        } => format!("{atm}: Account {account} balance is {balance}"),
        AuditEvent::Deposited {
            atm,
            account,
            amount,
            balance,
        } => format!(
            "{atm}: Account {account} new balance is {balance} after {amount} $ was deposited"
        ),
        AuditEvent::Withdrew {
            atm,
            account,
            amount,
            balance,
        } => format!(
            "{atm}: Account {account} new balance is {balance} after {amount} $ was withdrew"
        ),
        AuditEvent::AccountClosed {
            atm,
            account,
            balance,
        } => format!("{atm}: Account {account} is now closed. Balance was {balance}"),
        AuditEvent::Transferred {
            atm,
            source,
            target,
            amount,
            source_balance,
            target_balance,
        } => format!(
            "{atm}: Transfer {amount} from account {source} to account {target} new account balance is {source_balance} new target account balance is {target_balance}"
        ),
        AuditEvent::CommissionCharged {
            percent,
            account,
            amount,
        } => format!(
            "Bank: commissions of {percent} % were charged, the bank gained {amount} $ from account {account}"
        ),
        AuditEvent::AtmClosed { source, target } => {
            format!("Bank: ATM {source} closed {target} successfully")
        }
        AuditEvent::RolledBack { atm, generations } => {
            format!("{atm}: Rollback to {generations} bank iterations ago was completed successfully")
        }
        AuditEvent::Rejected { atm, error } => {
            let kind = match error {
                CommandError::AtmAlreadyClosed { .. } => "close operation",
                _ => "transaction",
            };
            format!("Error {atm}: Your {kind} failed - {error}")
        }
        AuditEvent::PersistentGaveUp {
            atm,
            attempts,
            command,
        } => format!("Error {atm}: Persistent command failed after {attempts} attempts: {command}"),
    }
}

/// Audit sink appending one line per event to a file
#[derive(Debug)]
pub struct FileAuditLog {
    writer: Mutex<BufWriter<File>>,
}

impl FileAuditLog {
    /// Create (or truncate) the log file at `path`
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl AuditSink for FileAuditLog {
    fn record(&self, event: AuditEvent) {
        let line = format_line(&event);
        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            tracing::error!("Failed to write audit line: {e}");
        }
    }
}

/// Audit sink collecting events in memory
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far, in arrival order
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Every event rendered with [`format_line`]
    pub fn lines(&self) -> Vec<String> {
        self.events.lock().iter().map(format_line).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drop every recorded event
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BankError;
    use rstest::rstest;
    use std::fs;
    use tempfile::NamedTempFile;

    #[rstest]
    #[case::opened(
        AuditEvent::AccountOpened { atm: 1, account: 12, password: "1234".to_string(), initial_balance: 100 },
        "1: New account id is 12 with password 1234 and initial balance 100"
    )]
    #[case::balance(
        AuditEvent::BalanceRead { atm: 2, account: 12, balance: 80 },
        "2: Account 12 balance is 80"
    )]
    #[case::deposited(
        AuditEvent::Deposited { atm: 1, account: 12, amount: 50, balance: 150 },
        "1: Account 12 new balance is 150 after 50 $ was deposited"
    )]
    #[case::withdrew(
        AuditEvent::Withdrew { atm: 1, account: 12, amount: 20, balance: 130 },
        "1: Account 12 new balance is 130 after 20 $ was withdrew"
    )]
    #[case::closed(
        AuditEvent::AccountClosed { atm: 3, account: 12, balance: 130 },
        "3: Account 12 is now closed. Balance was 130"
    )]
    #[case::transferred(
        AuditEvent::Transferred { atm: 1, source: 1, target: 2, amount: 10, source_balance: 90, target_balance: 60 },
        "1: Transfer 10 from account 1 to account 2 new account balance is 90 new target account balance is 60"
    )]
    #[case::commission(
        AuditEvent::CommissionCharged { percent: 3, account: 7, amount: 9 },
        "Bank: commissions of 3 % were charged, the bank gained 9 $ from account 7"
    )]
    #[case::atm_closed(
        AuditEvent::AtmClosed { source: 1, target: 2 },
        "Bank: ATM 1 closed 2 successfully"
    )]
    #[case::rolled_back(
        AuditEvent::RolledBack { atm: 2, generations: 4 },
        "2: Rollback to 4 bank iterations ago was completed successfully"
    )]
    #[case::wrong_password(
        AuditEvent::rejected(1, BankError::wrong_password(12)),
        "Error 1: Your transaction failed - password for account id 12 is incorrect"
    )]
    #[case::already_closed(
        AuditEvent::rejected(1, CommandError::AtmAlreadyClosed { atm: 2 }),
        "Error 1: Your close operation failed - ATM ID 2 is already in a closed state"
    )]
    #[case::atm_not_found(
        AuditEvent::rejected(1, CommandError::AtmNotFound { atm: 5 }),
        "Error 1: Your transaction failed - ATM ID 5 does not exist"
    )]
    #[case::persistent(
        AuditEvent::PersistentGaveUp { atm: 1, attempts: 3, command: "W 1 pw 500 PERSISTENT".to_string() },
        "Error 1: Persistent command failed after 3 attempts: W 1 pw 500 PERSISTENT"
    )]
    fn test_format_line(#[case] event: AuditEvent, #[case] expected: &str) {
        assert_eq!(format_line(&event), expected);
    }

    #[test]
    fn test_memory_log_keeps_order() {
        let log = MemoryAuditLog::new();
        log.record(AuditEvent::AtmClosed { source: 1, target: 2 });
        log.record(AuditEvent::RolledBack { atm: 1, generations: 1 });

        assert_eq!(log.len(), 2);
        assert_eq!(
            log.lines(),
            vec![
                "Bank: ATM 1 closed 2 successfully".to_string(),
                "1: Rollback to 1 bank iterations ago was completed successfully".to_string(),
            ]
        );

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_file_log_appends_lines() {
        let file = NamedTempFile::new().unwrap();
        let log = FileAuditLog::create(file.path()).unwrap();

        log.record(AuditEvent::BalanceRead { atm: 1, account: 1, balance: 5 });
        log.record(AuditEvent::rejected(2, BankError::account_not_found(9)));

        let content = fs::read_to_string(file.path()).unwrap();
        assert_eq!(
            content,
            "1: Account 1 balance is 5\nError 2: Your transaction failed - account id 9 does not exist\n"
        );
    }
}
