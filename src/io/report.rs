//! Human and machine readable views of a bank snapshot
//!
//! - [`render_status`] builds the live status screen text
//! - [`write_accounts_csv`] writes the final account table as CSV
//!
//! Both are pure over a [`BankSnapshot`]; neither touches the live bank.

use crate::types::BankSnapshot;
use std::fmt::Write as _;
use std::io::Write;

/// ANSI sequence clearing the terminal and homing the cursor
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";

/// Status screen text for `snapshot`
pub fn render_status(snapshot: &BankSnapshot) -> String {
    let mut screen = String::from("Current Bank Status\n");
    for account in &snapshot.accounts {
        // Writing into a String cannot fail
        let _ = writeln!(
            screen,
            "Account {}: Balance - {} $, Account Password - {}",
            account.id, account.balance, account.password
        );
    }
    screen
}

/// Write the account table as CSV
///
/// Columns: account, balance, password. Rows follow the snapshot order,
/// which is ascending account id.
///
/// # Arguments
///
/// * `snapshot` - Accounts to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Errors
///
/// Returns an error message if serialization or flushing fails.
pub fn write_accounts_csv(snapshot: &BankSnapshot, output: &mut dyn Write) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    if snapshot.accounts.is_empty() {
        writer
            .write_record(["account", "balance", "password"])
            .map_err(|e| format!("Failed to write CSV header: {}", e))?;
    }

    for account in &snapshot.accounts {
        writer
            .serialize(account)
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
