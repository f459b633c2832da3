//! Parsing of ATM command lines into typed [`Command`] values
//!
//! A line is a list of whitespace-separated tokens. The first letter of the
//! first token selects the operation; the remaining tokens are its operands.
//! Two markers may appear anywhere after the operation letter and are
//! stripped before the operands are read:
//!
//! - `VIP=<n>` classifies the command as VIP with priority `n` (1..=100)
//! - `PERSISTENT` classifies the command as persistent
//!
//! When both markers are present the VIP marker wins.

use crate::types::{Amount, Classification, Command, Operation, ParseError, Priority};
use std::str::FromStr;

const VIP_MARKER: &str = "VIP=";
const PERSISTENT_MARKER: &str = "PERSISTENT";
const MAX_PRIORITY: Priority = 100;

/// Parse one raw command line
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    parse_tokens(line.trim(), &tokens)
}

/// Parse an already tokenized command line
///
/// # Arguments
///
/// * `raw` - The original line, kept on the command for audit messages
/// * `tokens` - The line's tokens, markers included
pub fn parse_tokens(raw: &str, tokens: &[&str]) -> Result<Command, ParseError> {
    let mut vip = None;
    let mut persistent = false;
    let mut operands = Vec::with_capacity(tokens.len());

    for token in tokens {
        if let Some(priority) = token.strip_prefix(VIP_MARKER) {
            vip = Some(parse_priority(priority)?);
        } else if *token == PERSISTENT_MARKER {
            persistent = true;
        } else {
            operands.push(*token);
        }
    }

    let classification = match (vip, persistent) {
        (Some(priority), _) => Classification::Vip { priority },
        (None, true) => Classification::Persistent,
        (None, false) => Classification::Regular,
    };

    let operation = parse_operation(&operands)?;
    Ok(Command::new(raw, operation, classification))
}

fn parse_operation(tokens: &[&str]) -> Result<Operation, ParseError> {
    let (first, operands) = tokens.split_first().ok_or(ParseError::Empty)?;
    let mut operands = Operands {
        tokens: operands.iter(),
        operation: "",
    };

    let operation = match first.chars().next() {
        Some('O') => {
            operands.operation = "open";
            Operation::Open {
                account: operands.number("account")?,
                password: operands.text("password")?,
                initial_balance: operands.amount("initial balance")?,
            }
        }
        Some('D') => {
            operands.operation = "deposit";
            Operation::Deposit {
                account: operands.number("account")?,
                password: operands.text("password")?,
                amount: operands.amount("amount")?,
            }
        }
        Some('W') => {
            operands.operation = "withdraw";
            Operation::Withdraw {
                account: operands.number("account")?,
                password: operands.text("password")?,
                amount: operands.amount("amount")?,
            }
        }
        Some('B') => {
            operands.operation = "balance";
            Operation::Balance {
                account: operands.number("account")?,
                password: operands.text("password")?,
            }
        }
        Some('Q') => {
            operands.operation = "delete";
            Operation::Delete {
                account: operands.number("account")?,
                password: operands.text("password")?,
            }
        }
        Some('T') => {
            operands.operation = "transfer";
            Operation::Transfer {
                account: operands.number("account")?,
                password: operands.text("password")?,
                target: operands.number("target account")?,
                amount: operands.amount("amount")?,
            }
        }
        Some('C') => {
            operands.operation = "close";
            Operation::CloseAtm {
                target: operands.number("target ATM")?,
            }
        }
        Some('R') => {
            operands.operation = "rollback";
            Operation::Rollback {
                iterations: operands.number("iterations")?,
            }
        }
        _ => {
            return Err(ParseError::UnknownOperation {
                token: first.to_string(),
            })
        }
    };

    Ok(operation)
}

fn parse_priority(value: &str) -> Result<Priority, ParseError> {
    match value.parse::<Priority>() {
        Ok(priority) if (1..=MAX_PRIORITY).contains(&priority) => Ok(priority),
        _ => Err(ParseError::InvalidPriority {
            value: value.to_string(),
        }),
    }
}

/// Cursor over the operand tokens of one operation
struct Operands<'a, 'b> {
    tokens: std::slice::Iter<'b, &'a str>,
    operation: &'static str,
}

impl<'a> Operands<'a, '_> {
    fn next(&mut self, operand: &'static str) -> Result<&'a str, ParseError> {
        self.tokens
            .next()
            .copied()
            .ok_or_else(|| ParseError::missing_operand(self.operation, operand))
    }

    fn text(&mut self, operand: &'static str) -> Result<String, ParseError> {
        self.next(operand).map(str::to_string)
    }

    fn number<T: FromStr>(&mut self, operand: &'static str) -> Result<T, ParseError> {
        let value = self.next(operand)?;
        value
            .parse()
            .map_err(|_| ParseError::invalid_number(operand, value))
    }

    /// Non-negative integer amount
    fn amount(&mut self, operand: &'static str) -> Result<Amount, ParseError> {
        let value = self.next(operand)?;
        match value.parse::<Amount>() {
            Ok(amount) if amount >= 0 => Ok(amount),
            _ => Err(ParseError::invalid_number(operand, value)),
        }
    }
}
