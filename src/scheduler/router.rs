//! Command routing by classification
//!
//! # Design
//!
//! [`CommandRouter::route`] applies the execution policy of a command's
//! [`Classification`]:
//!
//! ```text
//! Regular     -> execute once, outcome is final
//! Vip(p)      -> push onto the VipQueue, a scheduler worker executes it
//! Persistent  -> execute, retry up to RetryPolicy::max_retries times with a
//!                fixed delay, audit a give-up line when still failing
//! ```
//!
//! [`CommandRouter::execute`] maps an [`Operation`] onto the bank or the ATM
//! registry. It is also the [`CommandExecutor`] the VIP workers run.
//!
//! # Thread Safety
//!
//! The router is a bundle of `Arc`s and is cloned into every ATM task.
//! Retry delays block the calling thread, so `route` must run on a blocking
//! thread when called from async code.

use super::priority_queue::VipQueue;
use crate::core::{AtmRegistry, AuditSink, Bank, CommandExecutor};
use crate::types::{AtmId, AuditEvent, Classification, Command, CommandError, Operation};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Bounded retry for persistent commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: usize,
    /// Pause between two attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(1),
        }
    }
}

/// A persistent command that kept failing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetriesExhausted {
    pub attempts: usize,
    pub last_error: CommandError,
}

impl RetryPolicy {
    /// Total attempts including the first one
    pub fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }

    /// Call `attempt` until it succeeds or the attempts run out
    ///
    /// # Returns
    ///
    /// The number of attempts used on success, or the last error together
    /// with the attempt count.
    pub fn run(
        &self,
        mut attempt: impl FnMut() -> Result<(), CommandError>,
    ) -> Result<usize, RetriesExhausted> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match attempt() {
                Ok(()) => return Ok(attempts),
                Err(last_error) if attempts >= self.max_attempts() => {
                    return Err(RetriesExhausted {
                        attempts,
                        last_error,
                    })
                }
                Err(error) => {
                    tracing::debug!(attempts, %error, "Persistent attempt failed, retrying");
                    thread::sleep(self.delay);
                }
            }
        }
    }
}

/// Terminal state of a routed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Executed; carries the final result
    Completed(Result<(), CommandError>),
    /// Handed to the priority scheduler
    Queued,
    /// Persistent command still failing after every attempt
    FailedAfterRetries(RetriesExhausted),
}

/// Classifies commands and dispatches them to the bank
#[derive(Clone)]
pub struct CommandRouter {
    bank: Arc<Bank>,
    registry: Arc<AtmRegistry>,
    queue: Arc<VipQueue>,
    audit: Arc<dyn AuditSink>,
    retry: RetryPolicy,
}

impl CommandRouter {
    pub fn new(
        bank: Arc<Bank>,
        registry: Arc<AtmRegistry>,
        queue: Arc<VipQueue>,
        audit: Arc<dyn AuditSink>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            bank,
            registry,
            queue,
            audit,
            retry,
        }
    }

    /// Apply the execution policy of `command` on behalf of `atm`
    pub fn route(&self, atm: AtmId, command: Command) -> RouteOutcome {
        match command.classification {
            Classification::Vip { priority } => {
                tracing::debug!(atm, priority, command = %command.raw, "Queued VIP command");
                self.queue.push(atm, priority, command);
                RouteOutcome::Queued
            }
            Classification::Persistent => match self.retry.run(|| self.execute(atm, &command)) {
                Ok(_) => RouteOutcome::Completed(Ok(())),
                Err(exhausted) => {
                    tracing::warn!(
                        atm,
                        attempts = exhausted.attempts,
                        command = %command.raw,
                        "Persistent command gave up"
                    );
                    self.audit.record(AuditEvent::PersistentGaveUp {
                        atm,
                        attempts: exhausted.attempts,
                        command: command.raw.clone(),
                    });
                    RouteOutcome::FailedAfterRetries(exhausted)
                }
            },
            Classification::Regular => RouteOutcome::Completed(self.execute(atm, &command)),
        }
    }

    fn close_atm(&self, source: AtmId, target: AtmId) -> Result<(), CommandError> {
        let result = self.registry.close(source, target);
        let event = match &result {
            Ok(()) => AuditEvent::AtmClosed { source, target },
            Err(error) => AuditEvent::rejected(source, error.clone()),
        };
        self.audit.record(event);
        result
    }
}

impl CommandExecutor for CommandRouter {
    fn execute(&self, atm: AtmId, command: &Command) -> Result<(), CommandError> {
        match &command.operation {
            Operation::Open {
                account,
                password,
                initial_balance,
            } => self.bank.create_account(atm, *account, password, *initial_balance)?,
            Operation::Deposit {
                account,
                password,
                amount,
            } => {
                self.bank.deposit(atm, *account, password, *amount)?;
            }
            Operation::Withdraw {
                account,
                password,
                amount,
            } => {
                self.bank.withdraw(atm, *account, password, *amount)?;
            }
            Operation::Balance { account, password } => {
                self.bank.get_balance(atm, *account, password)?;
            }
            Operation::Delete { account, password } => {
                self.bank.delete_account(atm, *account, password)?;
            }
            Operation::Transfer {
                account,
                password,
                target,
                amount,
            } => {
                self.bank.transfer(atm, *account, password, *target, *amount)?;
            }
            Operation::CloseAtm { target } => self.close_atm(atm, *target)?,
            Operation::Rollback { iterations } => self.bank.rollback(atm, *iterations)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::audit::MemoryAuditLog;
    use crate::io::command_parser::parse_command;
    use crate::types::BankError;
    use std::cell::Cell;

    struct Fixture {
        bank: Arc<Bank>,
        registry: Arc<AtmRegistry>,
        queue: Arc<VipQueue>,
        audit: Arc<MemoryAuditLog>,
        router: CommandRouter,
    }

    fn fixture() -> Fixture {
        let audit = Arc::new(MemoryAuditLog::new());
        let bank = Arc::new(Bank::new(audit.clone()));
        let registry = Arc::new(AtmRegistry::new());
        registry.register(1, "a.txt");
        registry.register(2, "b.txt");
        let queue = Arc::new(VipQueue::new());
        let retry = RetryPolicy {
            max_retries: 2,
            delay: Duration::from_millis(1),
        };
        let router = CommandRouter::new(
            Arc::clone(&bank),
            Arc::clone(&registry),
            Arc::clone(&queue),
            audit.clone(),
            retry,
        );
        Fixture {
            bank,
            registry,
            queue,
            audit,
            router,
        }
    }

    fn route(fixture: &Fixture, atm: AtmId, line: &str) -> RouteOutcome {
        fixture.router.route(atm, parse_command(line).unwrap())
    }

    #[test]
    fn test_regular_commands_execute_once() {
        let f = fixture();

        assert_eq!(route(&f, 1, "O 1 pw 100"), RouteOutcome::Completed(Ok(())));
        assert_eq!(
            route(&f, 1, "W 1 pw 150"),
            RouteOutcome::Completed(Err(BankError::insufficient_funds(1, 100, 150).into()))
        );
        assert_eq!(route(&f, 1, "T 1 pw 1 40"), RouteOutcome::Completed(Ok(())));
        assert_eq!(f.audit.len(), 3);
    }

    #[test]
    fn test_every_operation_reaches_the_bank() {
        let f = fixture();

        for line in ["O 1 a 100", "O 2 b 0", "D 1 a 10", "W 1 a 5", "B 1 a", "T 1 a 2 30"] {
            assert_eq!(route(&f, 1, line), RouteOutcome::Completed(Ok(())));
        }
        let snapshot = f.bank.capture_snapshot();
        assert_eq!(snapshot.balance_of(1), Some(75));
        assert_eq!(snapshot.balance_of(2), Some(30));

        f.bank.save_snapshot();
        assert_eq!(route(&f, 1, "Q 2 b"), RouteOutcome::Completed(Ok(())));
        assert_eq!(f.bank.account_count(), 1);
        assert_eq!(route(&f, 1, "R 1"), RouteOutcome::Completed(Ok(())));
        assert_eq!(f.bank.account_count(), 2);
    }

    #[test]
    fn test_vip_commands_are_queued_not_executed() {
        let f = fixture();

        assert_eq!(route(&f, 2, "O 1 pw 100 VIP=40"), RouteOutcome::Queued);
        assert_eq!(f.queue.len(), 1);
        assert_eq!(f.bank.account_count(), 0);

        let entry = f.queue.pop().unwrap();
        assert_eq!((entry.atm, entry.priority), (2, 40));
        assert_eq!(f.router.execute(entry.atm, &entry.command), Ok(()));
        f.queue.complete();
        assert_eq!(f.bank.account_count(), 1);
    }

    #[test]
    fn test_vip_takes_precedence_over_persistent() {
        let f = fixture();

        assert_eq!(route(&f, 1, "W 9 pw 1 PERSISTENT VIP=3"), RouteOutcome::Queued);
        assert!(f.audit.is_empty());
    }

    #[test]
    fn test_persistent_gives_up_after_three_attempts() {
        let f = fixture();

        let outcome = route(&f, 1, "W 7 pw 10 PERSISTENT");

        assert_eq!(
            outcome,
            RouteOutcome::FailedAfterRetries(RetriesExhausted {
                attempts: 3,
                last_error: BankError::account_not_found(7).into(),
            })
        );
        let lines = f.audit.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[3],
            "Error 1: Persistent command failed after 3 attempts: W 7 pw 10 PERSISTENT"
        );
    }

    #[test]
    fn test_persistent_success_needs_no_retry() {
        let f = fixture();
        route(&f, 1, "O 1 pw 5");

        assert_eq!(route(&f, 1, "D 1 pw 5 PERSISTENT"), RouteOutcome::Completed(Ok(())));
        assert_eq!(f.audit.len(), 2);
    }

    #[test]
    fn test_retry_policy_stops_at_first_success() {
        let policy = RetryPolicy {
            max_retries: 2,
            delay: Duration::ZERO,
        };
        let calls = Cell::new(0);

        let result = policy.run(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 2 {
                Err(CommandError::AtmNotFound { atm: 3 })
            } else {
                Ok(())
            }
        });

        assert_eq!(result, Ok(2));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_retry_policy_without_retries() {
        let policy = RetryPolicy {
            max_retries: 0,
            delay: Duration::ZERO,
        };

        let result = policy.run(|| Err(CommandError::AtmNotFound { atm: 3 }));

        assert_eq!(
            result,
            Err(RetriesExhausted {
                attempts: 1,
                last_error: CommandError::AtmNotFound { atm: 3 },
            })
        );
    }

    #[test]
    fn test_close_atm() {
        let f = fixture();

        assert_eq!(route(&f, 1, "C 2"), RouteOutcome::Completed(Ok(())));
        assert!(f.registry.should_terminate(2));
        assert_eq!(
            route(&f, 1, "C 2"),
            RouteOutcome::Completed(Err(CommandError::AtmAlreadyClosed { atm: 2 }))
        );
        assert_eq!(
            route(&f, 1, "C 9"),
            RouteOutcome::Completed(Err(CommandError::AtmNotFound { atm: 9 }))
        );
        assert_eq!(
            f.audit.lines(),
            vec![
                "Bank: ATM 1 closed 2 successfully",
                "Error 1: Your close operation failed - ATM ID 2 is already in a closed state",
                "Error 1: Your transaction failed - ATM ID 9 does not exist",
            ]
        );
    }

    #[test]
    fn test_rollback_beyond_history_is_reported() {
        let f = fixture();

        assert_eq!(
            route(&f, 2, "R 3"),
            RouteOutcome::Completed(Err(CommandError::RollbackUnavailable {
                requested: 3,
                available: 0,
            }))
        );
    }
}
