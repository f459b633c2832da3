//! Core traits at the engine's seams
//!
//! These traits decouple the bank from its audit sink and the scheduler
//! from the component that actually runs a command, so either side can be
//! replaced (file vs. in-memory audit, router vs. recording executor).

use crate::types::{AtmId, AuditEvent, Command, CommandError};

/// Append-only destination for audit events
///
/// Called concurrently from every worker; implementations serialize writes
/// internally.
pub trait AuditSink: Send + Sync {
    /// Record one event
    fn record(&self, event: AuditEvent);
}

/// Runs one command to completion on behalf of an ATM
pub trait CommandExecutor: Send + Sync {
    /// Execute `command` once; the outcome is final for this attempt
    fn execute(&self, atm: AtmId, command: &Command) -> Result<(), CommandError>;
}
