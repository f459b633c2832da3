//! Engine orchestration
//!
//! # Architecture
//!
//! ```text
//! Engine::run
//!     ├── Bank (Arc)            shared ledger
//!     ├── AtmRegistry (Arc)     close flags + completion counter
//!     ├── VipQueue (Arc)
//!     ├── CommandRouter         cloned into every ATM task
//!     ├── ATM tasks             one per command file, sequential commands
//!     └── background tasks      VIP workers, commission ticker, status ticker
//! ```
//!
//! # Lifecycle
//!
//! 1. Every ATM file is checked before anything starts.
//! 2. Streams are registered as ATMs 1..=N in argument order; VIP workers
//!    and tickers start.
//! 3. Each ATM task paces itself, honours its close flag between commands
//!    and marks itself completed when it stops.
//! 4. Once every ATM completed, the engine waits for the VIP queue to become
//!    idle, then cancels the background tasks and joins them.
//! 5. The final account table is returned.
//!
//! All bank calls block on `parking_lot` locks (and persistent retries
//! sleep), so they run on tokio's blocking pool.

pub mod config;

pub use config::EngineConfig;

use crate::core::{AtmRegistry, AuditSink, Bank, SnapshotStore};
use crate::io::command_reader::CommandReader;
use crate::io::report::{render_status, CLEAR_SCREEN};
use crate::scheduler::{CommandRouter, PriorityScheduler, RouteOutcome, VipQueue};
use crate::types::{AtmId, Balance, BankSnapshot, EngineError};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Commission percentage range of one sweep
const COMMISSION_PERCENT: std::ops::RangeInclusive<u32> = 1..=5;

/// Outcome of a complete engine run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Final account table, ascending id
    pub accounts: BankSnapshot,
    /// Commission collected by the bank
    pub bank_balance: Balance,
    /// Number of ATM streams that ran to completion or were closed
    pub completed_atms: usize,
}

/// Runs a set of ATM command files against one shared bank
pub struct Engine {
    config: EngineConfig,
    audit: Arc<dyn AuditSink>,
}

impl Engine {
    /// Create an engine writing its audit trail to `audit`
    pub fn new(config: EngineConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            config: config.validated(),
            audit,
        }
    }

    /// Process every ATM file to completion
    ///
    /// Builds a multi-threaded tokio runtime sized by
    /// `EngineConfig::runtime_threads` and blocks until the run finishes.
    /// Must not be called from within an async context.
    ///
    /// # Errors
    ///
    /// - `FileNotFound` if any ATM file is missing (nothing is started)
    /// - `Runtime` if the tokio runtime cannot be built
    /// - `IoError` / `TaskFailed` if a stream cannot be read or a task panics
    pub fn run(&self, atm_files: &[PathBuf]) -> Result<RunReport, EngineError> {
        for path in atm_files {
            if !path.is_file() {
                return Err(EngineError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.runtime_threads)
            .enable_all()
            .build()
            .map_err(|e| EngineError::Runtime {
                message: e.to_string(),
            })?;

        runtime.block_on(self.run_streams(atm_files))
    }

    async fn run_streams(&self, atm_files: &[PathBuf]) -> Result<RunReport, EngineError> {
        let config = &self.config;
        let bank = Arc::new(Bank::with_snapshot_store(
            SnapshotStore::new(config.snapshot_capacity),
            Arc::clone(&self.audit),
        ));
        let registry = Arc::new(AtmRegistry::new());
        let queue = Arc::new(VipQueue::new());
        let router = CommandRouter::new(
            Arc::clone(&bank),
            Arc::clone(&registry),
            Arc::clone(&queue),
            Arc::clone(&self.audit),
            config.retry,
        );

        let streams: Vec<(AtmId, PathBuf)> = (1..).zip(atm_files.iter().cloned()).collect();
        for (atm, path) in &streams {
            registry.register(*atm, path.clone());
        }

        tracing::info!(
            atms = streams.len(),
            vip_workers = config.vip_workers,
            "Starting bank engine"
        );

        let cancel = CancellationToken::new();
        let mut background = JoinSet::new();
        PriorityScheduler::new(
            Arc::clone(&queue),
            Arc::new(router.clone()),
            config.vip_idle_poll,
        )
        .spawn_workers(config.vip_workers, &cancel, &mut background);
        background.spawn(commission_ticker(
            Arc::clone(&bank),
            config.commission_interval,
            cancel.clone(),
        ));
        background.spawn(status_ticker(
            Arc::clone(&bank),
            config.status_interval,
            config.live_status,
            cancel.clone(),
        ));

        let mut atms = JoinSet::new();
        for (atm, _) in streams {
            atms.spawn(run_atm(
                atm,
                router.clone(),
                Arc::clone(&registry),
                config.atm_pacing,
            ));
        }

        let mut failure = None;
        while let Some(joined) = atms.join_next().await {
            let result = joined.map_err(EngineError::from).and_then(|result| result);
            if let Err(e) = result {
                tracing::error!("ATM stream failed: {}", e);
                if failure.is_none() {
                    failure = Some(e);
                }
            }
        }
        if registry.all_completed() {
            tracing::info!(completed = registry.completed_count(), "All ATM streams finished");
        } else {
            tracing::warn!(
                completed = registry.completed_count(),
                registered = registry.len(),
                "ATM streams stopped without completing"
            );
        }

        while !queue.is_idle() {
            tokio::time::sleep(config.vip_idle_poll).await;
        }

        cancel.cancel();
        while let Some(joined) = background.join_next().await {
            joined?;
        }

        if let Some(e) = failure {
            return Err(e);
        }

        let accounts = bank.capture_snapshot();
        if config.live_status {
            print!("{}{}", CLEAR_SCREEN, render_status(&accounts));
        }
        tracing::info!(
            accounts = accounts.accounts.len(),
            bank_balance = bank.bank_balance(),
            "Bank engine stopped"
        );

        Ok(RunReport {
            accounts,
            bank_balance: bank.bank_balance(),
            completed_atms: registry.completed_count(),
        })
    }
}

/// Drive one ATM stream, always counting it as completed
async fn run_atm(
    atm: AtmId,
    router: CommandRouter,
    registry: Arc<AtmRegistry>,
    pacing: Duration,
) -> Result<(), EngineError> {
    let result = match registry.stream(atm) {
        Some(stream) => drive_atm(atm, &stream.path, router, &registry, pacing).await,
        None => Ok(()),
    };
    registry.mark_completed(atm);
    result
}

async fn drive_atm(
    atm: AtmId,
    path: &Path,
    router: CommandRouter,
    registry: &AtmRegistry,
    pacing: Duration,
) -> Result<(), EngineError> {
    let mut reader = CommandReader::open(path).await?;
    tracing::info!(atm, path = %path.display(), "ATM started");

    loop {
        if !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }

        if registry.should_terminate(atm) {
            tracing::info!(atm, "ATM closed, stopping");
            return Ok(());
        }

        let Some(command) = reader.next_command().await else {
            break;
        };

        tracing::debug!(atm, operation = command.operation.name(), "Dispatching command");
        let router = router.clone();
        let outcome = tokio::task::spawn_blocking(move || router.route(atm, command)).await?;
        match outcome {
            RouteOutcome::Completed(Ok(())) | RouteOutcome::Queued => {}
            RouteOutcome::Completed(Err(error)) => {
                tracing::debug!(atm, %error, "Command failed");
            }
            RouteOutcome::FailedAfterRetries(exhausted) => {
                tracing::debug!(atm, attempts = exhausted.attempts, "Persistent command exhausted");
            }
        }
    }

    tracing::info!(atm, "ATM finished its command file");
    Ok(())
}

/// Charge a random 1-5% commission on every account each period
async fn commission_ticker(bank: Arc<Bank>, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let percent: u32 = rand::rng().random_range(COMMISSION_PERCENT);
                let bank = Arc::clone(&bank);
                match tokio::task::spawn_blocking(move || bank.charge_commission(percent)).await {
                    Ok(total) => tracing::debug!(percent, total, "Commission charged"),
                    Err(e) => tracing::error!("Commission sweep failed: {}", e),
                }
            }
        }
    }
}

/// Capture one snapshot generation each period, optionally redrawing the
/// status screen
async fn status_ticker(
    bank: Arc<Bank>,
    period: Duration,
    live_status: bool,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let bank = Arc::clone(&bank);
                match tokio::task::spawn_blocking(move || bank.save_snapshot()).await {
                    Ok(snapshot) if live_status => {
                        print!("{}{}", CLEAR_SCREEN, render_status(&snapshot));
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("Status tick failed: {}", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::audit::MemoryAuditLog;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fast_config() -> EngineConfig {
        EngineConfig {
            vip_workers: 2,
            runtime_threads: 2,
            commission_interval: Duration::from_secs(3600),
            status_interval: Duration::from_millis(10),
            vip_idle_poll: Duration::from_millis(5),
            atm_pacing: Duration::ZERO,
            retry: crate::scheduler::RetryPolicy {
                max_retries: 2,
                delay: Duration::from_millis(1),
            },
            ..EngineConfig::default()
        }
    }

    fn atm_file(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_missing_file_starts_nothing() {
        let audit = Arc::new(MemoryAuditLog::new());
        let engine = Engine::new(fast_config(), audit.clone());

        let result = engine.run(&[PathBuf::from("missing_atm.txt")]);

        assert_eq!(
            result,
            Err(EngineError::FileNotFound {
                path: "missing_atm.txt".to_string(),
            })
        );
        assert!(audit.is_empty());
    }

    #[test]
    fn test_single_stream_run() {
        let file = atm_file(&["O 1 pw 100", "W 1 pw 150", "D 1 pw 50", "T 1 pw 2 10"]);
        let audit = Arc::new(MemoryAuditLog::new());
        let engine = Engine::new(fast_config(), audit.clone());

        let report = engine.run(&[file.path().to_path_buf()]).unwrap();

        assert_eq!(report.accounts.balance_of(1), Some(150));
        assert_eq!(report.completed_atms, 1);
        assert_eq!(report.bank_balance, 0);
        assert_eq!(audit.len(), 4);
    }

    #[test]
    fn test_vip_commands_drain_before_shutdown() {
        let file = atm_file(&["O 1 pw 0", "D 1 pw 5 VIP=10", "D 1 pw 7 VIP=90"]);
        let audit = Arc::new(MemoryAuditLog::new());
        let engine = Engine::new(fast_config(), audit.clone());

        let report = engine.run(&[file.path().to_path_buf()]).unwrap();

        assert_eq!(report.accounts.balance_of(1), Some(12));
    }

    #[test]
    fn test_empty_run() {
        let engine = Engine::new(fast_config(), Arc::new(MemoryAuditLog::new()));

        let report = engine.run(&[]).unwrap();

        assert!(report.accounts.accounts.is_empty());
        assert_eq!(report.completed_atms, 0);
    }
}
