//! Engine configuration
//!
//! Defaults reproduce the timings of the classic ATM simulation: a commission
//! sweep every 3 s, a status/snapshot tick every 500 ms, 100 ms between two
//! commands of the same ATM and 1 s between persistent retries.

use crate::core::DEFAULT_SNAPSHOT_CAPACITY;
use crate::scheduler::RetryPolicy;
use std::time::Duration;

/// Configuration for an [`Engine`](super::Engine) run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of VIP scheduler workers
    pub vip_workers: usize,
    /// Tokio worker threads
    pub runtime_threads: usize,
    /// Period of the commission sweep
    pub commission_interval: Duration,
    /// Period of the status ticker (one snapshot generation per tick)
    pub status_interval: Duration,
    /// Sleep of an idle VIP worker before it polls again
    pub vip_idle_poll: Duration,
    /// Pause before each command of an ATM stream
    pub atm_pacing: Duration,
    /// Retry policy of persistent commands
    pub retry: RetryPolicy,
    /// Snapshot generations kept for rollback
    pub snapshot_capacity: usize,
    /// Redraw the status screen on every status tick
    pub live_status: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vip_workers: 1,
            runtime_threads: num_cpus::get(),
            commission_interval: Duration::from_secs(3),
            status_interval: Duration::from_millis(500),
            vip_idle_poll: Duration::from_millis(100),
            atm_pacing: Duration::from_millis(100),
            retry: RetryPolicy::default(),
            snapshot_capacity: DEFAULT_SNAPSHOT_CAPACITY,
            live_status: false,
        }
    }
}

impl EngineConfig {
    /// Create a default configuration with `vip_workers` scheduler workers
    ///
    /// A zero worker count falls back to the default with a warning.
    pub fn new(vip_workers: usize) -> Self {
        Self {
            vip_workers,
            ..Self::default()
        }
        .validated()
    }

    /// Replace zero counts and zero periods with their defaults
    ///
    /// Each replacement is reported with a warning.
    pub fn validated(mut self) -> Self {
        let default = Self::default();

        if self.vip_workers == 0 {
            tracing::warn!(
                "Invalid vip_workers ({}), using default ({})",
                self.vip_workers,
                default.vip_workers
            );
            self.vip_workers = default.vip_workers;
        }

        if self.runtime_threads == 0 {
            tracing::warn!(
                "Invalid runtime_threads ({}), using default ({})",
                self.runtime_threads,
                default.runtime_threads
            );
            self.runtime_threads = default.runtime_threads;
        }

        if self.snapshot_capacity == 0 {
            tracing::warn!(
                "Invalid snapshot_capacity ({}), using default ({})",
                self.snapshot_capacity,
                default.snapshot_capacity
            );
            self.snapshot_capacity = default.snapshot_capacity;
        }

        // Zero periods would turn the tickers into busy loops
        for (name, value, fallback) in [
            ("commission_interval", &mut self.commission_interval, default.commission_interval),
            ("status_interval", &mut self.status_interval, default.status_interval),
            ("vip_idle_poll", &mut self.vip_idle_poll, default.vip_idle_poll),
        ] {
            if value.is_zero() {
                tracing::warn!("Invalid {} (0ms), using default ({:?})", name, fallback);
                *value = fallback;
            }
        }

        self
    }
}
