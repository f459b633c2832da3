use crate::runtime::EngineConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Run ATM command files against a shared, concurrently accessed bank
#[derive(Parser, Debug)]
#[command(name = "atm-bank-engine")]
#[command(about = "Run ATM command files against a shared bank", long_about = None)]
pub struct CliArgs {
    /// Number of VIP scheduler workers
    #[arg(value_name = "VIP_WORKERS", help = "Number of VIP scheduler workers")]
    pub vip_workers: usize,

    /// ATM command files; the n-th file is ATM n
    #[arg(
        value_name = "ATM_FILE",
        required = true,
        help = "ATM command files (ATM ids are assigned 1..=N in this order)"
    )]
    pub atm_files: Vec<PathBuf>,

    /// Audit log destination
    #[arg(
        long = "log-file",
        value_name = "PATH",
        default_value = "log.txt",
        help = "File receiving the audit trail"
    )]
    pub log_file: PathBuf,

    /// Final account CSV destination
    #[arg(
        long = "output",
        value_name = "PATH",
        help = "File receiving the final account table (default: stdout)"
    )]
    pub output: Option<PathBuf>,

    /// Commission sweep period in milliseconds
    #[arg(
        long = "commission-ms",
        value_name = "MS",
        help = "Commission sweep period in milliseconds (default: 3000)"
    )]
    pub commission_ms: Option<u64>,

    /// Status/snapshot tick period in milliseconds
    #[arg(
        long = "status-ms",
        value_name = "MS",
        help = "Status and snapshot tick period in milliseconds (default: 500)"
    )]
    pub status_ms: Option<u64>,

    /// Pause between two commands of one ATM in milliseconds
    #[arg(
        long = "atm-delay-ms",
        value_name = "MS",
        help = "Pause before each ATM command in milliseconds (default: 100)"
    )]
    pub atm_delay_ms: Option<u64>,

    /// Pause between persistent retries in milliseconds
    #[arg(
        long = "retry-delay-ms",
        value_name = "MS",
        help = "Pause between persistent command attempts in milliseconds (default: 1000)"
    )]
    pub retry_delay_ms: Option<u64>,

    /// Tokio worker threads
    #[arg(
        long = "threads",
        value_name = "COUNT",
        help = "Runtime worker threads (default: CPU cores)"
    )]
    pub threads: Option<usize>,

    /// Redraw the bank status on every status tick
    ///
    /// The screen owns stdout, so the account table must go to `--output`.
    #[arg(
        long = "live-status",
        requires = "output",
        help = "Redraw the bank status screen on stdout (requires --output)"
    )]
    pub live_status: bool,
}

impl CliArgs {
    /// Create an EngineConfig from CLI arguments
    ///
    /// Unset options keep their defaults; invalid values (zero counts or
    /// periods) fall back to defaults with a warning.
    pub fn to_engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig {
            vip_workers: self.vip_workers,
            live_status: self.live_status,
            ..EngineConfig::default()
        };

        if let Some(ms) = self.commission_ms {
            config.commission_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.status_ms {
            config.status_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.atm_delay_ms {
            config.atm_pacing = Duration::from_millis(ms);
        }
        if let Some(ms) = self.retry_delay_ms {
            config.retry.delay = Duration::from_millis(ms);
        }
        if let Some(threads) = self.threads {
            config.runtime_threads = threads;
        }

        config.validated()
    }
}
