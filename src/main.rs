//! ATM Bank Engine CLI
//!
//! Runs ATM command files concurrently against one shared bank.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- 2 atm1.txt atm2.txt atm3.txt > accounts.csv
//! cargo run -- --log-file audit.log --output accounts.csv 4 atm1.txt atm2.txt
//! cargo run -- --live-status --output accounts.csv 2 atm1.txt atm2.txt
//! RUST_LOG=debug cargo run -- 1 atm1.txt
//! ```
//!
//! The first argument is the number of VIP workers; each following file is
//! one ATM. The audit trail goes to `--log-file` (default `log.txt`), the
//! final account table to `--output` or stdout, diagnostics to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing ATM file, unwritable log or output, failed worker)

use atm_bank_engine::cli;
use atm_bank_engine::io::{write_accounts_csv, FileAuditLog};
use atm_bank_engine::runtime::Engine;
use std::fs::File;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // Parse command-line arguments using clap
    let args = cli::parse_args();

    if let Err(e) = run(&args) {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &cli::CliArgs) -> Result<(), String> {
    let audit = FileAuditLog::create(&args.log_file).map_err(|e| {
        format!(
            "Failed to create log file '{}': {}",
            args.log_file.display(),
            e
        )
    })?;

    let engine = Engine::new(args.to_engine_config(), Arc::new(audit));
    let report = engine.run(&args.atm_files).map_err(|e| e.to_string())?;

    let mut output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path)
                .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?,
        ),
        None => Box::new(io::stdout()),
    };
    write_accounts_csv(&report.accounts, &mut *output)?;

    tracing::info!(bank_balance = report.bank_balance, "Bank commission balance");
    Ok(())
}
