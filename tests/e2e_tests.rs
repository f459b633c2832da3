//! End-to-end integration tests
//!
//! These tests run the complete engine (ATM tasks, VIP workers, tickers)
//! over real command files. Fixture tests:
//! 1. Read every `atm_*.txt` from a fixture directory (ATM n = n-th file)
//! 2. Run them through the engine with fast timings
//! 3. Write the final account table as CSV
//! 4. Compare it with `expected.csv`
//!
//! Fixtures are located in tests/fixtures/ and only use scenarios whose final
//! state does not depend on thread interleaving. The remaining tests write
//! their ATM files with tempfile and check the audit trail.

#[cfg(test)]
mod tests {
    use atm_bank_engine::io::{write_accounts_csv, FileAuditLog, MemoryAuditLog};
    use atm_bank_engine::runtime::{Engine, EngineConfig};
    use atm_bank_engine::scheduler::RetryPolicy;
    use atm_bank_engine::EngineError;
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::{NamedTempFile, TempDir};

    /// Timings that keep a run short; commission never fires
    fn fast_config() -> EngineConfig {
        EngineConfig {
            vip_workers: 2,
            runtime_threads: 4,
            commission_interval: Duration::from_secs(3600),
            status_interval: Duration::from_millis(10),
            vip_idle_poll: Duration::from_millis(5),
            atm_pacing: Duration::ZERO,
            retry: RetryPolicy {
                max_retries: 2,
                delay: Duration::from_millis(5),
            },
            ..EngineConfig::default()
        }
    }

    fn atm_file(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        for line in lines {
            writeln!(file, "{}", line).expect("Failed to write to temp file");
        }
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn paths(files: &[&NamedTempFile]) -> Vec<PathBuf> {
        files.iter().map(|file| file.path().to_path_buf()).collect()
    }

    /// Run a fixture directory and compare the CSV with expected.csv
    ///
    /// # Panics
    ///
    /// Panics if the fixture cannot be read or the output differs.
    fn run_test_fixture(fixture_name: &str) {
        let fixture_dir = Path::new("tests/fixtures").join(fixture_name);
        let expected_path = fixture_dir.join("expected.csv");

        let mut atm_files: Vec<PathBuf> = fs::read_dir(&fixture_dir)
            .unwrap_or_else(|e| panic!("Fixture not found: {}: {}", fixture_dir.display(), e))
            .map(|entry| entry.expect("Failed to read fixture entry").path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("atm_") && name.ends_with(".txt"))
            })
            .collect();
        atm_files.sort();
        assert!(!atm_files.is_empty(), "No ATM files in {}", fixture_dir.display());

        let engine = Engine::new(fast_config(), Arc::new(MemoryAuditLog::new()));
        let report = engine
            .run(&atm_files)
            .unwrap_or_else(|e| panic!("Failed to run fixture {}: {}", fixture_name, e));

        let mut output = Vec::new();
        write_accounts_csv(&report.accounts, &mut output).expect("Failed to write CSV");

        let actual = String::from_utf8(output).expect("Output is not UTF-8");
        let expected = fs::read_to_string(&expected_path).expect("Failed to read expected.csv");
        assert_eq!(
            actual.trim_end(),
            expected.trim_end(),
            "Output mismatch for fixture {}",
            fixture_name
        );
        assert_eq!(report.completed_atms, atm_files.len());
    }

    #[rstest]
    #[case("happy_path")]
    #[case("domain_failures")]
    #[case("multiple_atms")]
    #[case("vip_and_persistent")]
    #[case("malformed_lines")]
    fn test_fixtures(#[case] fixture: &str) {
        run_test_fixture(fixture);
    }

    #[test]
    fn test_audit_trail_of_single_atm() {
        let file = atm_file(&[
            "O 1 pw 100",
            "W 1 pw 150",
            "D 1 pw 50",
            "T 1 pw 2 10",
            "B 1 pw",
        ]);
        let audit = Arc::new(MemoryAuditLog::new());
        let engine = Engine::new(fast_config(), audit.clone());

        engine.run(&paths(&[&file])).unwrap();

        assert_eq!(
            audit.lines(),
            vec![
                "1: New account id is 1 with password pw and initial balance 100",
                "Error 1: Your transaction failed - account id 1 balance is lower than 150",
                "1: Account 1 new balance is 150 after 50 $ was deposited",
                "Error 1: Your transaction failed - account id 2 does not exist",
                "1: Account 1 balance is 150",
            ]
        );
    }

    #[test]
    fn test_persistent_give_up_is_audited() {
        let file = atm_file(&["O 1 pw 5", "W 1 pw 6 PERSISTENT"]);
        let audit = Arc::new(MemoryAuditLog::new());
        let engine = Engine::new(fast_config(), audit.clone());

        let report = engine.run(&paths(&[&file])).unwrap();

        let lines = audit.lines();
        let failures = lines
            .iter()
            .filter(|line| line.starts_with("Error 1: Your transaction failed"))
            .count();
        assert_eq!(failures, 3);
        assert_eq!(
            lines.last().unwrap(),
            "Error 1: Persistent command failed after 3 attempts: W 1 pw 6 PERSISTENT"
        );
        assert_eq!(report.accounts.balance_of(1), Some(5));
    }

    #[test]
    fn test_close_atm_stops_target_stream() {
        let closer = atm_file(&["C 2", "C 2", "C 7"]);
        let deposits: Vec<String> = std::iter::once("O 1 pw 0".to_string())
            .chain((0..50).map(|_| "D 1 pw 1".to_string()))
            .collect();
        let target = atm_file(&deposits.iter().map(String::as_str).collect::<Vec<_>>());

        let audit = Arc::new(MemoryAuditLog::new());
        let config = EngineConfig {
            atm_pacing: Duration::from_millis(10),
            ..fast_config()
        };
        let engine = Engine::new(config, audit.clone());

        let report = engine.run(&paths(&[&closer, &target])).unwrap();

        let lines = audit.lines();
        assert!(lines.contains(&"Bank: ATM 1 closed 2 successfully".to_string()));
        assert!(lines.contains(
            &"Error 1: Your close operation failed - ATM ID 2 is already in a closed state"
                .to_string()
        ));
        assert!(lines.contains(&"Error 1: Your transaction failed - ATM ID 7 does not exist".to_string()));

        let target_commands = lines.iter().filter(|line| line.starts_with("2: ")).count();
        assert!(target_commands < 51, "closed ATM ran every command");
        assert_eq!(report.completed_atms, 2);
    }

    #[test]
    fn test_commission_is_charged_while_running() {
        let lines: Vec<String> = std::iter::once("O 1 pw 100000".to_string())
            .chain((0..20).map(|_| "B 1 pw".to_string()))
            .collect();
        let file = atm_file(&lines.iter().map(String::as_str).collect::<Vec<_>>());
        let audit = Arc::new(MemoryAuditLog::new());
        let config = EngineConfig {
            commission_interval: Duration::from_millis(20),
            atm_pacing: Duration::from_millis(10),
            ..fast_config()
        };
        let engine = Engine::new(config, audit.clone());

        let report = engine.run(&paths(&[&file])).unwrap();

        let charged = report.bank_balance;
        assert!(charged > 0);
        assert_eq!(report.accounts.balance_of(1), Some(100_000 - charged));
        assert!(audit
            .lines()
            .iter()
            .any(|line| line.starts_with("Bank: commissions of ")));
    }

    #[test]
    fn test_rollback_after_status_ticks() {
        let file = atm_file(&["O 1 pw 100", "D 1 pw 900", "R 200"]);
        let audit = Arc::new(MemoryAuditLog::new());
        let engine = Engine::new(fast_config(), audit.clone());

        let report = engine.run(&paths(&[&file])).unwrap();

        // More generations than the history holds: reported, nothing changes
        assert_eq!(report.accounts.balance_of(1), Some(1000));
        assert!(audit
            .lines()
            .last()
            .unwrap()
            .starts_with("Error 1: Your transaction failed - rollback to 200"));
    }

    #[test]
    fn test_overflowing_deposit_is_rejected_not_fatal() {
        let file = atm_file(&[
            "O 1 pw 9223372036854775807",
            "O 2 pw 10",
            "D 1 pw 1",
            "T 2 pw 1 5",
        ]);
        let audit = Arc::new(MemoryAuditLog::new());
        let engine = Engine::new(fast_config(), audit.clone());

        let report = engine.run(&paths(&[&file])).unwrap();

        assert_eq!(report.accounts.balance_of(1), Some(i64::MAX));
        assert_eq!(report.accounts.balance_of(2), Some(10));
        let lines = audit.lines();
        assert_eq!(
            lines[2],
            "Error 1: Your transaction failed - account id 1 balance cannot hold another 1"
        );
        assert_eq!(
            lines[3],
            "Error 1: Your transaction failed - account id 1 balance cannot hold another 5"
        );
    }

    #[test]
    fn test_missing_atm_file() {
        let existing = atm_file(&["O 1 pw 1"]);
        let engine = Engine::new(fast_config(), Arc::new(MemoryAuditLog::new()));

        let result = engine.run(&[
            existing.path().to_path_buf(),
            PathBuf::from("tests/fixtures/no_such_atm.txt"),
        ]);

        assert!(matches!(result, Err(EngineError::FileNotFound { .. })));
    }

    #[test]
    fn test_audit_log_file() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("log.txt");
        let file = atm_file(&["O 7 secret 10", "Q 7 secret"]);
        let audit = FileAuditLog::create(&log_path).unwrap();
        let engine = Engine::new(fast_config(), Arc::new(audit));

        engine.run(&paths(&[&file])).unwrap();

        let content = fs::read_to_string(&log_path).unwrap();
        assert_eq!(
            content,
            "1: New account id is 7 with password secret and initial balance 10\n\
             1: Account 7 is now closed. Balance was 10\n"
        );
    }
}
