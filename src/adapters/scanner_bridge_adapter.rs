//! External scanner bridge for sell detection.
//!
//! Invokes the configured scanner command with the open tickers written to
//! a temp file, then parses its stdout for sell flags. Used only when
//! `check-sells` runs without `--from-file`; scanner failures surface as
//! typed errors, never a crash.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use crate::adapters::scan_file::detect_sells;
use crate::domain::error::SigtrackError;
use crate::ports::scan_port::SellScanPort;

const TICKERS_FILE: &str = "sigtrack_check_sells.txt";

pub struct ScannerBridgeAdapter {
    command: String,
    working_dir: Option<PathBuf>,
}

impl ScannerBridgeAdapter {
    pub fn new(command: String, working_dir: Option<PathBuf>) -> Self {
        Self {
            command,
            working_dir,
        }
    }

    fn run(&self, tickers_file: &PathBuf) -> Result<String, SigtrackError> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| SigtrackError::Scanner {
            reason: "empty scanner command".into(),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(parts).arg("--tickers-file").arg(tickers_file);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| SigtrackError::Scanner {
            reason: format!("failed to run '{}': {e}", self.command),
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            eprintln!("scanner warning: {}", stderr.chars().take(200).collect::<String>());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SellScanPort for ScannerBridgeAdapter {
    fn find_sells(&self, tickers: &[String]) -> Result<Vec<String>, SigtrackError> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }

        let tickers_file = std::env::temp_dir().join(TICKERS_FILE);
        fs::write(&tickers_file, tickers.join("\n"))?;

        let result = self.run(&tickers_file);
        let _ = fs::remove_file(&tickers_file);

        let stdout = result?;
        Ok(detect_sells(&stdout, tickers))
    }
}
