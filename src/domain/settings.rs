//! Runtime settings resolved from the INI config.

use std::path::PathBuf;

use chrono::NaiveTime;

use super::error::SigtrackError;
use super::market::MarketHours;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_DATA_DIR: &str = "data";

/// Validated settings for one invocation. Everything has a default so the
/// tool runs without a config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub market_hours: MarketHours,
    /// Quote CSV for the file-based price adapter, if configured.
    pub quotes_file: Option<PathBuf>,
    /// External scanner command for sell detection, if configured.
    pub scanner_command: Option<String>,
    pub scanner_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            market_hours: MarketHours::default(),
            quotes_file: None,
            scanner_command: None,
            scanner_dir: None,
        }
    }
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SigtrackError> {
        let defaults = MarketHours::default();
        Ok(Self {
            data_dir: config
                .get_string("data", "dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            market_hours: MarketHours {
                open: parse_time(config, "market", "open", defaults.open)?,
                close: parse_time(config, "market", "close", defaults.close)?,
            },
            quotes_file: config.get_string("prices", "quotes_file").map(PathBuf::from),
            scanner_command: config.get_string("scanner", "command"),
            scanner_dir: config.get_string("scanner", "dir").map(PathBuf::from),
        })
    }

    pub fn ledger_file(&self) -> PathBuf {
        self.data_dir.join("signatures.json")
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.data_dir.join("runs")
    }
}

fn parse_time(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: NaiveTime,
) -> Result<NaiveTime, SigtrackError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => {
            NaiveTime::parse_from_str(&raw, "%H:%M").map_err(|e| SigtrackError::ConfigInvalid {
                section: section.into(),
                key: key.into(),
                reason: format!("expected HH:MM, got '{raw}': {e}"),
            })
        }
    }
}
