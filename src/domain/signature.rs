//! Signatures: one deduplicated ingestion event and its owned positions.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::error::SigtrackError;
use super::position::{ExitReason, Position};

/// Which signal categories a run tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Strong,
    Early,
    All,
    Dividend,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Strong => "strong",
            Mode::Early => "early",
            Mode::All => "all",
            Mode::Dividend => "dividend",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = SigtrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strong" => Ok(Mode::Strong),
            "early" => Ok(Mode::Early),
            "all" => Ok(Mode::All),
            "dividend" => Ok(Mode::Dividend),
            _ => Err(SigtrackError::InvalidMode { value: s.into() }),
        }
    }
}

/// An immutable-identity, mutable-content ledger entry.
///
/// Identity, fingerprint, creation timestamp, mode and provenance never
/// change after creation; only the positions map mutates, and only by
/// closing positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub signature_id: String,
    pub file_hash: String,
    pub created_at: NaiveDateTime,
    pub mode: Mode,
    #[serde(default)]
    pub market_status: String,
    #[serde(default)]
    pub source_file: String,
    #[serde(default)]
    pub output_file: String,
    #[serde(default)]
    pub positions: BTreeMap<String, Position>,
}

impl Signature {
    /// Tickers with an open position, in map order.
    pub fn open_tickers(&self) -> Vec<String> {
        self.positions
            .iter()
            .filter(|(_, p)| p.is_open())
            .map(|(t, _)| t.clone())
            .collect()
    }

    /// Close one position by ticker. Returns `false` when the ticker is
    /// unknown or already closed, leaving the signature untouched.
    pub fn close_position(
        &mut self,
        ticker: &str,
        price: f64,
        reason: ExitReason,
        today: NaiveDate,
    ) -> bool {
        match self.positions.get_mut(ticker) {
            Some(pos) => pos.close(price, reason, today),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{Category, EntryType};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_signature() -> Signature {
        let mut positions = BTreeMap::new();
        for ticker in ["AAPL", "MSFT"] {
            positions.insert(
                ticker.to_string(),
                Position::open(ticker, Category::StrongBuy, 100.0, day(2025, 1, 10), EntryType::Close),
            );
        }
        Signature {
            signature_id: "20250110_093000_a1b2c3d4".into(),
            file_hash: "sha256:a1b2c3d4".into(),
            created_at: day(2025, 1, 10).and_hms_opt(9, 30, 0).unwrap(),
            mode: Mode::Strong,
            market_status: "Market open - using today open".into(),
            source_file: "scan.html".into(),
            output_file: "20250110/20250110_093000_a1b2c3d4.txt".into(),
            positions,
        }
    }

    #[test]
    fn mode_round_trips_from_str() {
        for mode in [Mode::Strong, Mode::Early, Mode::All, Mode::Dividend] {
            assert_eq!(Mode::from_str(mode.as_str()).unwrap(), mode);
        }
        assert!(matches!(
            Mode::from_str("aggressive"),
            Err(SigtrackError::InvalidMode { .. })
        ));
    }

    #[test]
    fn open_tickers_skips_closed() {
        let mut sig = sample_signature();
        assert_eq!(sig.open_tickers(), vec!["AAPL", "MSFT"]);
        sig.close_position("AAPL", 110.0, ExitReason::SellSignal, day(2025, 1, 20));
        assert_eq!(sig.open_tickers(), vec!["MSFT"]);
    }

    #[test]
    fn close_position_unknown_ticker_fails() {
        let mut sig = sample_signature();
        assert!(!sig.close_position("NVDA", 1.0, ExitReason::Manual, day(2025, 1, 20)));
    }

    #[test]
    fn close_position_twice_fails_second_time() {
        let mut sig = sample_signature();
        assert!(sig.close_position("AAPL", 110.0, ExitReason::SellSignal, day(2025, 1, 20)));
        assert!(!sig.close_position("AAPL", 90.0, ExitReason::Manual, day(2025, 1, 21)));
        assert_eq!(sig.positions["AAPL"].exit_price, Some(110.0));
    }

    #[test]
    fn serde_keeps_original_field_names() {
        let sig = sample_signature();
        let json = serde_json::to_string(&sig).unwrap();
        assert!(json.contains("\"signature_id\""));
        assert!(json.contains("\"file_hash\""));
        assert!(json.contains("\"mode\":\"strong\""));
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back.signature_id, sig.signature_id);
        assert_eq!(back.positions.len(), 2);
    }
}
