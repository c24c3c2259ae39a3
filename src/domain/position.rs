//! Position lifecycle: entry, optional exit, P/L.
//!
//! A position is a single unit-weighted trade. It is created open as part of
//! signature materialization and transitions to closed at most once; closed
//! is terminal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Signal category a ticker was listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    StrongBuy,
    EarlyBuy,
    Buy,
    Dividend,
    Hold,
    Sell,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::StrongBuy => "strong_buy",
            Category::EarlyBuy => "early_buy",
            Category::Buy => "buy",
            Category::Dividend => "dividend",
            Category::Hold => "hold",
            Category::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which price convention was used for the entry, determined by market
/// timing at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Open,
    Close,
    PreviousClose,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntryType::Open => "open",
            EntryType::Close => "close",
            EntryType::PreviousClose => "previous_close",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    SellSignal,
    Manual,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExitReason::SellSignal => "sell_signal",
            ExitReason::Manual => "manual",
        };
        f.write_str(s)
    }
}

/// One tracked instrument's entry → exit lifecycle.
///
/// Invariant: the exit fields are all-or-nothing — `Some` iff
/// `status == Closed`. [`Position::close`] is the only mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub category: Category,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub entry_type: EntryType,
    pub status: PositionStatus,
    #[serde(default)]
    pub exit_price: Option<f64>,
    #[serde(default)]
    pub exit_date: Option<NaiveDate>,
    #[serde(default)]
    pub exit_reason: Option<ExitReason>,
    #[serde(default)]
    pub pnl_pct: Option<f64>,
    #[serde(default)]
    pub pnl_amt: Option<f64>,
}

impl Position {
    /// Create a new open position at the given entry price.
    pub fn open(
        ticker: &str,
        category: Category,
        entry_price: f64,
        entry_date: NaiveDate,
        entry_type: EntryType,
    ) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            category,
            entry_price,
            entry_date,
            entry_type,
            status: PositionStatus::Open,
            exit_price: None,
            exit_date: None,
            exit_reason: None,
            pnl_pct: None,
            pnl_amt: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Transition open → closed. Returns `false` without touching any
    /// field when the position is already closed.
    ///
    /// P/L percentage requires a positive entry price; otherwise both P/L
    /// fields stay `None` (undefined, never a division by zero) and the
    /// position is excluded from aggregate averages.
    pub fn close(&mut self, price: f64, reason: ExitReason, today: NaiveDate) -> bool {
        if self.status == PositionStatus::Closed {
            return false;
        }
        self.status = PositionStatus::Closed;
        self.exit_price = Some(price);
        self.exit_date = Some(today);
        self.exit_reason = Some(reason);
        if self.entry_price > 0.0 {
            let amt = price - self.entry_price;
            self.pnl_amt = Some(amt);
            self.pnl_pct = Some(amt / self.entry_price * 100.0);
        } else {
            self.pnl_amt = None;
            self.pnl_pct = None;
        }
        true
    }

    /// Unrealized P/L percentage at `current` price, or `None` when the
    /// position is closed or the entry price is non-positive.
    pub fn unrealized_pnl_pct(&self, current: f64) -> Option<f64> {
        if !self.is_open() || self.entry_price <= 0.0 {
            return None;
        }
        Some((current - self.entry_price) / self.entry_price * 100.0)
    }
}
