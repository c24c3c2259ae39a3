//! Sell-detection port trait.

use crate::domain::error::SigtrackError;

/// Given currently open tickers, report the subset flagged for exit.
/// Implementations re-parse a report file or invoke the external scanner.
pub trait SellScanPort {
    fn find_sells(&self, tickers: &[String]) -> Result<Vec<String>, SigtrackError>;
}
