//! Price lookup port trait.
//!
//! Prices arrive as one completed batch per call; a ticker absent from the
//! returned map means "no price available" and is never an error.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::error::SigtrackError;
use crate::domain::position::EntryType;

/// An entry price plus the convention and date it was taken under.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryQuote {
    pub price: f64,
    pub price_type: EntryType,
    pub date: NaiveDate,
}

pub trait PricePort {
    /// Entry prices for the given tickers, per the current market timing.
    fn entry_prices(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, EntryQuote>, SigtrackError>;

    /// Latest prices, used for closing positions and live P/L.
    fn current_prices(&self, tickers: &[String]) -> Result<HashMap<String, f64>, SigtrackError>;
}
