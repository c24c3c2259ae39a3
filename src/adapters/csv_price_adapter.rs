//! CSV quote file price adapter.
//!
//! Stands in for a live market-data feed: one row per ticker with the
//! day's open, close and previous close. Entry prices follow the price
//! convention the current market status dictates; current prices use the
//! close column. Tickers missing from the file (or with unparsable
//! fields) are simply absent from the result.
//!
//! Expected header: `ticker,date,open,close,previous_close`

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::error::SigtrackError;
use crate::domain::market::MarketStatus;
use crate::domain::position::EntryType;
use crate::ports::price_port::{EntryQuote, PricePort};

pub struct CsvPriceAdapter {
    path: PathBuf,
    market: MarketStatus,
}

struct QuoteRow {
    date: NaiveDate,
    open: f64,
    close: f64,
    previous_close: f64,
}

impl CsvPriceAdapter {
    pub fn new(path: PathBuf, market: MarketStatus) -> Self {
        Self { path, market }
    }

    fn read_quotes(&self, tickers: &[String]) -> Result<HashMap<String, QuoteRow>, SigtrackError> {
        let content = fs::read_to_string(&self.path).map_err(|e| SigtrackError::Store {
            reason: format!("failed to read quote file {}: {e}", self.path.display()),
        })?;

        let wanted: HashMap<String, ()> =
            tickers.iter().map(|t| (t.to_uppercase(), ())).collect();
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut quotes = HashMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SigtrackError::Store {
                reason: format!("quote file parse error: {e}"),
            })?;
            let Some(ticker) = record.get(0).map(|t| t.trim().to_uppercase()) else {
                continue;
            };
            if !wanted.contains_key(&ticker) {
                continue;
            }
            // A row with bad fields is a missing quote, not a failure.
            let parsed = (|| {
                Some(QuoteRow {
                    date: NaiveDate::parse_from_str(record.get(1)?.trim(), "%Y-%m-%d").ok()?,
                    open: record.get(2)?.trim().parse().ok()?,
                    close: record.get(3)?.trim().parse().ok()?,
                    previous_close: record.get(4)?.trim().parse().ok()?,
                })
            })();
            if let Some(row) = parsed {
                quotes.insert(ticker, row);
            }
        }
        Ok(quotes)
    }
}

impl PricePort for CsvPriceAdapter {
    fn entry_prices(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, EntryQuote>, SigtrackError> {
        if tickers.is_empty() {
            return Ok(HashMap::new());
        }
        let quotes = self.read_quotes(tickers)?;
        Ok(quotes
            .into_iter()
            .map(|(ticker, row)| {
                let price = match self.market.price_type {
                    EntryType::Open => row.open,
                    EntryType::Close => row.close,
                    EntryType::PreviousClose => row.previous_close,
                };
                (
                    ticker,
                    EntryQuote {
                        price,
                        price_type: self.market.price_type,
                        date: row.date,
                    },
                )
            })
            .collect())
    }

    fn current_prices(&self, tickers: &[String]) -> Result<HashMap<String, f64>, SigtrackError> {
        if tickers.is_empty() {
            return Ok(HashMap::new());
        }
        let quotes = self.read_quotes(tickers)?;
        Ok(quotes
            .into_iter()
            .map(|(ticker, row)| (ticker, row.close))
            .collect())
    }
}
