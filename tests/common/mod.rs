#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use sigtrack::domain::error::SigtrackError;
use sigtrack::domain::market::{market_status_at, MarketHours, MarketStatus};
use sigtrack::domain::position::EntryType;
use sigtrack::domain::signature::Signature;
use sigtrack::ports::price_port::{EntryQuote, PricePort};
use sigtrack::ports::store_port::StorePort;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    day(y, m, d).and_hms_opt(h, min, s).unwrap()
}

/// Market status for a weekday mid-session instant.
pub fn open_market() -> MarketStatus {
    // 2025-01-10 is a Friday.
    market_status_at(at(2025, 1, 10, 10, 0, 0), &MarketHours::default())
}

pub struct MockPricePort {
    pub quotes: HashMap<String, f64>,
    pub quote_date: NaiveDate,
    pub price_type: EntryType,
    pub entry_calls: Cell<usize>,
    pub current_calls: Cell<usize>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            quotes: HashMap::new(),
            quote_date: day(2025, 1, 10),
            price_type: EntryType::Open,
            entry_calls: Cell::new(0),
            current_calls: Cell::new(0),
        }
    }

    pub fn with_quote(mut self, ticker: &str, price: f64) -> Self {
        self.quotes.insert(ticker.to_string(), price);
        self
    }
}

impl PricePort for MockPricePort {
    fn entry_prices(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, EntryQuote>, SigtrackError> {
        self.entry_calls.set(self.entry_calls.get() + 1);
        Ok(tickers
            .iter()
            .filter_map(|t| {
                self.quotes.get(t).map(|price| {
                    (
                        t.clone(),
                        EntryQuote {
                            price: *price,
                            price_type: self.price_type,
                            date: self.quote_date,
                        },
                    )
                })
            })
            .collect())
    }

    fn current_prices(&self, tickers: &[String]) -> Result<HashMap<String, f64>, SigtrackError> {
        self.current_calls.set(self.current_calls.get() + 1);
        Ok(tickers
            .iter()
            .filter_map(|t| self.quotes.get(t).map(|p| (t.clone(), *p)))
            .collect())
    }
}

/// In-memory store: keeps the saved collection and artifacts in maps so
/// tests can count saves and inspect artifact contents.
pub struct MemoryStore {
    pub saved: RefCell<Vec<Signature>>,
    pub artifacts: RefCell<HashMap<String, String>>,
    pub save_calls: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            saved: RefCell::new(Vec::new()),
            artifacts: RefCell::new(HashMap::new()),
            save_calls: Cell::new(0),
        }
    }

    pub fn with_signatures(signatures: Vec<Signature>) -> Self {
        let store = Self::new();
        *store.saved.borrow_mut() = signatures;
        store
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.borrow().len()
    }
}

impl StorePort for MemoryStore {
    fn load(&self) -> Result<Vec<Signature>, SigtrackError> {
        Ok(self.saved.borrow().clone())
    }

    fn save(&self, signatures: &[&Signature]) -> Result<(), SigtrackError> {
        self.save_calls.set(self.save_calls.get() + 1);
        *self.saved.borrow_mut() = signatures.iter().map(|s| (*s).clone()).collect();
        Ok(())
    }

    fn write_artifact(
        &self,
        signature_id: &str,
        date: NaiveDate,
        content: &str,
    ) -> Result<String, SigtrackError> {
        let reference = format!("{}/{signature_id}.txt", date.format("%Y%m%d"));
        self.artifacts
            .borrow_mut()
            .insert(reference.clone(), content.to_string());
        Ok(reference)
    }

    fn read_artifact(&self, reference: &str) -> Result<String, SigtrackError> {
        self.artifacts
            .borrow()
            .get(reference)
            .cloned()
            .ok_or_else(|| SigtrackError::Store {
                reason: format!("artifact not found: {reference}"),
            })
    }

    fn remove_artifact(&self, reference: &str) -> Result<(), SigtrackError> {
        self.artifacts.borrow_mut().remove(reference);
        Ok(())
    }
}

// LedgerStore takes its store by value; implementing the port for a
// shared reference lets tests keep a handle for assertions.
impl StorePort for &MemoryStore {
    fn load(&self) -> Result<Vec<Signature>, SigtrackError> {
        (**self).load()
    }

    fn save(&self, signatures: &[&Signature]) -> Result<(), SigtrackError> {
        (**self).save(signatures)
    }

    fn write_artifact(
        &self,
        signature_id: &str,
        date: NaiveDate,
        content: &str,
    ) -> Result<String, SigtrackError> {
        (**self).write_artifact(signature_id, date, content)
    }

    fn read_artifact(&self, reference: &str) -> Result<String, SigtrackError> {
        (**self).read_artifact(reference)
    }

    fn remove_artifact(&self, reference: &str) -> Result<(), SigtrackError> {
        (**self).remove_artifact(reference)
    }
}

/// A small scanner report with every section populated.
pub const SAMPLE_REPORT: &str = "\
STRONG BUY SIGNALS
AAPL 185.0 confirmed
MSFT 410.2 confirmed

EARLY BUY SIGNALS
NVDA 118.5 forming

BUY SIGNALS
AMD 142.1

DIVIDEND OPPORTUNITIES
KO 61.3

SELL SIGNALS
INTC 33.9
";
