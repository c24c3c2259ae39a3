//! Scanner report parsing: categorized ticker extraction and sell
//! detection from raw report content.
//!
//! The scanner emits section-based text (sometimes wrapped in HTML with
//! `th-*`/`section-*` CSS class markers). Parsing walks the lines, tracks
//! the current section, and pulls ticker-shaped words, filtering a
//! stop-word list of indicator names and report vocabulary.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::error::SigtrackError;
use crate::domain::watchlist::CategorizedTickers;
use crate::ports::scan_port::SellScanPort;

fn ticker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z]{1,5})\b").expect("ticker pattern is valid"))
}

const STOP_WORDS: &[&str] = &[
    "BUY", "SELL", "HOLD", "STRONG", "EARLY", "DIVIDEND", "TIER", "TOP", "PSAR", "RSI", "OBV",
    "DMI", "ADX", "MACD", "ATR", "THE", "AND", "FOR", "WITH", "FROM", "INTO", "ZONE", "SIGNAL",
    "PRICE", "DAYS", "STOCKS", "MODE", "MARKET", "SCAN", "REPORT", "SECTION", "CONFIRMED",
    "FRESH", "SIGNALS", "POSITIONS", "TICKER", "YIELD", "OPEN", "CLOSE", "HIGH", "LOW", "VOLUME",
    "TREND", "SCORE", "BUYS", "SELLS", "HOLDS", "FILTER", "FILTERS", "SCANNED", "ANALYZED",
    "TRUE", "FALSE", "NULL", "NONE", "CLASS", "STYLE", "DIV", "TABLE", "COLOR", "WHITE", "GREEN",
    "RED", "BLUE", "FONT", "SIZE", "BOLD", "TD", "TR", "TH", "HTML", "BODY", "HEAD", "SPAN",
];

#[derive(Clone, Copy, PartialEq)]
enum Section {
    StrongBuys,
    Buys,
    EarlyBuys,
    Dividends,
    Holds,
    Sells,
}

fn detect_section(line: &str) -> Option<Section> {
    let upper = line.to_uppercase();
    if upper.contains("SECTION-STRONGBUY") || upper.contains("TH-STRONGBUY") {
        return Some(Section::StrongBuys);
    }
    if upper.contains("SECTION-EARLYBUY") || upper.contains("TH-EARLYBUY") {
        return Some(Section::EarlyBuys);
    }
    if upper.contains("STRONG") && upper.contains("BUY") {
        return Some(Section::StrongBuys);
    }
    if upper.contains("EARLY") && upper.contains("BUY") {
        return Some(Section::EarlyBuys);
    }
    if upper.contains("SECTION-DIVIDEND") || upper.contains("TH-DIVIDEND") || upper.contains("DIVIDEND") {
        return Some(Section::Dividends);
    }
    if upper.contains("SECTION-HOLD") || upper.contains("TH-HOLD") {
        return Some(Section::Holds);
    }
    if upper.contains("SECTION-SELL") || upper.contains("TH-SELL") {
        return Some(Section::Sells);
    }
    if upper.contains("SELL") && (upper.contains("SECTION") || upper.contains("ZONE") || upper.trim_start().starts_with("SELL")) {
        return Some(Section::Sells);
    }
    if upper.contains("BUY") {
        return Some(Section::Buys);
    }
    None
}

fn extract_tickers(line: &str) -> Vec<String> {
    static STOP: OnceLock<HashSet<&'static str>> = OnceLock::new();
    let stop = STOP.get_or_init(|| STOP_WORDS.iter().copied().collect());
    let upper = line.to_uppercase();
    ticker_re()
        .captures_iter(&upper)
        .map(|c| c[1].to_string())
        .filter(|w| w.len() >= 2 && !stop.contains(w.as_str()))
        .collect()
}

/// Parse scanner output into ticker lists, de-duplicated within each
/// category in first-seen order.
pub fn parse_content(content: &str) -> CategorizedTickers {
    let mut parsed = CategorizedTickers::default();
    let mut current: Option<Section> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('=') || trimmed.starts_with('-') {
            continue;
        }
        if let Some(section) = detect_section(trimmed) {
            current = Some(section);
            continue;
        }
        let Some(section) = current else { continue };
        let list = match section {
            Section::StrongBuys => &mut parsed.strong_buys,
            Section::Buys => &mut parsed.buys,
            Section::EarlyBuys => &mut parsed.early_buys,
            Section::Dividends => &mut parsed.dividends,
            Section::Holds => &mut parsed.holds,
            Section::Sells => &mut parsed.sells,
        };
        for ticker in extract_tickers(trimmed) {
            if !list.contains(&ticker) {
                list.push(ticker);
            }
        }
    }
    parsed
}

/// Find which of `open_tickers` a report flags as sells: tickers listed in
/// the report's sell section, plus any ticker the report pairs with an
/// explicit SELL marker on the same line.
pub fn detect_sells(content: &str, open_tickers: &[String]) -> Vec<String> {
    let known: HashSet<String> = open_tickers.iter().map(|t| t.to_uppercase()).collect();
    let mut sells: Vec<String> = parse_content(content)
        .sells
        .into_iter()
        .filter(|t| known.contains(t))
        .collect();

    for line in content.lines() {
        let upper = line.to_uppercase();
        if !upper.contains("SELL") {
            continue;
        }
        for ticker in extract_tickers(&upper) {
            if known.contains(&ticker) && !sells.contains(&ticker) {
                sells.push(ticker);
            }
        }
    }
    sells.sort();
    sells
}

/// SellScanPort over an already-read report file (the fast path of
/// `check-sells --from-file`).
pub struct ReportFileScan {
    content: String,
}

impl ReportFileScan {
    pub fn new(content: String) -> Self {
        Self { content }
    }
}

impl SellScanPort for ReportFileScan {
    fn find_sells(&self, tickers: &[String]) -> Result<Vec<String>, SigtrackError> {
        Ok(detect_sells(&self.content, tickers))
    }
}
