//! The signature ledger: in-memory collection, dedup index, and the
//! durable store façade.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};

use super::error::SigtrackError;
use super::fingerprint::{fingerprint, signature_id};
use super::market::MarketStatus;
use super::position::{ExitReason, Position};
use super::signature::{Mode, Signature};
use super::watchlist::CategorizedTickers;
use crate::ports::price_port::PricePort;
use crate::ports::store_port::StorePort;

/// In-memory signature collection with its derived fingerprint index.
///
/// The index maps fingerprint → signature id and is always rebuilt from
/// the collection, never persisted on its own, so the two cannot drift.
#[derive(Debug, Default)]
pub struct Ledger {
    signatures: HashMap<String, Signature>,
    hash_index: HashMap<String, String>,
}

impl Ledger {
    pub fn from_signatures(signatures: Vec<Signature>) -> Self {
        let mut ledger = Ledger::default();
        for sig in signatures {
            ledger.insert(sig);
        }
        ledger
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn insert(&mut self, signature: Signature) {
        self.hash_index
            .insert(signature.file_hash.clone(), signature.signature_id.clone());
        self.signatures
            .insert(signature.signature_id.clone(), signature);
    }

    /// Remove a signature by exact id, keeping the index in sync.
    pub fn remove(&mut self, id: &str) -> Option<Signature> {
        let signature = self.signatures.remove(id)?;
        self.hash_index.remove(&signature.file_hash);
        Some(signature)
    }

    pub fn get(&self, id: &str) -> Option<&Signature> {
        self.signatures.get(id)
    }

    pub fn get_by_fingerprint(&self, file_hash: &str) -> Option<&Signature> {
        self.hash_index
            .get(file_hash)
            .and_then(|id| self.signatures.get(id))
    }

    /// Resolve a full or partial signature id.
    ///
    /// An exact match wins; otherwise a unique prefix match resolves, and
    /// multiple prefix matches fail with the candidate list rather than
    /// guessing.
    pub fn resolve_id(&self, query: &str) -> Result<String, SigtrackError> {
        if self.signatures.contains_key(query) {
            return Ok(query.to_string());
        }
        let mut candidates: Vec<String> = self
            .signatures
            .keys()
            .filter(|id| id.starts_with(query))
            .cloned()
            .collect();
        candidates.sort();
        match candidates.len() {
            0 => Err(SigtrackError::SignatureNotFound {
                query: query.into(),
            }),
            1 => Ok(candidates.remove(0)),
            _ => Err(SigtrackError::AmbiguousSignature {
                query: query.into(),
                candidates,
            }),
        }
    }

    pub fn resolve(&self, query: &str) -> Result<&Signature, SigtrackError> {
        let id = self.resolve_id(query)?;
        self.signatures
            .get(&id)
            .ok_or_else(|| SigtrackError::SignatureNotFound { query: id })
    }

    /// Signatures sorted by creation timestamp descending, optionally
    /// filtered by mode, truncated to `limit`. Filtering by `Mode::All`
    /// means no filter.
    pub fn list(&self, mode: Option<Mode>, limit: usize) -> Vec<&Signature> {
        let mut results: Vec<&Signature> = self
            .signatures
            .values()
            .filter(|sig| match mode {
                Some(Mode::All) | None => true,
                Some(m) => sig.mode == m,
            })
            .collect();
        results.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.signature_id.cmp(&a.signature_id))
        });
        results.truncate(limit);
        results
    }

    /// Every signature, sorted oldest first for a stable durable layout.
    pub fn snapshot(&self) -> Vec<&Signature> {
        let mut all: Vec<&Signature> = self.signatures.values().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.signature_id.cmp(&b.signature_id))
        });
        all
    }

    /// Cross-signature open-position index: ticker → (signature id,
    /// position) for every open position in the ledger.
    pub fn open_positions_by_ticker(&self) -> BTreeMap<String, Vec<(String, Position)>> {
        let mut open: BTreeMap<String, Vec<(String, Position)>> = BTreeMap::new();
        for sig in self.snapshot() {
            for (ticker, pos) in &sig.positions {
                if pos.is_open() {
                    open.entry(ticker.clone())
                        .or_default()
                        .push((sig.signature_id.clone(), pos.clone()));
                }
            }
        }
        open
    }
}

/// Record of one position closed through the store, for caller display.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedPosition {
    pub signature_id: String,
    pub ticker: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl_pct: Option<f64>,
}

/// Outcome of [`LedgerStore::create_or_get`].
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub signature_id: String,
    pub is_new: bool,
}

/// The durable ledger: an in-memory [`Ledger`] kept in lock-step with a
/// [`StorePort`]. Every mutating operation saves before returning.
pub struct LedgerStore<S: StorePort> {
    store: S,
    ledger: Ledger,
}

impl<S: StorePort> LedgerStore<S> {
    /// Load the durable collection and rebuild the fingerprint index.
    pub fn open(store: S) -> Result<Self, SigtrackError> {
        let signatures = store.load()?;
        Ok(Self {
            store,
            ledger: Ledger::from_signatures(signatures),
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn save(&self) -> Result<(), SigtrackError> {
        self.store.save(&self.ledger.snapshot())
    }

    /// Ingest raw report content under a mode: return the existing
    /// signature when the (content, mode) fingerprint is already known,
    /// otherwise materialize open positions at entry prices and persist a
    /// new signature.
    ///
    /// The duplicate path is fully idempotent: no price fetch, no artifact
    /// write, no mutation.
    #[allow(clippy::too_many_arguments)]
    pub fn create_or_get(
        &mut self,
        content: &str,
        source_file: &str,
        mode: Mode,
        report: &CategorizedTickers,
        prices: &dyn PricePort,
        market: &MarketStatus,
        now: NaiveDateTime,
    ) -> Result<IngestOutcome, SigtrackError> {
        let file_hash = fingerprint(content, mode);
        if let Some(existing) = self.ledger.get_by_fingerprint(&file_hash) {
            return Ok(IngestOutcome {
                signature_id: existing.signature_id.clone(),
                is_new: false,
            });
        }

        let selected = report.select(mode);
        let tickers: Vec<String> = selected.iter().map(|(t, _)| t.clone()).collect();
        let quotes = prices.entry_prices(&tickers)?;

        // Tickers without a quote are a data-availability gap, not an
        // error; they are simply not tracked.
        let mut positions = BTreeMap::new();
        for (ticker, category) in &selected {
            if let Some(quote) = quotes.get(ticker) {
                positions.insert(
                    ticker.clone(),
                    Position::open(ticker, *category, quote.price, quote.date, quote.price_type),
                );
            }
        }

        let id = signature_id(now, &file_hash);
        let output_file = self.store.write_artifact(&id, now.date(), content)?;

        self.ledger.insert(Signature {
            signature_id: id.clone(),
            file_hash,
            created_at: now,
            mode,
            market_status: market.description.clone(),
            source_file: source_file.into(),
            output_file,
            positions,
        });
        self.save()?;

        Ok(IngestOutcome {
            signature_id: id,
            is_new: true,
        })
    }

    /// Close one ticker inside one signature (resolved by full or partial
    /// id), then save.
    pub fn close_in(
        &mut self,
        id_query: &str,
        ticker: &str,
        price: f64,
        reason: ExitReason,
        today: NaiveDate,
    ) -> Result<ClosedPosition, SigtrackError> {
        let id = self.ledger.resolve_id(id_query)?;
        let ticker = ticker.to_uppercase();
        let Some(sig) = self.ledger.signatures.get_mut(&id) else {
            return Err(SigtrackError::SignatureNotFound { query: id });
        };
        let entry_price = match sig.positions.get(&ticker) {
            Some(pos) if pos.is_open() => pos.entry_price,
            _ => {
                return Err(SigtrackError::PositionNotOpen {
                    ticker,
                    signature_id: id,
                });
            }
        };
        sig.close_position(&ticker, price, reason, today);
        let pnl_pct = sig.positions[&ticker].pnl_pct;
        self.save()?;
        Ok(ClosedPosition {
            signature_id: id,
            ticker,
            entry_price,
            exit_price: price,
            pnl_pct,
        })
    }

    /// Close a ticker in every signature where it is open, at one exit
    /// price. Signatures close independently; already-closed positions are
    /// skipped rather than failing the batch. One save at the end.
    pub fn close_across(
        &mut self,
        ticker: &str,
        price: f64,
        reason: ExitReason,
        today: NaiveDate,
    ) -> Result<Vec<ClosedPosition>, SigtrackError> {
        let ticker = ticker.to_uppercase();
        let mut closed = Vec::new();
        let mut ids: Vec<String> = self.ledger.signatures.keys().cloned().collect();
        ids.sort();
        for id in ids {
            let Some(sig) = self.ledger.signatures.get_mut(&id) else {
                continue;
            };
            let entry_price = match sig.positions.get(&ticker) {
                Some(pos) if pos.is_open() => pos.entry_price,
                _ => continue,
            };
            if sig.close_position(&ticker, price, reason, today) {
                closed.push(ClosedPosition {
                    signature_id: id.clone(),
                    ticker: ticker.clone(),
                    entry_price,
                    exit_price: price,
                    pnl_pct: sig.positions[&ticker].pnl_pct,
                });
            }
        }
        if !closed.is_empty() {
            self.save()?;
        }
        Ok(closed)
    }

    /// Delete a signature, its fingerprint index entry and its stored
    /// artifact.
    pub fn delete(&mut self, id_query: &str) -> Result<Signature, SigtrackError> {
        let id = self.ledger.resolve_id(id_query)?;
        let Some(signature) = self.ledger.remove(&id) else {
            return Err(SigtrackError::SignatureNotFound { query: id });
        };
        if !signature.output_file.is_empty() {
            self.store.remove_artifact(&signature.output_file)?;
        }
        self.save()?;
        Ok(signature)
    }

    /// Stored raw input content for a signature.
    pub fn artifact_content(&self, id_query: &str) -> Result<String, SigtrackError> {
        let sig = self.ledger.resolve(id_query)?;
        if sig.output_file.is_empty() {
            return Err(SigtrackError::ArtifactMissing {
                signature_id: sig.signature_id.clone(),
            });
        }
        self.store.read_artifact(&sig.output_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{Category, EntryType};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_signature(id: &str, hash: &str, mode: Mode, hour: u32) -> Signature {
        Signature {
            signature_id: id.into(),
            file_hash: hash.into(),
            created_at: day(2025, 1, 10).and_hms_opt(hour, 0, 0).unwrap(),
            mode,
            market_status: String::new(),
            source_file: String::new(),
            output_file: String::new(),
            positions: BTreeMap::new(),
        }
    }

    fn with_position(mut sig: Signature, ticker: &str, entry: f64) -> Signature {
        sig.positions.insert(
            ticker.into(),
            Position::open(ticker, Category::Buy, entry, day(2025, 1, 10), EntryType::Close),
        );
        sig
    }

    #[test]
    fn index_rebuilt_from_signatures() {
        let ledger = Ledger::from_signatures(vec![
            make_signature("20250110_100000_aa", "sha256:aa", Mode::Strong, 10),
            make_signature("20250110_110000_bb", "sha256:bb", Mode::Early, 11),
        ]);
        assert_eq!(ledger.len(), 2);
        assert_eq!(
            ledger.get_by_fingerprint("sha256:bb").unwrap().signature_id,
            "20250110_110000_bb"
        );
        assert!(ledger.get_by_fingerprint("sha256:cc").is_none());
    }

    #[test]
    fn remove_drops_index_entry() {
        let mut ledger = Ledger::from_signatures(vec![make_signature(
            "20250110_100000_aa",
            "sha256:aa",
            Mode::Strong,
            10,
        )]);
        assert!(ledger.remove("20250110_100000_aa").is_some());
        assert!(ledger.get_by_fingerprint("sha256:aa").is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn resolve_exact_match_wins() {
        let ledger = Ledger::from_signatures(vec![
            make_signature("20250101_100000_ab12", "sha256:ab12", Mode::All, 10),
            make_signature("20250101_100000_ab13", "sha256:ab13", Mode::All, 10),
        ]);
        assert_eq!(
            ledger.resolve_id("20250101_100000_ab12").unwrap(),
            "20250101_100000_ab12"
        );
    }

    #[test]
    fn resolve_unique_prefix() {
        let ledger = Ledger::from_signatures(vec![
            make_signature("20250101_100000_ab12", "sha256:ab12", Mode::All, 10),
            make_signature("20250102_100000_cd34", "sha256:cd34", Mode::All, 10),
        ]);
        assert_eq!(ledger.resolve_id("20250102").unwrap(), "20250102_100000_cd34");
    }

    #[test]
    fn resolve_ambiguous_prefix_reports_candidates() {
        let ledger = Ledger::from_signatures(vec![
            make_signature("20250101_100000_ab12", "sha256:ab12", Mode::All, 10),
            make_signature("20250101_100000_ab13", "sha256:ab13", Mode::All, 10),
        ]);
        match ledger.resolve_id("20250101_1000") {
            Err(SigtrackError::AmbiguousSignature { candidates, .. }) => {
                assert_eq!(
                    candidates,
                    vec!["20250101_100000_ab12", "20250101_100000_ab13"]
                );
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn resolve_unknown_is_not_found() {
        let ledger = Ledger::default();
        assert!(matches!(
            ledger.resolve_id("2030"),
            Err(SigtrackError::SignatureNotFound { .. })
        ));
    }

    #[test]
    fn list_sorts_newest_first_and_filters_mode() {
        let ledger = Ledger::from_signatures(vec![
            make_signature("20250110_090000_aa", "sha256:aa", Mode::Strong, 9),
            make_signature("20250110_110000_bb", "sha256:bb", Mode::Early, 11),
            make_signature("20250110_100000_cc", "sha256:cc", Mode::Strong, 10),
        ]);

        let all: Vec<&str> = ledger
            .list(None, 10)
            .iter()
            .map(|s| s.signature_id.as_str())
            .collect();
        assert_eq!(
            all,
            vec![
                "20250110_110000_bb",
                "20250110_100000_cc",
                "20250110_090000_aa"
            ]
        );

        let strong = ledger.list(Some(Mode::Strong), 10);
        assert_eq!(strong.len(), 2);

        // Mode::All as a filter means no filter.
        assert_eq!(ledger.list(Some(Mode::All), 10).len(), 3);

        assert_eq!(ledger.list(None, 2).len(), 2);
    }

    #[test]
    fn open_positions_by_ticker_spans_signatures() {
        let sig_a = with_position(
            make_signature("20250110_090000_aa", "sha256:aa", Mode::All, 9),
            "AAPL",
            90.0,
        );
        let mut sig_b = with_position(
            make_signature("20250110_100000_bb", "sha256:bb", Mode::All, 10),
            "AAPL",
            110.0,
        );
        sig_b = with_position(sig_b, "MSFT", 200.0);
        sig_b
            .positions
            .get_mut("MSFT")
            .unwrap()
            .close(210.0, ExitReason::Manual, day(2025, 1, 11));

        let ledger = Ledger::from_signatures(vec![sig_a, sig_b]);
        let open = ledger.open_positions_by_ticker();
        assert_eq!(open.len(), 1);
        assert_eq!(open["AAPL"].len(), 2);
    }
}
