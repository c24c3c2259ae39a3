//! Aggregate P/L views over position data.
//!
//! Pure and read-only; current prices are always supplied by the caller.
//!
//! Two realized conventions exist on purpose: the summary path sums closed
//! positions' P/L percentages, the report-rendering path averages them
//! equal-weighted. They answer different questions and are exported under
//! distinct names rather than unified.

use std::collections::{BTreeMap, HashMap};

use super::position::Position;
use super::signature::Signature;

/// Per-signature counts and realized P/L (sum convention).
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureSummary {
    pub total_positions: usize,
    pub open_positions: usize,
    pub closed_positions: usize,
    /// Sum of closed positions' P/L percentages.
    pub realized_pnl_pct: f64,
    pub win_count: usize,
    pub loss_count: usize,
    /// `win_count / closed_positions * 100`, 0 when nothing is closed.
    pub win_rate: f64,
}

pub fn summarize(signature: &Signature) -> SignatureSummary {
    let positions: Vec<&Position> = signature.positions.values().collect();
    let open_positions = positions.iter().filter(|p| p.is_open()).count();
    let closed: Vec<&&Position> = positions.iter().filter(|p| !p.is_open()).collect();

    let win_count = closed
        .iter()
        .filter(|p| p.pnl_pct.is_some_and(|pnl| pnl > 0.0))
        .count();

    let win_rate = if closed.is_empty() {
        0.0
    } else {
        win_count as f64 / closed.len() as f64 * 100.0
    };

    SignatureSummary {
        total_positions: positions.len(),
        open_positions,
        closed_positions: closed.len(),
        realized_pnl_pct: realized_pnl_sum(signature.positions.values()),
        win_count,
        loss_count: closed.len() - win_count,
        win_rate,
    }
}

/// Sum of closed positions' P/L percentages. Positions with undefined P/L
/// contribute nothing.
pub fn realized_pnl_sum<'a, I>(positions: I) -> f64
where
    I: IntoIterator<Item = &'a Position>,
{
    positions
        .into_iter()
        .filter(|p| !p.is_open())
        .filter_map(|p| p.pnl_pct)
        .sum()
}

/// Equal-weighted average of closed positions' P/L percentages, 0 when no
/// closed position carries a defined P/L.
pub fn realized_pnl_average<'a, I>(positions: I) -> f64
where
    I: IntoIterator<Item = &'a Position>,
{
    let pnls: Vec<f64> = positions
        .into_iter()
        .filter(|p| !p.is_open())
        .filter_map(|p| p.pnl_pct)
        .collect();
    if pnls.is_empty() {
        0.0
    } else {
        pnls.iter().sum::<f64>() / pnls.len() as f64
    }
}

fn open_pnls(signature: &Signature, current_prices: &HashMap<String, f64>) -> Vec<f64> {
    signature
        .positions
        .iter()
        .filter_map(|(ticker, pos)| {
            let current = current_prices.get(ticker)?;
            pos.unrealized_pnl_pct(*current)
        })
        .collect()
}

/// Sum of open positions' P/L percentages against a current-price map.
/// Tickers absent from the map are excluded, not treated as zero.
pub fn unrealized_pnl_sum(signature: &Signature, current_prices: &HashMap<String, f64>) -> f64 {
    open_pnls(signature, current_prices).iter().sum()
}

/// Equal-weighted average counterpart of [`unrealized_pnl_sum`].
pub fn unrealized_pnl_average(
    signature: &Signature,
    current_prices: &HashMap<String, f64>,
) -> f64 {
    let pnls = open_pnls(signature, current_prices);
    if pnls.is_empty() {
        0.0
    } else {
        pnls.iter().sum::<f64>() / pnls.len() as f64
    }
}

/// One row of the cross-signature live view: a ticker's open positions
/// aggregated across all signatures.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveRow {
    pub ticker: String,
    pub current_price: f64,
    pub position_count: usize,
    pub avg_entry: f64,
    pub pnl_pct: f64,
}

/// Build live rows from the cross-signature open-position index and a
/// current-price map. Tickers without a price are excluded.
pub fn live_rows(
    open_by_ticker: &BTreeMap<String, Vec<(String, Position)>>,
    current_prices: &HashMap<String, f64>,
) -> Vec<LiveRow> {
    open_by_ticker
        .iter()
        .filter(|(_, positions)| !positions.is_empty())
        .filter_map(|(ticker, positions)| {
            let current = *current_prices.get(ticker)?;
            let avg_entry = positions.iter().map(|(_, p)| p.entry_price).sum::<f64>()
                / positions.len() as f64;
            if avg_entry <= 0.0 {
                return None;
            }
            Some(LiveRow {
                ticker: ticker.clone(),
                current_price: current,
                position_count: positions.len(),
                avg_entry,
                pnl_pct: (current - avg_entry) / avg_entry * 100.0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{Category, EntryType, ExitReason};
    use crate::domain::signature::Mode;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_signature(positions: Vec<Position>) -> Signature {
        Signature {
            signature_id: "20250110_093000_abcd1234".into(),
            file_hash: "sha256:abcd1234".into(),
            created_at: day(2025, 1, 10).and_hms_opt(9, 30, 0).unwrap(),
            mode: Mode::All,
            market_status: String::new(),
            source_file: String::new(),
            output_file: String::new(),
            positions: positions
                .into_iter()
                .map(|p| (p.ticker.clone(), p))
                .collect(),
        }
    }

    fn open_pos(ticker: &str, entry: f64) -> Position {
        Position::open(ticker, Category::Buy, entry, day(2025, 1, 10), EntryType::Close)
    }

    fn closed_pos(ticker: &str, entry: f64, exit: f64) -> Position {
        let mut pos = open_pos(ticker, entry);
        pos.close(exit, ExitReason::SellSignal, day(2025, 1, 20));
        pos
    }

    #[test]
    fn summary_of_mixed_signature() {
        // Closed P/L%: +10, -4, +6 → sum +12, wins 2, rate 66.7%.
        let sig = make_signature(vec![
            closed_pos("A", 100.0, 110.0),
            closed_pos("B", 100.0, 96.0),
            closed_pos("C", 100.0, 106.0),
            open_pos("D", 50.0),
        ]);
        let summary = summarize(&sig);
        assert_eq!(summary.total_positions, 4);
        assert_eq!(summary.open_positions, 1);
        assert_eq!(summary.closed_positions, 3);
        assert_relative_eq!(summary.realized_pnl_pct, 12.0, epsilon = 1e-9);
        assert_eq!(summary.win_count, 2);
        assert_eq!(summary.loss_count, 1);
        assert_relative_eq!(summary.win_rate, 200.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn summary_with_no_closed_positions_has_zero_win_rate() {
        let sig = make_signature(vec![open_pos("A", 10.0)]);
        let summary = summarize(&sig);
        assert_eq!(summary.closed_positions, 0);
        assert_eq!(summary.win_rate, 0.0);
        assert_eq!(summary.realized_pnl_pct, 0.0);
    }

    #[test]
    fn undefined_pnl_excluded_from_sum_and_wins() {
        let mut unpriceable = Position::open("Z", Category::Buy, 0.0, day(2025, 1, 10), EntryType::Open);
        unpriceable.close(5.0, ExitReason::Manual, day(2025, 1, 11));
        let sig = make_signature(vec![closed_pos("A", 100.0, 110.0), unpriceable]);
        let summary = summarize(&sig);
        assert_eq!(summary.closed_positions, 2);
        assert_relative_eq!(summary.realized_pnl_pct, 10.0, epsilon = 1e-9);
        assert_eq!(summary.win_count, 1);
        assert_eq!(summary.loss_count, 1);
    }

    #[test]
    fn sum_and_average_conventions_differ() {
        let sig = make_signature(vec![
            closed_pos("A", 100.0, 110.0),
            closed_pos("B", 100.0, 104.0),
        ]);
        assert_relative_eq!(
            realized_pnl_sum(sig.positions.values()),
            14.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            realized_pnl_average(sig.positions.values()),
            7.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn unrealized_excludes_unpriced_tickers() {
        let sig = make_signature(vec![open_pos("A", 100.0), open_pos("B", 100.0)]);
        let prices = HashMap::from([("A".to_string(), 105.0)]);
        assert_relative_eq!(unrealized_pnl_sum(&sig, &prices), 5.0, epsilon = 1e-9);
        assert_relative_eq!(unrealized_pnl_average(&sig, &prices), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn unrealized_average_equal_weights() {
        let sig = make_signature(vec![open_pos("A", 100.0), open_pos("B", 50.0)]);
        let prices = HashMap::from([
            ("A".to_string(), 110.0),
            ("B".to_string(), 55.0),
        ]);
        // +10% and +10%, in dollars very different sizes; equal-weighted.
        assert_relative_eq!(unrealized_pnl_average(&sig, &prices), 10.0, epsilon = 1e-9);
        assert_relative_eq!(unrealized_pnl_sum(&sig, &prices), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn live_rows_average_entry_across_signatures() {
        let mut open: BTreeMap<String, Vec<(String, Position)>> = BTreeMap::new();
        open.insert(
            "AAPL".into(),
            vec![
                ("sig1".into(), open_pos("AAPL", 90.0)),
                ("sig2".into(), open_pos("AAPL", 110.0)),
            ],
        );
        open.insert("MSFT".into(), vec![("sig1".into(), open_pos("MSFT", 100.0))]);

        let prices = HashMap::from([("AAPL".to_string(), 110.0)]);
        let rows = live_rows(&open, &prices);
        // MSFT has no price → excluded.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ticker, "AAPL");
        assert_eq!(rows[0].position_count, 2);
        assert_relative_eq!(rows[0].avg_entry, 100.0, epsilon = 1e-9);
        assert_relative_eq!(rows[0].pnl_pct, 10.0, epsilon = 1e-9);
    }
}
