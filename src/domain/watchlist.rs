//! Categorized ticker lists and mode-based selection.

use super::position::Category;
use super::signature::Mode;

/// Ticker lists extracted from one scanner report, one list per category.
/// Callers de-duplicate within each category; order is the report order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedTickers {
    pub strong_buys: Vec<String>,
    pub buys: Vec<String>,
    pub early_buys: Vec<String>,
    pub dividends: Vec<String>,
    pub holds: Vec<String>,
    pub sells: Vec<String>,
}

impl CategorizedTickers {
    /// Select the (ticker, category) pairs a mode tracks.
    ///
    /// `All` merges strong buys, early buys and plain buys; a ticker seen
    /// in several lists keeps its highest-priority category
    /// (strong_buy > early_buy > buy).
    pub fn select(&self, mode: Mode) -> Vec<(String, Category)> {
        let lists: &[(&[String], Category)] = match mode {
            Mode::Strong => &[(&self.strong_buys, Category::StrongBuy)],
            Mode::Early => &[(&self.early_buys, Category::EarlyBuy)],
            Mode::Dividend => &[(&self.dividends, Category::Dividend)],
            Mode::All => &[
                (&self.strong_buys, Category::StrongBuy),
                (&self.early_buys, Category::EarlyBuy),
                (&self.buys, Category::Buy),
            ],
        };

        let mut selected: Vec<(String, Category)> = Vec::new();
        for (tickers, category) in lists {
            for ticker in tickers.iter() {
                if !selected.iter().any(|(t, _)| t == ticker) {
                    selected.push((ticker.clone(), *category));
                }
            }
        }
        selected
    }

    pub fn total(&self) -> usize {
        self.strong_buys.len()
            + self.buys.len()
            + self.early_buys.len()
            + self.dividends.len()
            + self.holds.len()
            + self.sells.len()
    }
}
