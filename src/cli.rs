//! CLI definition and dispatch.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use chrono::Local;
use clap::{Parser, Subcommand};

use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report_adapter::HtmlReportAdapter;
use crate::adapters::json_store_adapter::JsonStoreAdapter;
use crate::adapters::scan_file::{parse_content, ReportFileScan};
use crate::adapters::scanner_bridge_adapter::ScannerBridgeAdapter;
use crate::domain::error::SigtrackError;
use crate::domain::ledger::{ClosedPosition, LedgerStore};
use crate::domain::market::{market_status_at, MarketStatus};
use crate::domain::position::ExitReason;
use crate::domain::settings::Settings;
use crate::domain::signature::Mode;
use crate::domain::summary::{self, summarize};
use crate::ports::price_port::{EntryQuote, PricePort};
use crate::ports::report_port::ReportPort;
use crate::ports::scan_port::SellScanPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrack", about = "Scanner signal signature & position ledger")]
pub struct Cli {
    /// Path to an INI config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process a scanner output file and create or reuse a signature
    Process {
        file: PathBuf,
        /// Tracking mode: strong, early, all or dividend
        #[arg(short, long, default_value = "all")]
        mode: String,
    },
    /// List signatures with P/L summary
    Signatures {
        /// Filter by mode
        #[arg(short, long)]
        mode: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show a detailed report for one signature
    Report {
        /// Signature id (partial ids accepted)
        signature: String,
    },
    /// Check open positions for sells and close the flagged ones
    CheckSells {
        /// Parse an existing scanner output file instead of invoking the
        /// scanner
        #[arg(short, long)]
        from_file: Option<PathBuf>,
    },
    /// Show live P/L for all open positions
    Live,
    /// Manually close a position
    Close {
        ticker: String,
        /// Close only inside this signature (otherwise everywhere open)
        #[arg(short, long)]
        signature: Option<String>,
        /// Exit price (otherwise the current quote)
        #[arg(long)]
        price: Option<f64>,
    },
    /// Show the stored raw input for a signature
    Show { signature: String },
    /// Generate HTML reports (one signature, or index plus all)
    Html {
        signature: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a signature and its stored artifact
    Delete {
        signature: String,
        #[arg(long)]
        confirm: bool,
    },
    /// Clear all ledger data
    Reset {
        #[arg(long)]
        confirm: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let settings = match load_settings(cli.config.as_ref()) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match cli.command {
        Command::Process { file, mode } => run_process(&settings, &file, &mode),
        Command::Signatures { mode, limit } => run_signatures(&settings, mode.as_deref(), limit),
        Command::Report { signature } => run_report(&settings, &signature),
        Command::CheckSells { from_file } => run_check_sells(&settings, from_file.as_ref()),
        Command::Live => run_live(&settings),
        Command::Close {
            ticker,
            signature,
            price,
        } => run_close(&settings, &ticker, signature.as_deref(), price),
        Command::Show { signature } => run_show(&settings, &signature),
        Command::Html { signature, output } => {
            run_html(&settings, signature.as_deref(), output.as_ref())
        }
        Command::Delete { signature, confirm } => run_delete(&settings, &signature, confirm),
        Command::Reset { confirm } => run_reset(&settings, confirm),
    }
}

fn load_settings(config_path: Option<&PathBuf>) -> Result<Settings, ExitCode> {
    let Some(path) = config_path else {
        return Ok(Settings::default());
    };
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SigtrackError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        fail(&err)
    })?;
    Settings::from_config(&adapter).map_err(|e| fail(&e))
}

fn fail(err: &SigtrackError) -> ExitCode {
    eprintln!("error: {err}");
    if let SigtrackError::AmbiguousSignature { candidates, .. } = err {
        for candidate in candidates.iter().take(5) {
            eprintln!("  {candidate}");
        }
    }
    err.into()
}

fn open_store(settings: &Settings) -> Result<LedgerStore<JsonStoreAdapter>, ExitCode> {
    LedgerStore::open(JsonStoreAdapter::new(settings.data_dir.clone())).map_err(|e| fail(&e))
}

/// Fallback price port when no quote file is configured; everything is
/// unpriced.
struct NoQuotes;

impl PricePort for NoQuotes {
    fn entry_prices(
        &self,
        _tickers: &[String],
    ) -> Result<HashMap<String, EntryQuote>, SigtrackError> {
        Ok(HashMap::new())
    }

    fn current_prices(&self, _tickers: &[String]) -> Result<HashMap<String, f64>, SigtrackError> {
        Ok(HashMap::new())
    }
}

fn price_port(settings: &Settings, market: &MarketStatus) -> Box<dyn PricePort> {
    match &settings.quotes_file {
        Some(path) => Box::new(CsvPriceAdapter::new(path.clone(), market.clone())),
        None => {
            eprintln!("note: no [prices] quotes_file configured; tickers are unpriced");
            Box::new(NoQuotes)
        }
    }
}

fn current_prices(settings: &Settings, tickers: &[String]) -> Result<HashMap<String, f64>, ExitCode> {
    if tickers.is_empty() {
        return Ok(HashMap::new());
    }
    let now = Local::now().naive_local();
    let market = market_status_at(now, &settings.market_hours);
    price_port(settings, &market)
        .current_prices(tickers)
        .map_err(|e| fail(&e))
}

fn run_process(settings: &Settings, file: &PathBuf, mode_str: &str) -> ExitCode {
    let mode = match Mode::from_str(mode_str) {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };
    let content = match fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => return fail(&e.into()),
    };
    let mut store = match open_store(settings) {
        Ok(s) => s,
        Err(code) => return code,
    };

    eprintln!("Processing {}", file.display());
    let parsed = parse_content(&content);
    eprintln!(
        "Found: {} strong buy, {} early buy, {} buy, {} dividend, {} sell",
        parsed.strong_buys.len(),
        parsed.early_buys.len(),
        parsed.buys.len(),
        parsed.dividends.len(),
        parsed.sells.len()
    );

    let now = Local::now().naive_local();
    let market = market_status_at(now, &settings.market_hours);
    let prices = price_port(settings, &market);
    let source_file = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let outcome = match store.create_or_get(
        &content,
        &source_file,
        mode,
        &parsed,
        prices.as_ref(),
        &market,
        now,
    ) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    let Some(sig) = store.ledger().get(&outcome.signature_id) else {
        return fail(&SigtrackError::SignatureNotFound {
            query: outcome.signature_id,
        });
    };

    if outcome.is_new {
        println!("NEW signature created: {}", sig.signature_id);
        println!("  Market: {}", sig.market_status);
        println!("  Positions: {}", sig.positions.len());
        for (ticker, pos) in sig.positions.iter().take(10) {
            println!("    {ticker}: ${:.2} ({})", pos.entry_price, pos.entry_type);
        }
        if sig.positions.len() > 10 {
            println!("    ... and {} more", sig.positions.len() - 10);
        }
    } else {
        let summary = summarize(sig);
        println!("EXISTING signature: {}", sig.signature_id);
        println!("  Created: {}", sig.created_at);
        println!(
            "  Positions: {} open, {} closed",
            summary.open_positions, summary.closed_positions
        );
        println!("  Realized P/L: {:+.1}%", summary.realized_pnl_pct);
    }
    ExitCode::SUCCESS
}

fn run_signatures(settings: &Settings, mode_str: Option<&str>, limit: usize) -> ExitCode {
    let mode = match mode_str.map(Mode::from_str).transpose() {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };
    let store = match open_store(settings) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let signatures = store.ledger().list(mode, limit);
    if signatures.is_empty() {
        println!("No signatures found. Use 'sigtrack process <file>' to create one.");
        return ExitCode::SUCCESS;
    }

    let mut open_tickers: Vec<String> = signatures
        .iter()
        .flat_map(|s| s.open_tickers())
        .collect();
    open_tickers.sort();
    open_tickers.dedup();
    let prices = match current_prices(settings, &open_tickers) {
        Ok(p) => p,
        Err(code) => return code,
    };

    println!("\nSIGNATURES ({})", signatures.len());
    println!("{}", "=".repeat(100));
    println!(
        "{:<28} {:<12} {:<8} {:<6} {:<8} {:<10} {:<12} {:<10}",
        "ID", "Date", "Mode", "Open", "Closed", "Realized", "Unrealized", "Total"
    );
    println!("{}", "-".repeat(100));
    for sig in &signatures {
        let summary = summarize(sig);
        let unrealized = summary::unrealized_pnl_sum(sig, &prices);
        let realized = if summary.closed_positions > 0 {
            format!("{:+.1}%", summary.realized_pnl_pct)
        } else {
            "-".into()
        };
        let unrealized_str = if summary.open_positions > 0 {
            format!("{unrealized:+.1}%")
        } else {
            "-".into()
        };
        println!(
            "{:<28} {:<12} {:<8} {:<6} {:<8} {:<10} {:<12} {:<10}",
            sig.signature_id,
            sig.created_at.date().to_string(),
            sig.mode.to_string(),
            summary.open_positions,
            summary.closed_positions,
            realized,
            unrealized_str,
            format!("{:+.1}%", summary.realized_pnl_pct + unrealized),
        );
    }
    println!("{}", "-".repeat(100));
    ExitCode::SUCCESS
}

fn run_report(settings: &Settings, query: &str) -> ExitCode {
    let store = match open_store(settings) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let sig = match store.ledger().resolve(query) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let summary = summarize(sig);
    let prices = match current_prices(settings, &sig.open_tickers()) {
        Ok(p) => p,
        Err(code) => return code,
    };

    println!("{}", "=".repeat(80));
    println!("SIGNATURE REPORT: {}", sig.signature_id);
    println!("{}", "=".repeat(80));
    println!("Created: {}", sig.created_at);
    println!("Source:  {}", sig.source_file);
    println!("Mode:    {}", sig.mode);
    println!("Market:  {}", sig.market_status);
    println!(
        "Positions: {} total, {} open, {} closed",
        summary.total_positions, summary.open_positions, summary.closed_positions
    );
    if summary.closed_positions > 0 {
        println!(
            "Win rate: {}/{} ({:.1}%)",
            summary.win_count, summary.closed_positions, summary.win_rate
        );
        println!("Realized P/L: {:+.1}%", summary.realized_pnl_pct);
    }

    let open: Vec<_> = sig.positions.values().filter(|p| p.is_open()).collect();
    if !open.is_empty() {
        println!("\nOPEN POSITIONS ({})", open.len());
        println!(
            "{:<8} {:<12} {:<10} {:<10} {:<10} {:<12}",
            "Ticker", "Category", "Entry$", "Current$", "P/L%", "Entry Date"
        );
        for pos in &open {
            let current = prices.get(&pos.ticker);
            let (current_str, pnl_str) = match current {
                Some(c) => (
                    format!("{c:.2}"),
                    pos.unrealized_pnl_pct(*c)
                        .map(|p| format!("{p:+.1}%"))
                        .unwrap_or_else(|| "-".into()),
                ),
                None => ("-".into(), "-".into()),
            };
            println!(
                "{:<8} {:<12} {:<10.2} {:<10} {:<10} {:<12}",
                pos.ticker,
                pos.category.to_string(),
                pos.entry_price,
                current_str,
                pnl_str,
                pos.entry_date.to_string(),
            );
        }
        println!(
            "Unrealized total: {:+.1}% (avg {:+.1}%)",
            summary::unrealized_pnl_sum(sig, &prices),
            summary::unrealized_pnl_average(sig, &prices),
        );
    }

    let closed: Vec<_> = sig.positions.values().filter(|p| !p.is_open()).collect();
    if !closed.is_empty() {
        println!("\nCLOSED POSITIONS ({})", closed.len());
        println!(
            "{:<8} {:<10} {:<10} {:<10} {:<12} {:<24}",
            "Ticker", "Entry$", "Exit$", "P/L%", "Reason", "Dates"
        );
        for pos in &closed {
            let pnl_str = pos
                .pnl_pct
                .map(|p| format!("{p:+.1}%"))
                .unwrap_or_else(|| "-".into());
            println!(
                "{:<8} {:<10.2} {:<10.2} {:<10} {:<12} {} -> {}",
                pos.ticker,
                pos.entry_price,
                pos.exit_price.unwrap_or(0.0),
                pnl_str,
                pos.exit_reason.map(|r| r.to_string()).unwrap_or_default(),
                pos.entry_date,
                pos.exit_date.map(|d| d.to_string()).unwrap_or_default(),
            );
        }
    }
    ExitCode::SUCCESS
}

fn run_check_sells(settings: &Settings, from_file: Option<&PathBuf>) -> ExitCode {
    let mut store = match open_store(settings) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let all_open = store.ledger().open_positions_by_ticker();
    if all_open.is_empty() {
        println!("No open positions to check");
        return ExitCode::SUCCESS;
    }
    let tickers: Vec<String> = all_open.keys().cloned().collect();
    eprintln!("Checking {} tickers for sells...", tickers.len());

    let scan: Box<dyn SellScanPort> = match from_file {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => Box::new(ReportFileScan::new(content)),
            Err(e) => return fail(&e.into()),
        },
        None => match &settings.scanner_command {
            Some(command) => Box::new(ScannerBridgeAdapter::new(
                command.clone(),
                settings.scanner_dir.clone(),
            )),
            None => {
                return fail(&SigtrackError::Scanner {
                    reason: "no [scanner] command configured; use --from-file".into(),
                });
            }
        },
    };

    let sells = match scan.find_sells(&tickers) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    if sells.is_empty() {
        println!("No positions in sell zone");
        return ExitCode::SUCCESS;
    }
    println!("Found {} in sell zone: {}", sells.len(), sells.join(", "));

    let exit_prices = match current_prices(settings, &sells) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let today = Local::now().date_naive();
    let mut closed: Vec<ClosedPosition> = Vec::new();
    for ticker in &sells {
        let Some(price) = exit_prices.get(ticker) else {
            eprintln!("warning: no exit price for {ticker}, skipping");
            continue;
        };
        match store.close_across(ticker, *price, ExitReason::SellSignal, today) {
            Ok(mut batch) => closed.append(&mut batch),
            Err(e) => {
                // One ticker failing to persist should not stop the rest.
                eprintln!("error closing {ticker}: {e}");
            }
        }
    }

    println!("Closed {} positions:", closed.len());
    for c in &closed {
        print_closed(c);
    }
    ExitCode::SUCCESS
}

fn run_live(settings: &Settings) -> ExitCode {
    let store = match open_store(settings) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let all_open = store.ledger().open_positions_by_ticker();
    if all_open.is_empty() {
        println!("No open positions.");
        return ExitCode::SUCCESS;
    }

    let tickers: Vec<String> = all_open.keys().cloned().collect();
    let prices = match current_prices(settings, &tickers) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let rows = summary::live_rows(&all_open, &prices);

    let now = Local::now().naive_local();
    let market = market_status_at(now, &settings.market_hours);
    println!("{}", "=".repeat(70));
    println!("LIVE P/L - {}", now.format("%Y-%m-%d %H:%M:%S"));
    println!("Market: {}", market.description);
    println!("{}", "=".repeat(70));
    println!(
        "{:<8} {:<10} {:<10} {:<12} {:<10}",
        "Ticker", "Current$", "Positions", "Avg Entry$", "P/L%"
    );
    println!("{}", "-".repeat(70));

    let mut total_pnl = 0.0;
    let mut total_positions = 0usize;
    for row in &rows {
        total_pnl += row.pnl_pct * row.position_count as f64;
        total_positions += row.position_count;
        println!(
            "{:<8} {:<10.2} {:<10} {:<12.2} {:+.1}%",
            row.ticker, row.current_price, row.position_count, row.avg_entry, row.pnl_pct
        );
    }
    println!("{}", "-".repeat(70));
    let avg = if total_positions > 0 {
        total_pnl / total_positions as f64
    } else {
        0.0
    };
    println!("TOTAL    {total_positions} positions, avg {avg:+.1}%");
    ExitCode::SUCCESS
}

fn run_close(
    settings: &Settings,
    ticker: &str,
    signature: Option<&str>,
    price: Option<f64>,
) -> ExitCode {
    let mut store = match open_store(settings) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let ticker = ticker.to_uppercase();

    let exit_price = match price {
        Some(p) => p,
        None => {
            let prices = match current_prices(settings, std::slice::from_ref(&ticker)) {
                Ok(p) => p,
                Err(code) => return code,
            };
            match prices.get(&ticker) {
                Some(p) => *p,
                None => return fail(&SigtrackError::PriceUnavailable { ticker }),
            }
        }
    };

    let today = Local::now().date_naive();
    let closed = match signature {
        Some(query) => {
            match store.close_in(query, &ticker, exit_price, ExitReason::Manual, today) {
                Ok(c) => vec![c],
                Err(e) => return fail(&e),
            }
        }
        None => match store.close_across(&ticker, exit_price, ExitReason::Manual, today) {
            Ok(c) => c,
            Err(e) => return fail(&e),
        },
    };

    if closed.is_empty() {
        println!("No open position for {ticker}");
        return ExitCode::from(4);
    }
    println!("Closed {ticker} in {} signature(s)", closed.len());
    for c in &closed {
        print_closed(c);
    }
    ExitCode::SUCCESS
}

fn print_closed(c: &ClosedPosition) {
    let pnl = c
        .pnl_pct
        .map(|p| format!("{p:+.1}%"))
        .unwrap_or_else(|| "n/a".into());
    println!(
        "  {}: ${:.2} -> ${:.2} ({pnl}) in {}",
        c.ticker, c.entry_price, c.exit_price, c.signature_id
    );
}

fn run_show(settings: &Settings, query: &str) -> ExitCode {
    let store = match open_store(settings) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let sig = match store.ledger().resolve(query) {
        Ok(s) => s.signature_id.clone(),
        Err(e) => return fail(&e),
    };
    let content = match store.artifact_content(&sig) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    println!("OUTPUT: {sig}");
    println!("{}", "=".repeat(80));
    const MAX_SHOWN: usize = 8000;
    if content.len() > MAX_SHOWN {
        let mut end = MAX_SHOWN;
        while !content.is_char_boundary(end) {
            end -= 1;
        }
        println!("{}", &content[..end]);
        println!("... truncated ({} total chars)", content.chars().count());
    } else {
        println!("{content}");
    }
    ExitCode::SUCCESS
}

fn run_html(settings: &Settings, query: Option<&str>, output: Option<&PathBuf>) -> ExitCode {
    let store = match open_store(settings) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let out_dir = output
        .cloned()
        .unwrap_or_else(|| settings.data_dir.join("reports"));
    let adapter = HtmlReportAdapter;

    match query {
        Some(q) => {
            let sig = match store.ledger().resolve(q) {
                Ok(s) => s,
                Err(e) => return fail(&e),
            };
            let prices = match current_prices(settings, &sig.open_tickers()) {
                Ok(p) => p,
                Err(code) => return code,
            };
            match adapter.write_signature(sig, &prices, &out_dir) {
                Ok(path) => {
                    println!("Report saved: {}", path.display());
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e),
            }
        }
        None => {
            let signatures = store.ledger().list(None, usize::MAX);
            if signatures.is_empty() {
                println!("No signatures found.");
                return ExitCode::SUCCESS;
            }
            let mut open_tickers: Vec<String> = signatures
                .iter()
                .flat_map(|s| s.open_tickers())
                .collect();
            open_tickers.sort();
            open_tickers.dedup();
            let prices = match current_prices(settings, &open_tickers) {
                Ok(p) => p,
                Err(code) => return code,
            };
            if let Err(e) = adapter.write_index(&signatures, &prices, &out_dir) {
                return fail(&e);
            }
            for sig in &signatures {
                if let Err(e) = adapter.write_signature(sig, &prices, &out_dir) {
                    return fail(&e);
                }
            }
            println!(
                "Generated index and {} reports in {}",
                signatures.len(),
                out_dir.display()
            );
            ExitCode::SUCCESS
        }
    }
}

fn run_delete(settings: &Settings, query: &str, confirm: bool) -> ExitCode {
    let mut store = match open_store(settings) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let sig = match store.ledger().resolve(query) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if !confirm {
        let summary = summarize(sig);
        println!("About to delete: {}", sig.signature_id);
        println!("  Created: {}", sig.created_at);
        println!("  Source: {}", sig.source_file);
        println!(
            "  Positions: {} ({} open)",
            summary.total_positions, summary.open_positions
        );
        println!("Re-run with --confirm to delete");
        return ExitCode::from(4);
    }

    let id = sig.signature_id.clone();
    match store.delete(&id) {
        Ok(_) => {
            println!("Deleted: {id}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_reset(settings: &Settings, confirm: bool) -> ExitCode {
    if !confirm {
        eprintln!("error: re-run with --confirm to clear all ledger data");
        return ExitCode::from(4);
    }
    if settings.data_dir.exists() {
        if let Err(e) = fs::remove_dir_all(&settings.data_dir) {
            return fail(&e.into());
        }
    }
    if let Err(e) = fs::create_dir_all(settings.data_dir.join("runs")) {
        return fail(&e.into());
    }
    println!("All data reset");
    ExitCode::SUCCESS
}
