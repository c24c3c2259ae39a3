//! HTML report adapter implementing ReportPort.
//!
//! Shareable static pages built by plain string rendering. Reports use the
//! equal-weighted (averaged) P/L convention; the CLI tables keep the sum
//! convention.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::SigtrackError;
use crate::domain::signature::Signature;
use crate::domain::summary::{
    realized_pnl_average, summarize, unrealized_pnl_average,
};
use crate::ports::report_port::ReportPort;

pub struct HtmlReportAdapter;

const PAGE_STYLE: &str = "\
body{font-family:-apple-system,'Segoe UI',Roboto,sans-serif;background:#16213e;color:#e0e0e0;padding:20px}\
h1{color:#fff}table{border-collapse:collapse;width:100%;margin:12px 0}\
th,td{padding:6px 10px;text-align:left;border-bottom:1px solid #333}\
.gain{color:#4caf50}.loss{color:#ef5350}.meta{color:#888;font-size:13px}";

fn pnl_cell(pnl: f64) -> String {
    let class = if pnl > 0.0 { "gain" } else { "loss" };
    format!("<td class=\"{class}\">{pnl:+.1}%</td>")
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>{title}</title>\n<style>{PAGE_STYLE}</style>\n</head>\n\
         <body>\n{body}\n</body>\n</html>\n"
    )
}

fn render_signature(signature: &Signature, current_prices: &HashMap<String, f64>) -> String {
    let summary = summarize(signature);
    let avg_realized = realized_pnl_average(signature.positions.values());
    let avg_unrealized = unrealized_pnl_average(signature, current_prices);

    let mut body = String::new();
    let _ = write!(
        body,
        "<h1>Signature {}</h1>\n<p class=\"meta\">created {} · mode {} · {} · source {}</p>\n",
        signature.signature_id,
        signature.created_at,
        signature.mode,
        signature.market_status,
        signature.source_file
    );
    let _ = write!(
        body,
        "<p>{} positions ({} open, {} closed) · avg realized {:+.1}% · avg unrealized {:+.1}% · wins {}/{}</p>\n",
        summary.total_positions,
        summary.open_positions,
        summary.closed_positions,
        avg_realized,
        avg_unrealized,
        summary.win_count,
        summary.closed_positions
    );

    body.push_str("<h2>Open positions</h2>\n<table>\n<tr><th>Ticker</th><th>Category</th><th>Entry</th><th>Current</th><th>P/L</th></tr>\n");
    for (ticker, pos) in signature.positions.iter().filter(|(_, p)| p.is_open()) {
        let current = current_prices.get(ticker).copied();
        let current_cell = current
            .map(|c| format!("${c:.2}"))
            .unwrap_or_else(|| "-".into());
        let pnl = current
            .and_then(|c| pos.unrealized_pnl_pct(c))
            .map(pnl_cell)
            .unwrap_or_else(|| "<td>-</td>".into());
        let _ = write!(
            body,
            "<tr><td>{ticker}</td><td>{}</td><td>${:.2}</td><td>{current_cell}</td>{pnl}</tr>\n",
            pos.category, pos.entry_price
        );
    }
    body.push_str("</table>\n");

    body.push_str("<h2>Closed positions</h2>\n<table>\n<tr><th>Ticker</th><th>Entry</th><th>Exit</th><th>P/L</th><th>Reason</th></tr>\n");
    for (ticker, pos) in signature.positions.iter().filter(|(_, p)| !p.is_open()) {
        let exit = pos
            .exit_price
            .map(|p| format!("${p:.2}"))
            .unwrap_or_else(|| "-".into());
        let pnl = pos
            .pnl_pct
            .map(pnl_cell)
            .unwrap_or_else(|| "<td>-</td>".into());
        let reason = pos
            .exit_reason
            .map(|r| r.to_string())
            .unwrap_or_default();
        let _ = write!(
            body,
            "<tr><td>{ticker}</td><td>${:.2}</td><td>{exit}</td>{pnl}<td>{reason}</td></tr>\n",
            pos.entry_price
        );
    }
    body.push_str("</table>\n");

    page(&format!("Signature {}", signature.signature_id), &body)
}

fn render_index(signatures: &[&Signature], current_prices: &HashMap<String, f64>) -> String {
    let mut body = String::new();
    let _ = write!(body, "<h1>Signatures ({})</h1>\n", signatures.len());
    body.push_str("<table>\n<tr><th>ID</th><th>Date</th><th>Mode</th><th>Open</th><th>Closed</th><th>Avg realized</th><th>Avg unrealized</th></tr>\n");
    for sig in signatures {
        let summary = summarize(sig);
        let _ = write!(
            body,
            "<tr><td><a href=\"{id}.html\">{id}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>{}{}</tr>\n",
            sig.created_at.date(),
            sig.mode,
            summary.open_positions,
            summary.closed_positions,
            pnl_cell(realized_pnl_average(sig.positions.values())),
            pnl_cell(unrealized_pnl_average(sig, current_prices)),
            id = sig.signature_id,
        );
    }
    body.push_str("</table>\n");
    page("Signatures", &body)
}

impl ReportPort for HtmlReportAdapter {
    fn write_signature(
        &self,
        signature: &Signature,
        current_prices: &HashMap<String, f64>,
        out_dir: &Path,
    ) -> Result<PathBuf, SigtrackError> {
        fs::create_dir_all(out_dir)?;
        let path = out_dir.join(format!("{}.html", signature.signature_id));
        fs::write(&path, render_signature(signature, current_prices))?;
        Ok(path)
    }

    fn write_index(
        &self,
        signatures: &[&Signature],
        current_prices: &HashMap<String, f64>,
        out_dir: &Path,
    ) -> Result<PathBuf, SigtrackError> {
        fs::create_dir_all(out_dir)?;
        let path = out_dir.join("index.html");
        fs::write(&path, render_index(signatures, current_prices))?;
        Ok(path)
    }
}
