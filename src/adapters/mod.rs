//! Concrete adapter implementations for ports.

pub mod csv_price_adapter;
pub mod file_config_adapter;
pub mod html_report_adapter;
pub mod json_store_adapter;
pub mod scan_file;
pub mod scanner_bridge_adapter;
