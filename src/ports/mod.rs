//! Port traits decoupling the ledger core from its collaborators.

pub mod config_port;
pub mod price_port;
pub mod report_port;
pub mod scan_port;
pub mod store_port;
