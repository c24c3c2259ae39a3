//! Core domain types and logic.

pub mod error;
pub mod fingerprint;
pub mod ledger;
pub mod market;
pub mod position;
pub mod settings;
pub mod signature;
pub mod summary;
pub mod watchlist;
