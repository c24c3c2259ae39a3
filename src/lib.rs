//! sigtrack — signal signature & position ledger.
//!
//! Tracks hypothetical positions opened from periodic scanner reports so
//! their signals can be measured for profitability. Ingestion is
//! content-addressed: the same report under the same mode always resolves
//! to one signature.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
