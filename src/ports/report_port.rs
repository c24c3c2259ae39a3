//! Report rendering port trait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::error::SigtrackError;
use crate::domain::signature::Signature;

/// Port for writing shareable reports over ledger data. Current prices are
/// supplied by the caller; rendering never fetches anything.
pub trait ReportPort {
    fn write_signature(
        &self,
        signature: &Signature,
        current_prices: &HashMap<String, f64>,
        out_dir: &Path,
    ) -> Result<PathBuf, SigtrackError>;

    fn write_index(
        &self,
        signatures: &[&Signature],
        current_prices: &HashMap<String, f64>,
        out_dir: &Path,
    ) -> Result<PathBuf, SigtrackError>;
}
