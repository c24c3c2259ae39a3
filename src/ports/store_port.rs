//! Durable storage port trait for the signature ledger.

use chrono::NaiveDate;

use crate::domain::error::SigtrackError;
use crate::domain::signature::Signature;

/// Boundary between the in-memory ledger and its durable representation.
///
/// `save` must be atomic-enough that a reader never observes a partially
/// written collection (write to a temporary file, then rename).
pub trait StorePort {
    /// Read the full signature collection. A store that was never written
    /// loads as empty.
    fn load(&self) -> Result<Vec<Signature>, SigtrackError>;

    /// Replace the durable collection with `signatures`.
    fn save(&self, signatures: &[&Signature]) -> Result<(), SigtrackError>;

    /// Persist raw input content for a signature, partitioned by ingestion
    /// date. Returns the store-relative reference recorded on the
    /// signature.
    fn write_artifact(
        &self,
        signature_id: &str,
        date: NaiveDate,
        content: &str,
    ) -> Result<String, SigtrackError>;

    /// Read back a stored artifact by its reference.
    fn read_artifact(&self, reference: &str) -> Result<String, SigtrackError>;

    /// Remove a stored artifact. Missing artifacts are not an error.
    fn remove_artifact(&self, reference: &str) -> Result<(), SigtrackError>;
}
