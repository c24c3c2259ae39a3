//! Content fingerprinting and signature identity.
//!
//! The fingerprint is the sole de-duplication mechanism: identical
//! (content, mode) pairs always resolve to the same signature, so it must
//! be a collision-resistant digest of the raw bytes, not of any in-memory
//! representation.

use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};

use super::signature::Mode;

pub const FINGERPRINT_PREFIX: &str = "sha256:";

/// Digest length carried into the signature id suffix.
const ID_SUFFIX_LEN: usize = 8;

/// Fingerprint of raw report content under a mode.
///
/// Any byte difference in the content, or a different mode tag, yields a
/// different fingerprint.
pub fn fingerprint(content: &str, mode: Mode) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(b":");
    hasher.update(mode.as_str().as_bytes());
    format!("{FINGERPRINT_PREFIX}{}", hex::encode(hasher.finalize()))
}

/// Derive a human-sortable signature id: a timestamp prefix plus a short
/// suffix taken from the fingerprint digest.
///
/// Uniqueness is probabilistic (timestamp second + 8 hex chars of the
/// digest), which is enough for any practical ingestion rate.
pub fn signature_id(now: NaiveDateTime, fingerprint: &str) -> String {
    let digest = fingerprint
        .strip_prefix(FINGERPRINT_PREFIX)
        .unwrap_or(fingerprint);
    let suffix = &digest[..digest.len().min(ID_SUFFIX_LEN)];
    format!("{}_{suffix}", now.format("%Y%m%d_%H%M%S"))
}
