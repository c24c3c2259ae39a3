//! Domain error types.

/// Top-level error type for sigtrack.
///
/// Everything here is recoverable at the CLI boundary; the core never
/// terminates the process on its own.
#[derive(Debug, thiserror::Error)]
pub enum SigtrackError {
    #[error("signature not found: {query}")]
    SignatureNotFound { query: String },

    #[error("ambiguous signature '{query}': {} matches", candidates.len())]
    AmbiguousSignature {
        query: String,
        candidates: Vec<String>,
    },

    #[error("no open position for {ticker} in {signature_id}")]
    PositionNotOpen {
        ticker: String,
        signature_id: String,
    },

    #[error("no price available for {ticker}")]
    PriceUnavailable { ticker: String },

    #[error("stored output missing for {signature_id}")]
    ArtifactMissing { signature_id: String },

    #[error("store error: {reason}")]
    Store { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid mode '{value}' (expected strong, early, all or dividend)")]
    InvalidMode { value: String },

    #[error("scanner error: {reason}")]
    Scanner { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SigtrackError> for std::process::ExitCode {
    fn from(err: &SigtrackError) -> Self {
        let code: u8 = match err {
            SigtrackError::Io(_) => 1,
            SigtrackError::ConfigParse { .. }
            | SigtrackError::ConfigMissing { .. }
            | SigtrackError::ConfigInvalid { .. }
            | SigtrackError::InvalidMode { .. } => 2,
            SigtrackError::Store { .. } => 3,
            SigtrackError::SignatureNotFound { .. }
            | SigtrackError::AmbiguousSignature { .. }
            | SigtrackError::PositionNotOpen { .. }
            | SigtrackError::ArtifactMissing { .. } => 4,
            SigtrackError::PriceUnavailable { .. } | SigtrackError::Scanner { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
