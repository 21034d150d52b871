//! Error types for feedindex
//!
//! Provides a unified error type for all operations.
//!
//! Every variant except `Io`, `Config` and `Serialization` marks a broken
//! invariant (corrupt store, caller bug, inconsistent cache). Query code
//! propagates them unchanged; it never downgrades one into a `false` or an
//! empty result. Ambiguity under the `abort` tie policy is not an error and
//! is reported through `FeedResult::ambiguous`.

use thiserror::Error;

/// Result type alias using FeedError
pub type Result<T> = std::result::Result<T, FeedError>;

/// Unified error type for feedindex operations
#[derive(Debug, Error)]
pub enum FeedError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed data feed key {key:?}: {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("Scan completion signalled twice: {scan}")]
    DoubleCompletion { scan: String },

    // -------------------------------------------------------------------------
    // Query Errors
    // -------------------------------------------------------------------------
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    #[error("Unknown tie policy: {0}")]
    UnknownTiePolicy(String),

    #[error("Can't sort candidates from units {first} and {second}")]
    CandidateTie { first: String, second: String },

    // -------------------------------------------------------------------------
    // Ledger Cache Errors
    // -------------------------------------------------------------------------
    #[error("Unstable unit {unit} not in unit table")]
    InconsistentCache { unit: String },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FeedError {
    /// Build a `MalformedKey` error from raw key bytes
    pub fn malformed(key: &[u8], reason: impl Into<String>) -> Self {
        FeedError::MalformedKey {
            key: String::from_utf8_lossy(key).into_owned(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Serialization(e.to_string())
    }
}
