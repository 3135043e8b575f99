//! Error types for SubSnipe
//!
//! Fatal errors (`LoadError`, `SubsnipeError`) abort a run. `ResolutionFailure`
//! is per-candidate and is folded into a `NoRecord` classification instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubsnipeError {
    #[error("Fingerprint load error: {0}")]
    FingerprintLoad(#[from] LoadError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Candidate source error: {0}")]
    Candidates(String),

    #[error("Resolver unavailable: {0}")]
    ResolverUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Report error: {0}")]
    Report(String),
}

/// Failure to obtain a usable fingerprint store.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read fingerprint source {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed fingerprint JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid fingerprint entry '{service}': {reason}")]
    InvalidEntry { service: String, reason: String },
}

/// Why a single CNAME lookup produced no target. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    #[error("resolution timed out")]
    Timeout,

    #[error("no CNAME record found")]
    NotFound,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias for SubSnipe operations
pub type SubsnipeResult<T> = Result<T, SubsnipeError>;
