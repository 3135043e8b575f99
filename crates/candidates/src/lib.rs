//! Candidate Sources - producers of subdomain names to check
//!
//! Provides:
//! - crt.sh certificate-transparency lookups
//! - newline-delimited candidate list reading and writing

mod crtsh;
mod list;

pub use crtsh::{extract_candidates, CertificateEntry, CrtShClient};
pub use list::{is_valid_hostname, parse_candidates, read_candidates, write_candidates};

use std::path::PathBuf;
use subsnipe_common::SubsnipeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CandidateError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("crt.sh returned status {0}")]
    Status(u16),

    #[error("malformed crt.sh response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("cannot access candidate file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<CandidateError> for SubsnipeError {
    fn from(err: CandidateError) -> Self {
        SubsnipeError::Candidates(err.to_string())
    }
}
