//! Newline-delimited candidate lists

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::CandidateError;

const MAX_HOSTNAME_LEN: usize = 253;

/// Hostname syntax check. Underscores are accepted since CT logs contain
/// service labels such as `_dmarc`.
pub fn is_valid_hostname(name: &str) -> bool {
    static HOSTNAME_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[a-z0-9_](?:[a-z0-9_-]{0,61}[a-z0-9_])?(?:\.[a-z0-9_](?:[a-z0-9_-]{0,61}[a-z0-9_])?)*\.?$")
            .unwrap()
    });

    !name.is_empty() && name.len() <= MAX_HOSTNAME_LEN && HOSTNAME_RE.is_match(name)
}

/// Parse a candidate list: one name per line, blank lines and `#` comments
/// skipped, lowercased, invalid names dropped, first occurrence kept.
pub fn parse_candidates(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let name = line.to_ascii_lowercase();
        if !is_valid_hostname(&name) {
            debug!("Skipping invalid candidate '{}'", line);
            continue;
        }
        if seen.insert(name.clone()) {
            candidates.push(name);
        }
    }
    candidates
}

/// Read and parse a candidate list file.
pub async fn read_candidates<P: AsRef<Path>>(path: P) -> Result<Vec<String>, CandidateError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CandidateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_candidates(&text))
}

/// Write candidates one per line.
pub async fn write_candidates<P: AsRef<Path>>(path: P, candidates: &[String]) -> Result<(), CandidateError> {
    let path = path.as_ref();
    let mut body = candidates.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    tokio::fs::write(path, body)
        .await
        .map_err(|source| CandidateError::Io {
            path: path.to_path_buf(),
            source,
        })
}
