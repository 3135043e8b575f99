//! Core data types shared by the SubSnipe crates
//!
//! Everything here is plain data: results flow from the resolver pool to the
//! classifier by value, and fingerprint entries are read-only after load.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::error::ResolutionFailure;

/// Outcome of resolving one candidate's CNAME.
///
/// Produced exactly once per candidate by the pool and consumed exactly once by
/// the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub source_domain: String,
    pub resolved_name: Option<String>,
    pub failure: Option<ResolutionFailure>,
}

impl ResolutionResult {
    #[inline]
    #[must_use]
    pub fn resolved<D: Into<String>, N: Into<String>>(domain: D, name: N) -> Self {
        Self {
            source_domain: domain.into(),
            resolved_name: Some(name.into()),
            failure: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn failed<D: Into<String>>(domain: D, failure: ResolutionFailure) -> Self {
        Self {
            source_domain: domain.into(),
            resolved_name: None,
            failure: Some(failure),
        }
    }

    /// The resolved target when the lookup succeeded with a non-empty name.
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        if self.failure.is_some() {
            return None;
        }
        self.resolved_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// How a takeover could be confirmed for a fingerprinted service.
///
/// Carried from the fingerprint database; the classification path never acts
/// on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationMode {
    #[default]
    None,
    DnsNxdomain,
    HttpBodyContains,
}

/// One third-party service fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintEntry {
    pub service_id: String,
    /// CNAME suffix patterns, kept in database order.
    pub match_suffixes: Vec<String>,
    pub vulnerable: bool,
    pub confirmation_text: Option<String>,
    pub confirmation_mode: ConfirmationMode,
}

impl FingerprintEntry {
    #[inline]
    #[must_use]
    pub fn new<S: Into<String>>(service_id: S, match_suffixes: Vec<String>, vulnerable: bool) -> Self {
        Self {
            service_id: service_id.into(),
            match_suffixes,
            vulnerable,
            confirmation_text: None,
            confirmation_mode: ConfirmationMode::None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_confirmation(mut self, mode: ConfirmationMode, text: Option<String>) -> Self {
        self.confirmation_mode = mode;
        self.confirmation_text = text;
        self
    }
}

/// Terminal state of the per-candidate classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    NoRecord,
    DirectMatch { service_id: String, vulnerable: bool },
    ServiceMatch { service_id: String, vulnerable: bool },
    Unknown,
}

impl Classification {
    #[must_use]
    pub fn bucket(&self) -> Bucket {
        match self {
            Classification::NoRecord => Bucket::NoRecord,
            Classification::DirectMatch { vulnerable, .. }
            | Classification::ServiceMatch { vulnerable, .. } => {
                if *vulnerable {
                    Bucket::Exploitable
                } else {
                    Bucket::NotExploitable
                }
            }
            Classification::Unknown => Bucket::Unknown,
        }
    }
}

/// Report bucket. Declaration order is report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Exploitable,
    NotExploitable,
    Unknown,
    NoRecord,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::Exploitable,
        Bucket::NotExploitable,
        Bucket::Unknown,
        Bucket::NoRecord,
    ];

    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Bucket::Exploitable => "exploitable",
            Bucket::NotExploitable => "not_exploitable",
            Bucket::Unknown => "unknown",
            Bucket::NoRecord => "no_record",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input of one reconnaissance run.
#[derive(Debug, Clone)]
pub struct ReconJob {
    pub id: Uuid,
    pub root_domain: Option<String>,
    pub candidates: Vec<String>,
    pub created_at: SystemTime,
}

impl ReconJob {
    #[inline]
    #[must_use]
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            root_domain: None,
            candidates,
            created_at: SystemTime::now(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_root_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.root_domain = Some(domain.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }
}

/// Counters for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total: usize,
    pub resolved: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

impl RunStats {
    #[must_use]
    pub fn new(total: usize, resolved: usize, failed: usize, elapsed: Duration) -> Self {
        Self {
            total,
            resolved,
            failed,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
