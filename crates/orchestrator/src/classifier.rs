//! Per-candidate classification against the fingerprint store

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use subsnipe_common::{Bucket, Classification, ResolutionResult};
use subsnipe_fingerprint::{trim_root, FingerprintStore};

/// A classified candidate, ready to be routed to its bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub source_domain: String,
    /// Resolved CNAME target with the root dot trimmed.
    pub target: Option<String>,
    pub classification: Classification,
}

impl Classified {
    #[inline]
    pub fn bucket(&self) -> Bucket {
        self.classification.bucket()
    }

    /// Human-readable report line.
    pub fn line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Classified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match (&self.classification, self.target.as_deref()) {
            (Classification::NoRecord, _) | (_, None) => {
                return write!(f, "No CNAME record found for: {}", self.source_domain)
            }
            (_, Some(target)) => target,
        };

        write!(f, "CNAME for {} is: {} ", self.source_domain, target)?;
        match &self.classification {
            Classification::DirectMatch { vulnerable, .. } => {
                write!(f, "(found matching fingerprint - {})", verdict(*vulnerable))
            }
            Classification::ServiceMatch {
                service_id,
                vulnerable,
            } => write!(
                f,
                "(found potentially matching service '{}' - {})",
                service_id,
                verdict(*vulnerable)
            ),
            Classification::Unknown => f.write_str("(no matching fingerprint)"),
            Classification::NoRecord => Ok(()),
        }
    }
}

fn verdict(vulnerable: bool) -> &'static str {
    if vulnerable {
        "vulnerable"
    } else {
        "safe"
    }
}

/// Stateless classifier; the same input always yields the same output.
#[derive(Debug, Clone)]
pub struct Classifier {
    store: Arc<FingerprintStore>,
}

impl Classifier {
    pub fn new(store: Arc<FingerprintStore>) -> Self {
        Self { store }
    }

    /// Classify one resolution result. Rules, in order: no target -> NoRecord,
    /// direct suffix hit, second-level-domain hit, otherwise Unknown.
    pub fn classify(&self, result: ResolutionResult) -> Classified {
        let classification = match result.target() {
            None => Classification::NoRecord,
            Some(target) => {
                if let Some(hit) = self.store.match_direct(target) {
                    debug!("{} matched pattern '{}' of {}", target, hit.key, hit.service_id());
                    Classification::DirectMatch {
                        service_id: hit.service_id().to_string(),
                        vulnerable: hit.vulnerable(),
                    }
                } else if let Some(hit) = self.store.match_by_second_level_domain(target) {
                    debug!("{} matched service key '{}' of {}", target, hit.key, hit.service_id());
                    Classification::ServiceMatch {
                        service_id: hit.service_id().to_string(),
                        vulnerable: hit.vulnerable(),
                    }
                } else {
                    Classification::Unknown
                }
            }
        };

        let target = match classification {
            Classification::NoRecord => None,
            _ => result.target().map(|t| trim_root(t).to_string()),
        };
        debug!("{} classified as {:?}", result.source_domain, classification);

        Classified {
            source_domain: result.source_domain,
            target,
            classification,
        }
    }
}
