//! Core traits for SubSnipe components

use async_trait::async_trait;

use crate::error::ResolutionFailure;

/// A capability that looks up the CNAME targets of a domain.
///
/// Implementations must be safe to call concurrently and must bound every
/// lookup with their own deadline. A lookup is attempted once; callers never
/// retry.
#[async_trait]
pub trait CnameResolver: Send + Sync {
    /// Resolve the CNAME targets of `domain`.
    ///
    /// An empty vector means the name exists but has no CNAME; implementations
    /// may also report that case as `ResolutionFailure::NotFound`.
    async fn resolve_cname(&self, domain: &str) -> Result<Vec<String>, ResolutionFailure>;

    /// Resolver name/identifier
    fn name(&self) -> &str;
}
