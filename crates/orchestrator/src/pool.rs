//! Resolver pool - bounded-concurrency CNAME resolution

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use subsnipe_common::{
    CnameResolver, ResolutionFailure, ResolutionResult, SubsnipeError, SubsnipeResult,
};

use crate::progress::ProgressTracker;

pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// Spawns one worker per candidate; a semaphore caps how many resolutions
/// are in flight at once.
pub struct ResolverPool {
    resolver: Arc<dyn CnameResolver>,
    concurrency: usize,
    deadline: Duration,
}

impl ResolverPool {
    pub fn new(resolver: Arc<dyn CnameResolver>) -> Self {
        Self {
            resolver,
            concurrency: DEFAULT_CONCURRENCY,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Maximum number of concurrent resolutions (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Deadline applied to every single resolution call.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Resolve every candidate and send exactly one result per candidate.
    ///
    /// Returns after all workers have finished, i.e. after every result has
    /// been handed to `results`. The queue closes once the caller's last
    /// sender clone is dropped, which happens when this returns.
    #[instrument(skip_all, fields(concurrency = self.concurrency))]
    pub async fn run<I>(
        &self,
        candidates: I,
        results: mpsc::Sender<ResolutionResult>,
        progress: Arc<ProgressTracker>,
    ) -> SubsnipeResult<usize>
    where
        I: IntoIterator<Item = String>,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();

        for domain in candidates {
            let semaphore = semaphore.clone();
            let resolver = self.resolver.clone();
            let results = results.clone();
            let progress = progress.clone();
            let deadline = self.deadline;

            workers.spawn(async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => resolve_one(resolver.as_ref(), domain, deadline).await,
                    Err(_) => ResolutionResult::failed(
                        domain,
                        ResolutionFailure::Transport("resolver pool closed".to_string()),
                    ),
                };
                progress.record(&result).await;

                results.send(result).await.map_err(|_| {
                    SubsnipeError::Pipeline("result queue closed before all results were delivered".into())
                })
            });
        }
        drop(results);

        let mut delivered = 0;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => return Err(e),
                Err(e) => return Err(SubsnipeError::Pipeline(format!("resolver worker failed: {}", e))),
            }
        }
        Ok(delivered)
    }
}

/// One single-shot resolution. Failures are captured in the result, never
/// returned as errors.
async fn resolve_one(resolver: &dyn CnameResolver, domain: String, deadline: Duration) -> ResolutionResult {
    let outcome = match timeout(deadline, resolver.resolve_cname(&domain)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ResolutionFailure::Timeout),
    };

    let first_target = outcome.map(|targets| {
        targets
            .into_iter()
            .map(|t| t.trim().to_string())
            .find(|t| !t.is_empty())
    });

    match first_target {
        Ok(Some(target)) => {
            info!("CNAME found for {} is: {}", domain, target);
            ResolutionResult::resolved(domain, target)
        }
        Ok(None) => {
            warn!("No CNAME record found for: {}", domain);
            ResolutionResult::failed(domain, ResolutionFailure::NotFound)
        }
        Err(failure) => {
            warn!("No CNAME record found for: {} ({})", domain, failure);
            ResolutionResult::failed(domain, failure)
        }
    }
}
