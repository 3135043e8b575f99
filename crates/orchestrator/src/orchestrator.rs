// crates/orchestrator/src/orchestrator.rs
//! Orchestrator - runs the resolve -> classify -> aggregate pipeline

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use subsnipe_common::{CnameResolver, ReconJob, ResolutionResult, RunStats, SubsnipeError, SubsnipeResult};
use subsnipe_fingerprint::FingerprintStore;

use crate::aggregator::{Aggregator, Buckets};
use crate::classifier::Classifier;
use crate::pool::ResolverPool;
use crate::progress::ProgressTracker;

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Final buckets plus run counters, handed to the report renderer.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub buckets: Buckets,
    pub stats: RunStats,
}

/// Orchestrator coordinates the resolver pool and the single result consumer.
pub struct Orchestrator {
    pool: ResolverPool,
    classifier: Classifier,
    queue_capacity: usize,
}

impl Orchestrator {
    pub fn new(resolver: Arc<dyn CnameResolver>, store: Arc<FingerprintStore>) -> Self {
        Self {
            pool: ResolverPool::new(resolver),
            classifier: Classifier::new(store),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.pool = self.pool.with_concurrency(concurrency);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.pool = self.pool.with_deadline(deadline);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Run one job to completion.
    ///
    /// Completion is two-phase: every worker has delivered its result and the
    /// queue is closed, then the consumer has drained the queue. Only then are
    /// the buckets returned.
    #[instrument(skip(self, job), fields(job_id = %job.id, candidates = job.candidate_count()))]
    pub async fn run(&self, job: ReconJob) -> SubsnipeResult<PipelineOutput> {
        let expected = job.candidate_count();
        info!("Querying CNAME records for {} candidate(s)...", expected);

        let progress = Arc::new(ProgressTracker::new());
        progress.set_total(expected).await;

        let (tx, rx) = mpsc::channel::<ResolutionResult>(self.queue_capacity);
        let consumer = tokio::spawn(consume(rx, self.classifier.clone()));

        // `tx` moves into the pool and is dropped when it returns, closing the queue.
        let delivered = self.pool.run(job.candidates, tx, progress.clone()).await;

        let aggregator = consumer
            .await
            .map_err(|e| SubsnipeError::Pipeline(format!("result consumer failed: {}", e)))?;
        let delivered = delivered?;

        if delivered != expected || aggregator.recorded() != expected {
            return Err(SubsnipeError::Pipeline(format!(
                "expected {} classifications, resolved {} and classified {}",
                expected,
                delivered,
                aggregator.recorded()
            )));
        }

        progress.print_summary().await;
        info!("... Finished querying CNAMEs");

        Ok(PipelineOutput {
            buckets: aggregator.into_buckets(),
            stats: progress.snapshot().await,
        })
    }
}

/// Drain the result queue one item at a time; the only writer of the buckets.
async fn consume(mut rx: mpsc::Receiver<ResolutionResult>, classifier: Classifier) -> Aggregator {
    let mut aggregator = Aggregator::new();
    while let Some(result) = rx.recv().await {
        aggregator.record(classifier.classify(result));
    }
    aggregator
}
