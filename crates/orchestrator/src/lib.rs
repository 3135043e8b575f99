//! Orchestrator - resolution pipeline and classification
//!
//! Candidates fan out to a concurrency-capped [`ResolverPool`]; results fan in
//! through a bounded queue to a single consumer that classifies each one and
//! records it in the [`Aggregator`].

mod aggregator;
mod classifier;
mod orchestrator;
mod pool;
mod progress;

#[cfg(test)]
mod test_support;

pub use aggregator::{Aggregator, Buckets};
pub use classifier::{Classified, Classifier};
pub use orchestrator::{Orchestrator, PipelineOutput, DEFAULT_QUEUE_CAPACITY};
pub use pool::{ResolverPool, DEFAULT_CONCURRENCY, DEFAULT_DEADLINE};
pub use progress::ProgressTracker;
