//! Deterministic resolver doubles for pipeline tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use subsnipe_common::{CnameResolver, ResolutionFailure};

/// Answers from a fixed table; unknown names are `NotFound`.
#[derive(Default)]
pub struct StaticResolver {
    records: HashMap<String, Result<Vec<String>, ResolutionFailure>>,
}

impl StaticResolver {
    pub fn with(mut self, domain: &str, answer: Result<Vec<String>, ResolutionFailure>) -> Self {
        self.records.insert(domain.to_string(), answer);
        self
    }
}

#[async_trait]
impl CnameResolver for StaticResolver {
    async fn resolve_cname(&self, domain: &str) -> Result<Vec<String>, ResolutionFailure> {
        tokio::task::yield_now().await;
        self.records
            .get(domain)
            .cloned()
            .unwrap_or(Err(ResolutionFailure::NotFound))
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Sleeps on every call and records the peak number of concurrent calls.
pub struct CountingResolver {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingResolver {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CnameResolver for CountingResolver {
    async fn resolve_cname(&self, domain: &str) -> Result<Vec<String>, ResolutionFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        // Decrements even when the call is cancelled by a deadline.
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        Ok(vec![format!("{}.cdn.example.net.", domain)])
    }

    fn name(&self) -> &str {
        "counting"
    }
}
