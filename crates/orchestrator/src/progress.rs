//! Progress tracking

use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

use subsnipe_common::{ResolutionResult, RunStats};

pub struct ProgressTracker {
    total: Mutex<usize>,
    resolved: Mutex<usize>,
    failed: Mutex<usize>,
    started: Instant,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            total: Mutex::new(0),
            resolved: Mutex::new(0),
            failed: Mutex::new(0),
            started: Instant::now(),
        }
    }

    pub async fn set_total(&self, total: usize) {
        *self.total.lock().await = total;
    }

    /// Count one finished resolution.
    pub async fn record(&self, result: &ResolutionResult) {
        if result.target().is_some() {
            *self.resolved.lock().await += 1;
        } else {
            *self.failed.lock().await += 1;
        }
    }

    pub async fn snapshot(&self) -> RunStats {
        RunStats::new(
            *self.total.lock().await,
            *self.resolved.lock().await,
            *self.failed.lock().await,
            self.elapsed(),
        )
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub async fn print_summary(&self) {
        let stats = self.snapshot().await;

        info!("Resolution Summary:");
        info!("  Total candidates: {}", stats.total);
        info!("  CNAME found: {}", stats.resolved);
        info!("  No record: {}", stats.failed);
        if stats.total > 0 {
            info!(
                "  Hit rate: {:.1}%",
                (stats.resolved as f64 / stats.total as f64) * 100.0
            );
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
