//! CNAME lookups by shelling out to `dig +short`

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, instrument};

use subsnipe_common::{CnameResolver, ResolutionFailure};

/// Resolver backed by the external `dig` utility.
pub struct DigCnameResolver {
    binary: String,
    timeout: Duration,
}

impl DigCnameResolver {
    pub fn new(timeout: Duration) -> Self {
        Self {
            binary: "dig".to_string(),
            timeout,
        }
    }

    /// Use a different executable (path or name on `PATH`).
    pub fn with_binary<S: Into<String>>(mut self, binary: S) -> Self {
        self.binary = binary.into();
        self
    }

    /// Whether the configured executable can be started.
    pub async fn is_available(&self) -> bool {
        let probe = Command::new(&self.binary)
            .arg("-v")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();
        matches!(timeout(self.timeout, probe).await, Ok(Ok(_)))
    }
}

#[async_trait]
impl CnameResolver for DigCnameResolver {
    #[instrument(skip(self))]
    async fn resolve_cname(&self, domain: &str) -> Result<Vec<String>, ResolutionFailure> {
        let run = Command::new(&self.binary)
            .args(["+short", "CNAME", domain])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match timeout(self.timeout, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ResolutionFailure::Transport(format!(
                    "failed to run {}: {}",
                    self.binary, e
                )))
            }
            Err(_) => return Err(ResolutionFailure::Timeout),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("{} exited with {} for {}", self.binary, output.status, domain);
            return Err(ResolutionFailure::Transport(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        parse_short_output(&String::from_utf8_lossy(&output.stdout))
    }

    fn name(&self) -> &str {
        "dig"
    }
}

/// Parse `dig +short` output: one target per line, comments skipped.
fn parse_short_output(stdout: &str) -> Result<Vec<String>, ResolutionFailure> {
    let targets: Vec<String> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(';'))
        .map(str::to_string)
        .collect();

    if targets.is_empty() {
        Err(ResolutionFailure::NotFound)
    } else {
        Ok(targets)
    }
}
