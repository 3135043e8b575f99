//! Certificate-transparency candidates from crt.sh

use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{info, instrument};

use crate::list::is_valid_hostname;
use crate::CandidateError;

const CRT_SH_URL: &str = "https://crt.sh/";

/// One certificate row of the crt.sh JSON output.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateEntry {
    #[serde(default)]
    pub common_name: Option<String>,
    /// Newline-separated SAN entries.
    #[serde(default)]
    pub name_value: Option<String>,
}

pub struct CrtShClient {
    client: reqwest::Client,
    base_url: String,
}

impl CrtShClient {
    pub fn new(timeout: Duration) -> Result<Self, CandidateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("subsnipe/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: CRT_SH_URL.to_string(),
        })
    }

    /// Point the client at a different crt.sh-compatible endpoint.
    pub fn with_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.base_url = url.into();
        self
    }

    /// Query crt.sh and return the unique names under `domain`, sorted.
    #[instrument(skip(self))]
    pub async fn fetch(&self, domain: &str) -> Result<Vec<String>, CandidateError> {
        info!("Querying crt.sh for subdomains... (may take a moment)");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", domain), ("output", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CandidateError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let entries: Vec<CertificateEntry> = serde_json::from_str(&body)?;
        let candidates = extract_candidates(&entries, domain);
        info!(
            "crt.sh returned {} certificate(s), {} unique name(s)",
            entries.len(),
            candidates.len()
        );
        Ok(candidates)
    }
}

/// Unique names under `root_domain` from certificate common names and SANs.
/// Wildcard prefixes are stripped; names outside the root are dropped.
pub fn extract_candidates(entries: &[CertificateEntry], root_domain: &str) -> Vec<String> {
    let root = normalize(root_domain);
    let suffix = format!(".{}", root);

    let names: BTreeSet<String> = entries
        .iter()
        .flat_map(|entry| {
            entry
                .common_name
                .iter()
                .map(String::as_str)
                .chain(entry.name_value.iter().flat_map(|v| v.lines()))
        })
        .map(normalize)
        .filter(|name| *name == root || name.ends_with(&suffix))
        .filter(|name| is_valid_hostname(name))
        .collect();

    names.into_iter().collect()
}

fn normalize(name: &str) -> String {
    let name = name.trim().to_ascii_lowercase();
    let name = name.strip_prefix("*.").unwrap_or(&name);
    name.strip_suffix('.').unwrap_or(name).to_string()
}
