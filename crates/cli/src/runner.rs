use anyhow::{Context, Result};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use subsnipe_candidates::{read_candidates, write_candidates, CrtShClient};
use subsnipe_common::{CnameResolver, ReconJob, SubsnipeError, VERSION};
use subsnipe_fingerprint::FingerprintStore;
use subsnipe_orchestrator::Orchestrator;
use subsnipe_resolver::{DigCnameResolver, DnsCnameResolver};

use crate::args::{Cli, ReportFormat, ResolverKind};
use crate::output::{print_summary, render_report, write_report, ReportMeta};

const DOCKER_OUTPUT_DIR: &str = "output";

/// Where the candidates for this run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    CrtSh(String),
    File(PathBuf),
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: CandidateSource,
    pub fingerprints: PathBuf,
    pub concurrency: usize,
    pub deadline: Duration,
    pub resolver: ResolverKind,
    pub nameserver: Option<IpAddr>,
    pub crtsh_timeout: Duration,
    pub output: PathBuf,
    pub format: ReportFormat,
    pub include_no_record: bool,
    pub save_candidates: Option<PathBuf>,
}

impl RunConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let running_env = std::env::var("RUNNING_ENVIRONMENT").ok();
        Self::from_cli_with_env(cli, running_env.as_deref())
    }

    fn from_cli_with_env(cli: Cli, running_env: Option<&str>) -> Result<Self> {
        if cli.concurrency == 0 {
            return Err(SubsnipeError::Config("concurrency must be at least 1".into()).into());
        }
        if cli.timeout == 0 {
            return Err(SubsnipeError::Config("timeout must be at least 1 ms".into()).into());
        }
        if cli.nameserver.is_some() && cli.resolver == ResolverKind::Dig {
            warn!("--nameserver only applies to the dns resolver, ignoring it");
        }

        let source = match (cli.domain, cli.input) {
            (Some(domain), _) => {
                let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
                if domain.is_empty() {
                    return Err(SubsnipeError::Config("domain must not be empty".into()).into());
                }
                CandidateSource::CrtSh(domain)
            }
            (None, Some(path)) => CandidateSource::File(path),
            (None, None) => {
                return Err(SubsnipeError::Config("either --domain or --input is required".into()).into())
            }
        };

        Ok(Self {
            source,
            fingerprints: cli.fingerprints,
            concurrency: cli.concurrency,
            deadline: Duration::from_millis(cli.timeout),
            resolver: cli.resolver,
            nameserver: cli.nameserver,
            crtsh_timeout: Duration::from_secs(cli.crtsh_timeout),
            output: resolve_output_path(&cli.output, running_env),
            format: cli.format,
            include_no_record: cli.include_no_record,
            save_candidates: cli.save_candidates,
        })
    }
}

/// Inside the container image reports go to the mounted `output/` volume.
fn resolve_output_path(output: &Path, running_env: Option<&str>) -> PathBuf {
    match running_env {
        Some("docker") if output.is_relative() => Path::new(DOCKER_OUTPUT_DIR).join(output),
        _ => output.to_path_buf(),
    }
}

pub async fn run(config: RunConfig) -> Result<()> {
    info!("Starting SubSnipe v{}...", VERSION);

    let store = FingerprintStore::load(&config.fingerprints)
        .await
        .with_context(|| format!("Failed to load fingerprints from {}", config.fingerprints.display()))?;
    info!("Loaded {} fingerprint(s)", store.len());

    let resolver = build_resolver(&config).await?;
    info!("Using {} resolver", resolver.name());

    let (candidates, root_domain) = collect_candidates(&config).await?;
    if let Some(path) = &config.save_candidates {
        write_candidates(path, &candidates)
            .await
            .map_err(SubsnipeError::from)?;
        info!("Saved {} candidate(s) to {}", candidates.len(), path.display());
    }

    if candidates.is_empty() {
        warn!("No candidate subdomains found, the report will be empty");
    }

    let mut job = ReconJob::new(candidates);
    if let Some(domain) = root_domain {
        job = job.with_root_domain(domain);
    }
    let meta = ReportMeta::from_job(&job);

    let orchestrator = Orchestrator::new(resolver, Arc::new(store))
        .with_concurrency(config.concurrency)
        .with_deadline(config.deadline);
    let output = orchestrator.run(job).await?;

    let report = render_report(&output, config.format, &meta, config.include_no_record)?;
    write_report(&config.output, &report).await?;
    print_summary(&output.stats, &output.buckets, &config.output);

    Ok(())
}

async fn build_resolver(config: &RunConfig) -> Result<Arc<dyn CnameResolver>> {
    match config.resolver {
        ResolverKind::Dns => {
            let resolver = match config.nameserver {
                Some(ip) => DnsCnameResolver::with_nameserver(ip, config.deadline),
                None => DnsCnameResolver::from_system_conf(config.deadline)
                    .context("Failed to read system resolver configuration")?,
            };
            Ok(Arc::new(resolver))
        }
        ResolverKind::Dig => {
            let resolver = DigCnameResolver::new(config.deadline);
            if !resolver.is_available().await {
                return Err(SubsnipeError::ResolverUnavailable(
                    "dig is not installed or not on PATH".into(),
                )
                .into());
            }
            Ok(Arc::new(resolver))
        }
    }
}

async fn collect_candidates(config: &RunConfig) -> Result<(Vec<String>, Option<String>)> {
    match &config.source {
        CandidateSource::CrtSh(domain) => {
            let client = CrtShClient::new(config.crtsh_timeout).map_err(SubsnipeError::from)?;
            let candidates = client
                .fetch(domain)
                .await
                .map_err(SubsnipeError::from)
                .with_context(|| format!("Failed to query crt.sh for {}", domain))?;
            Ok((candidates, Some(domain.clone())))
        }
        CandidateSource::File(path) => {
            let candidates = read_candidates(path).await.map_err(SubsnipeError::from)?;
            info!("Read {} candidate(s) from {}", candidates.len(), path.display());
            Ok((candidates, None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["subsnipe"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn config_from_domain() {
        let config = RunConfig::from_cli_with_env(cli(&["-d", "Test.com.", "--timeout", "250"]), None).unwrap();
        assert_eq!(config.source, CandidateSource::CrtSh("test.com".into()));
        assert_eq!(config.deadline, Duration::from_millis(250));
        assert_eq!(config.output, PathBuf::from("output.md"));
    }

    #[test]
    fn config_rejects_zero_values() {
        assert!(RunConfig::from_cli_with_env(cli(&["-d", "test.com", "-c", "0"]), None).is_err());
        assert!(RunConfig::from_cli_with_env(cli(&["-d", "test.com", "--timeout", "0"]), None).is_err());
    }

    #[test]
    fn docker_output_path() {
        assert_eq!(
            resolve_output_path(Path::new("output.md"), Some("docker")),
            PathBuf::from("output/output.md")
        );
        assert_eq!(resolve_output_path(Path::new("output.md"), None), PathBuf::from("output.md"));
        assert_eq!(
            resolve_output_path(Path::new("/tmp/report.md"), Some("docker")),
            PathBuf::from("/tmp/report.md")
        );
        assert_eq!(
            resolve_output_path(Path::new("output.md"), Some("local")),
            PathBuf::from("output.md")
        );
    }

    #[tokio::test]
    async fn missing_fingerprints_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let subs = dir.path().join("subs.txt");
        std::fs::write(&subs, "a.test\n").unwrap();
        let report = dir.path().join("report.md");

        let config = RunConfig::from_cli_with_env(
            cli(&[
                "-i",
                subs.to_str().unwrap(),
                "--fingerprints",
                dir.path().join("missing.json").to_str().unwrap(),
                "-o",
                report.to_str().unwrap(),
            ]),
            None,
        )
        .unwrap();

        let err = run(config).await.unwrap_err();
        assert!(err.to_string().contains("Failed to load fingerprints"));
        assert!(!report.exists());
    }

    #[tokio::test]
    async fn dns_resolver_with_explicit_nameserver() {
        let config = RunConfig::from_cli_with_env(
            cli(&["-d", "test.com", "--nameserver", "127.0.0.1", "--timeout", "100"]),
            None,
        )
        .unwrap();
        let resolver = build_resolver(&config).await.unwrap();
        assert_eq!(resolver.name(), "dns");
    }

    #[tokio::test]
    async fn empty_candidate_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let subs = dir.path().join("subs.txt");
        std::fs::write(&subs, "# nothing here\n").unwrap();

        let config = RunConfig::from_cli_with_env(cli(&["-i", subs.to_str().unwrap()]), None).unwrap();
        let (candidates, _) = collect_candidates(&config).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn candidates_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let subs = dir.path().join("subs.txt");
        std::fs::write(&subs, "a.test\nb.test\na.test\n").unwrap();

        let config = RunConfig::from_cli_with_env(cli(&["-i", subs.to_str().unwrap()]), None).unwrap();
        let (candidates, root) = collect_candidates(&config).await.unwrap();
        assert_eq!(candidates, vec!["a.test", "b.test"]);
        assert!(root.is_none());
    }

    #[tokio::test]
    async fn unreachable_nameserver_yields_no_record_report() {
        let dir = tempfile::tempdir().unwrap();
        let subs = dir.path().join("subs.txt");
        std::fs::write(&subs, "a.test\n").unwrap();
        let fingerprints = dir.path().join("fingerprints.json");
        std::fs::write(&fingerprints, r#"{"Shopify": {"cname": ["myshopify.com"], "vulnerable": true}}"#).unwrap();
        let report = dir.path().join("out").join("report.md");
        let saved = dir.path().join("saved.txt");

        let config = RunConfig::from_cli_with_env(
            cli(&[
                "-i",
                subs.to_str().unwrap(),
                "--fingerprints",
                fingerprints.to_str().unwrap(),
                "--nameserver",
                "127.0.0.1",
                "--timeout",
                "200",
                "--include-no-record",
                "--save-candidates",
                saved.to_str().unwrap(),
                "-o",
                report.to_str().unwrap(),
            ]),
            None,
        )
        .unwrap();

        run(config).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&report).unwrap(),
            "### No CNAME Record\n\n- No CNAME record found for: a.test\n\n"
        );
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), "a.test\n");
    }
}
