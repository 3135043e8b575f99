//! CNAME lookups over the DNS protocol (trust-dns)

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{instrument, trace};
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::rr::RecordType;
use trust_dns_resolver::TokioAsyncResolver;

use subsnipe_common::{CnameResolver, ResolutionFailure};

const DNS_PORT: u16 = 53;

/// Async DNS client resolving CNAME records, one attempt per query.
pub struct DnsCnameResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl DnsCnameResolver {
    /// Use the nameservers from the system configuration (`/etc/resolv.conf`).
    pub fn from_system_conf(timeout: Duration) -> Result<Self> {
        let (config, opts) = trust_dns_resolver::system_conf::read_system_conf()
            .context("Failed to read system DNS configuration")?;
        Ok(Self::build(config, opts, timeout))
    }

    /// Query a single explicit nameserver over UDP/TCP port 53.
    pub fn with_nameserver(nameserver: IpAddr, timeout: Duration) -> Self {
        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(&[nameserver], DNS_PORT, true),
        );
        Self::build(config, ResolverOpts::default(), timeout)
    }

    fn build(config: ResolverConfig, mut opts: ResolverOpts, timeout: Duration) -> Self {
        opts.timeout = timeout;
        opts.attempts = 1;
        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl CnameResolver for DnsCnameResolver {
    #[instrument(skip(self))]
    async fn resolve_cname(&self, domain: &str) -> Result<Vec<String>, ResolutionFailure> {
        // The resolver has its own timeout; this one also bounds connection setup.
        let lookup = match timeout(self.timeout, self.resolver.lookup(domain, RecordType::CNAME)).await {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => return Err(classify_error(&e)),
            Err(_) => return Err(ResolutionFailure::Timeout),
        };

        let targets: Vec<String> = lookup
            .record_iter()
            .filter(|record| record.record_type() == RecordType::CNAME)
            .filter_map(|record| record.data().map(|data| data.to_string()))
            .collect();
        trace!("{} CNAME record(s) for {}", targets.len(), domain);

        if targets.is_empty() {
            Err(ResolutionFailure::NotFound)
        } else {
            Ok(targets)
        }
    }

    fn name(&self) -> &str {
        "dns"
    }
}

fn classify_error(err: &ResolveError) -> ResolutionFailure {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => ResolutionFailure::NotFound,
        ResolveErrorKind::Timeout => ResolutionFailure::Timeout,
        _ => ResolutionFailure::Transport(err.to_string()),
    }
}
