use clap::{ArgGroup, Parser, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

pub const DEFAULT_FINGERPRINTS: &str = "fingerprints/can-i-take-over-xyz_fingerprints.json";

#[derive(Parser, Debug)]
#[command(name = "subsnipe")]
#[command(version)]
#[command(about = "SubSnipe identifies potentially take-over-able subdomains", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["domain", "input"])))]
pub struct Cli {
    /// The domain to query crt.sh for subdomains. Example: test.com
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Newline-delimited file of subdomains to check instead of querying crt.sh
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Fingerprint database (can-i-take-over-xyz JSON)
    #[arg(long, default_value = DEFAULT_FINGERPRINTS)]
    pub fingerprints: PathBuf,

    /// Max concurrent CNAME lookups
    #[arg(short, long, default_value = "20")]
    pub concurrency: usize,

    /// Deadline for each CNAME lookup in milliseconds
    #[arg(long, default_value = "5000")]
    pub timeout: u64,

    /// Resolution backend
    #[arg(long, value_enum, default_value_t = ResolverKind::Dns)]
    pub resolver: ResolverKind,

    /// Nameserver to query (dns backend only). Defaults to the system configuration
    #[arg(long)]
    pub nameserver: Option<IpAddr>,

    /// Timeout for the crt.sh query in seconds
    #[arg(long, default_value = "60")]
    pub crtsh_timeout: u64,

    /// Report file
    #[arg(short, long, default_value = "output.md")]
    pub output: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Markdown)]
    pub format: ReportFormat,

    /// Also list subdomains without a CNAME record in the report
    #[arg(long)]
    pub include_no_record: bool,

    /// Save the candidate list to this file before resolving
    #[arg(long)]
    pub save_candidates: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResolverKind {
    /// Built-in async DNS client
    Dns,
    /// The `dig` utility
    Dig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Json,
}
