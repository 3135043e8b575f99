//! Report rendering and writing

use anyhow::{Context, Result};
use serde_json::json;
use std::fmt::Write as _;
use std::path::Path;
use std::time::{Duration, SystemTime};
use subsnipe_common::{Bucket, ReconJob, RunStats, SubsnipeError};
use subsnipe_orchestrator::{Buckets, PipelineOutput};
use tracing::info;

use crate::args::ReportFormat;

/// Section heading used in the markdown report.
fn section_title(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Exploitable => "Is Exploitable",
        Bucket::NotExploitable => "Not Exploitable",
        Bucket::Unknown => "Exploitability Unknown",
        Bucket::NoRecord => "No CNAME Record",
    }
}

/// Job details carried into the report, captured before the job is run.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub run_id: String,
    pub root_domain: Option<String>,
    pub started_at: SystemTime,
}

impl ReportMeta {
    pub fn from_job(job: &ReconJob) -> Self {
        Self {
            run_id: job.id.to_string(),
            root_domain: job.root_domain.clone(),
            started_at: job.created_at,
        }
    }
}

/// Render the report in the requested format.
pub fn render_report(
    output: &PipelineOutput,
    format: ReportFormat,
    meta: &ReportMeta,
    include_no_record: bool,
) -> Result<String> {
    match format {
        ReportFormat::Markdown => Ok(render_markdown(&output.buckets, include_no_record)),
        ReportFormat::Json => render_json(output, meta),
    }
}

/// One `###` section per non-empty bucket, each item a bullet.
fn render_markdown(buckets: &Buckets, include_no_record: bool) -> String {
    let mut out = String::new();
    for (bucket, lines) in buckets.sections(include_no_record) {
        let _ = writeln!(out, "### {}\n", section_title(bucket));
        for line in lines {
            let _ = writeln!(out, "- {}", line);
        }
        out.push('\n');
    }
    out
}

fn render_json(output: &PipelineOutput, meta: &ReportMeta) -> Result<String> {
    let started_at: chrono::DateTime<chrono::Utc> = meta.started_at.into();
    let report = json!({
        "run_id": meta.run_id,
        "root_domain": meta.root_domain,
        "started_at": started_at.to_rfc3339(),
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "stats": output.stats,
        "exploitable": output.buckets.exploitable,
        "not_exploitable": output.buckets.not_exploitable,
        "unknown": output.buckets.unknown,
        "no_record": output.buckets.no_record,
    });
    serde_json::to_string_pretty(&report)
        .map_err(|e| SubsnipeError::Report(format!("cannot encode JSON report: {}", e)).into())
}

/// Write the rendered report, creating the parent directory if needed.
pub async fn write_report(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Error creating output directory {}", parent.display()))?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Error creating output file {}", path.display()))?;
    info!("Results have been written to {}", path.display());
    Ok(())
}

/// Print a short bucket summary to stdout.
pub fn print_summary(stats: &RunStats, buckets: &Buckets, report_path: &Path) {
    println!("\n{:-<60}", "");
    println!("📊 Summary:");
    println!("  Subdomains checked: {}", stats.total);
    println!("  ⚠ Exploitable: {}", buckets.exploitable.len());
    println!("  ✓ Not exploitable: {}", buckets.not_exploitable.len());
    println!("  ? Unknown: {}", buckets.unknown.len());
    println!("  ⊘ No CNAME record: {}", buckets.no_record.len());
    println!("  ⏱️  Duration: {}", format_duration(Duration::from_millis(stats.elapsed_ms)));
    println!("  Report: {}", report_path.display());
    println!("{:-<60}\n", "");
}

/// Format duration in a human-readable way
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs == 0 {
        format!("{}ms", millis)
    } else if total_secs < 60 {
        if millis > 0 {
            format!("{}.{:03}s", total_secs, millis)
        } else {
            format!("{}s", total_secs)
        }
    } else {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    }
}
