//! Markdown and JSON report generation.
//!
//! Renders a [`Report`] from the coordinator. Terminal reports (no sources,
//! summarizer failure) are rendered the same way, with the failure message as
//! the body.

use crate::models::{Report, ReportStatus};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("# PlayerScope Report: {}\n\n", report.subject));
    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_body_section(report));
    output.push_str(&generate_sources_section(&report.status_report));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Format:** {}\n", report.format));
    section.push_str(&format!("- **Focus:** {}\n", report.mode));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Sources Used:** {}\n", report.source_count));
    section.push_str(&format!("- **Status:** {}\n", status_label(report.status)));
    section.push_str(&format!(
        "- **Source Health:** {} ({:.0}% live, {} fallback, {} failed)\n",
        report.health.rating(),
        report.health.live_rate(),
        report.health.fallback,
        report.health.failed
    ));
    section.push_str(&format!(
        "- **Processing Time:** {:.1}s\n",
        report.elapsed_seconds
    ));
    section.push('\n');

    section
}

fn status_label(status: ReportStatus) -> &'static str {
    match status {
        ReportStatus::Completed => "✅ Completed",
        ReportStatus::NoSources => "❌ No usable sources",
        ReportStatus::SummarizerFailed => "⚠️ Summarizer failed",
    }
}

fn generate_body_section(report: &Report) -> String {
    let heading = if report.status.is_success() {
        "## Summary"
    } else {
        "## Error"
    };

    format!("{}\n\n{}\n\n", heading, report.body.trim_end())
}

/// Generate the data source status section.
fn generate_sources_section(status_report: &str) -> String {
    format!("## Data Sources\n\n```text\n{}\n```\n\n", status_report)
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by PlayerScope*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}
