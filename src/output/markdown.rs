//! Markdown report generation
//!
//! This module renders a human-readable markdown report: run information, summary
//! counts, every failing finding with its provenance, and the redirects observed.

use crate::output::types::{Finding, OutputResult, Report, ReportWriter};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes the report as a markdown file
#[derive(Debug, Clone)]
pub struct MarkdownReportWriter {
    path: PathBuf,
}

impl MarkdownReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportWriter for MarkdownReportWriter {
    fn write_report(&self, report: &Report) -> OutputResult<()> {
        let markdown = format_markdown_report(report);

        let mut file = File::create(&self.path)?;
        file.write_all(markdown.as_bytes())?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "markdown"
    }
}

/// Formats a report as markdown
pub fn format_markdown_report(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# Spider-Audit Report\n\n");

    // Run information
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Root URL**: {}\n", report.root_url));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        report.duration_seconds()
    ));
    md.push_str(&format!("- **Exit Code**: {}\n\n", report.exit_code));

    // Summary
    md.push_str("## Summary\n\n");
    md.push_str("| Category | Count |\n");
    md.push_str("|----------|-------|\n");
    md.push_str(&format!("| Successes | {} |\n", report.success_count));
    md.push_str(&format!("| Warnings | {} |\n", report.warnings.len()));
    md.push_str(&format!("| Errors | {} |\n", report.errors.len()));
    md.push_str(&format!("| Not Found | {} |\n", report.not_found.len()));
    md.push_str(&format!("| Timeouts | {} |\n", report.timeouts.len()));
    md.push_str(&format!("| Redirects | {} |\n", report.redirects.len()));
    md.push_str(&format!("| Ignored | {} |\n", report.ignored.len()));
    md.push_str(&format!(
        "| Disallowed by robots.txt | {} |\n\n",
        report.disallowed.len()
    ));

    if !report.mime_counts.is_empty() {
        md.push_str("## Content Types\n\n");
        md.push_str("| Content Type | Count |\n");
        md.push_str("|--------------|-------|\n");
        for (mime, count) in &report.mime_counts {
            md.push_str(&format!("| {} | {} |\n", mime, count));
        }
        md.push('\n');
    }

    push_findings(&mut md, "Errors", &report.errors);
    push_findings(&mut md, "Not Found", &report.not_found);

    if !report.timeouts.is_empty() {
        md.push_str(&format!("## Timeouts ({})\n\n", report.timeouts.len()));
        for url in &report.timeouts {
            md.push_str(&format!("- {}\n", url));
        }
        md.push('\n');
    }

    push_findings(&mut md, "Warnings", &report.warnings);

    if !report.redirects.is_empty() {
        md.push_str(&format!("## Redirects ({})\n\n", report.redirects.len()));
        md.push_str("| From | To |\n");
        md.push_str("|------|----|\n");
        for (from, to) in &report.redirects {
            md.push_str(&format!("| {} | {} |\n", from, to));
        }
        md.push('\n');
    }

    if report.is_clean() {
        md.push_str("No errors found.\n");
    }

    md
}

fn push_findings(md: &mut String, heading: &str, findings: &[Finding]) {
    if findings.is_empty() {
        return;
    }

    md.push_str(&format!("## {} ({})\n\n", heading, findings.len()));
    for finding in findings {
        md.push_str(&format!("- **{}**: {}\n", finding.url, finding.msg));
        if let Some(linked_from) = &finding.linked_from {
            md.push_str(&format!("  - Linked from: {}\n", linked_from.join(", ")));
        }
        if let Some(redirect_from) = &finding.redirect_from {
            md.push_str(&format!("  - Redirected from: {}\n", redirect_from.join(", ")));
        }
    }
    md.push('\n');
}
