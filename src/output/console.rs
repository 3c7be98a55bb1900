//! Console rendering of a finished report

use crate::output::types::{Finding, Report};

/// Prints the report to stdout
///
/// Findings are always listed in full. With `verbose`, content type counts and
/// redirects are printed too.
pub fn print_report(report: &Report, verbose: bool) {
    println!("=== Spider-Audit Report: {} ===\n", report.root_url);

    println!("Overview:");
    println!("  Successes: {}", report.success_count);
    println!("  Warnings: {}", report.warnings.len());
    println!("  Errors: {}", report.errors.len());
    println!("  Not found: {}", report.not_found.len());
    println!("  Timeouts: {}", report.timeouts.len());
    println!("  Redirects: {}", report.redirects.len());
    println!("  Ignored: {}", report.ignored.len());
    println!("  Disallowed: {}", report.disallowed.len());
    println!("  Duration: {}s", report.duration_seconds());
    println!();

    if verbose && !report.mime_counts.is_empty() {
        println!("Content Types:");
        let mut counts: Vec<_> = report.mime_counts.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (mime, count) in counts {
            println!("  {}: {}", mime, count);
        }
        println!();
    }

    print_findings("Errors", &report.errors);
    print_findings("Not Found", &report.not_found);

    if !report.timeouts.is_empty() {
        println!("Timeouts ({}):", report.timeouts.len());
        for url in &report.timeouts {
            println!("  - {}", url);
        }
        println!();
    }

    print_findings("Warnings", &report.warnings);

    if verbose && !report.redirects.is_empty() {
        println!("Redirects ({}):", report.redirects.len());
        for (from, to) in &report.redirects {
            println!("  {} -> {}", from, to);
        }
        println!();
    }

    if report.is_clean() {
        println!("No errors found.");
    } else {
        println!("Exit code: {}", report.exit_code);
    }
}

fn print_findings(heading: &str, findings: &[Finding]) {
    if findings.is_empty() {
        return;
    }

    println!("{} ({}):", heading, findings.len());
    for line in finding_lines(findings) {
        println!("{}", line);
    }
    println!();
}

/// Formats findings as indented console lines
fn finding_lines(findings: &[Finding]) -> Vec<String> {
    let mut lines = Vec::new();
    for finding in findings {
        lines.push(format!("  - {} ({})", finding.url, finding.msg));
        if let Some(linked_from) = &finding.linked_from {
            lines.push(format!("      linked from: {}", linked_from.join(", ")));
        }
        if let Some(redirect_from) = &finding.redirect_from {
            lines.push(format!("      redirected from: {}", redirect_from.join(", ")));
        }
    }
    lines
}
