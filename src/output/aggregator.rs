//! Report aggregation
//!
//! Findings are collected in arrival order while the crawl runs. Provenance and
//! ordering are only applied in [`ReportAggregator::finalize`], once the redirect and
//! link graphs are complete.

use crate::audit::LinkTracker;
use crate::config::ReportConfig;
use crate::output::types::{Finding, FindingKind, Report};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Collects findings for one run
#[derive(Debug)]
pub struct ReportAggregator {
    root_url: String,
    started_at: DateTime<Utc>,
    successes: Vec<Finding>,
    warnings: Vec<Finding>,
    errors: Vec<Finding>,
    not_found: Vec<Finding>,
    timeouts: Vec<String>,
    mime_counts: BTreeMap<String, usize>,
    /// Errors, not-found and timeouts recorded so far
    failures: usize,
}

impl ReportAggregator {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            started_at: Utc::now(),
            successes: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            not_found: Vec::new(),
            timeouts: Vec::new(),
            mime_counts: BTreeMap::new(),
            failures: 0,
        }
    }

    /// Files a finding under its kind
    pub fn record(&mut self, finding: Finding) {
        if finding.kind.is_failure() {
            self.failures += 1;
        }
        match finding.kind {
            FindingKind::Error => self.errors.push(finding),
            FindingKind::Warning => self.warnings.push(finding),
            FindingKind::NotFound => self.not_found.push(finding),
            FindingKind::Timeout => self.timeouts.push(finding.url),
            FindingKind::Success => self.successes.push(finding),
        }
    }

    /// Records a fetched URL, counting its MIME type when known
    pub fn record_success(&mut self, url: &str, msg: &str, content_type: Option<&str>) {
        if let Some(mime) = content_type.map(mime_key).filter(|mime| !mime.is_empty()) {
            *self.mime_counts.entry(mime).or_default() += 1;
        }
        self.successes
            .push(Finding::new(FindingKind::Success, url, msg));
    }

    /// Attaches provenance, orders every list and produces the report
    ///
    /// `ignored` and `disallowed` are the URLs the fetch filter and robots.txt kept
    /// out of the crawl.
    pub fn finalize(
        self,
        tracker: &LinkTracker,
        limits: &ReportConfig,
        ignored: &BTreeSet<String>,
        disallowed: &BTreeSet<String>,
    ) -> Report {
        let Self {
            root_url,
            started_at,
            mut successes,
            mut warnings,
            mut errors,
            mut not_found,
            mut timeouts,
            mime_counts,
            failures,
        } = self;

        for finding in errors
            .iter_mut()
            .chain(not_found.iter_mut())
            .chain(warnings.iter_mut())
        {
            attach_provenance(finding, tracker, limits);
        }
        if limits.include_successes {
            for finding in successes.iter_mut() {
                attach_provenance(finding, tracker, limits);
            }
        }

        for list in [&mut successes, &mut warnings, &mut errors, &mut not_found] {
            list.sort_by(|a, b| a.url.cmp(&b.url));
        }
        timeouts.sort();


        Report {
            root_url,
            started_at,
            finished_at: Utc::now(),
            success_count: successes.len(),
            mime_counts,
            redirects: tracker.redirects().clone(),
            ignored: ignored.iter().cloned().collect(),
            disallowed: disallowed.iter().cloned().collect(),
            successes: limits.include_successes.then_some(successes),
            warnings,
            errors,
            not_found,
            timeouts,
            exit_code: failures,
        }
    }
}

/// Fills in `redirectFrom` and `linkedFrom` from the crawl graphs
///
/// Findings that were created with their own provenance are left as they are.
pub fn attach_provenance(finding: &mut Finding, tracker: &LinkTracker, limits: &ReportConfig) {
    if finding.has_own_provenance() {
        return;
    }

    let ancestry = tracker.ancestors_of(&finding.url, limits.max_redirects_from);
    if !ancestry.urls.is_empty() {
        let mut redirect_from = ancestry.urls;
        if ancestry.remaining > 0 {
            redirect_from.push(more_marker(ancestry.remaining));
        }
        finding.redirect_from = Some(redirect_from);
    }

    let links = tracker.links_to(&finding.url);
    if !links.is_empty() {
        finding.linked_from = Some(truncate_with_marker(links, limits.max_links_from));
    }
}

/// Keeps the first `limit` items and replaces the rest with an `and N more...` entry
///
/// A limit of 0 keeps everything.
///
/// # Examples
///
/// ```
/// use spider_audit::output::truncate_with_marker;
///
/// let items: Vec<String> = (1..=7).map(|i| format!("https://a/{}", i)).collect();
/// let truncated = truncate_with_marker(&items, 5);
/// assert_eq!(truncated.len(), 6);
/// assert_eq!(truncated[5], "and 2 more...");
/// ```
pub fn truncate_with_marker(items: &[String], limit: usize) -> Vec<String> {
    if limit == 0 || items.len() <= limit {
        return items.to_vec();
    }

    let mut kept = items[..limit].to_vec();
    kept.push(more_marker(items.len() - limit));
    kept
}

/// Lowercased content type with all whitespace removed
fn mime_key(content_type: &str) -> String {
    content_type
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn more_marker(remaining: usize) -> String {
    format!("and {} more...", remaining)
}
