//! Link and anchor audit core
//!
//! [`AuditContext`] is the single owner of all audit state for a crawl run. The crawl
//! engine feeds it events one at a time; calling [`AuditContext::finish`] consumes
//! the context, reconciles anchors and produces the [`Report`].
//!
//! # Example
//!
//! ```
//! use spider_audit::audit::{AuditContext, PageDocument, DocumentInspector};
//! use spider_audit::Config;
//! use url::Url;
//!
//! struct Fixed;
//!
//! impl DocumentInspector for Fixed {
//!     fn inspect(&self, _body: &[u8], _page_url: &Url) -> PageDocument {
//!         PageDocument {
//!             hrefs: vec!["#missing".to_string()],
//!             ..PageDocument::default()
//!         }
//!     }
//! }
//!
//! let seed = Url::parse("https://example.com/").unwrap();
//! let mut audit = AuditContext::new(seed.clone(), &Config::default(), Box::new(Fixed));
//! audit.page_fetched(&seed, "text/html", 200, b"<html></html>");
//!
//! let report = audit.finish();
//! assert_eq!(report.errors[0].msg, "Hash not found");
//! assert_eq!(report.exit_code, 1);
//! ```

mod anchors;
mod classify;
mod graph;

pub use anchors::{AnchorLedger, MissingAnchor};
pub use classify::{FailureKind, FetchDecision, FetchFailure, Policy, HTTP_FAILURE_STATUS};
pub use graph::{Ancestry, LinkTracker, RedirectChain, MAX_REDIRECT_HOPS};

use crate::config::{Config, ReportConfig};
use crate::output::{Finding, FindingKind, Report, ReportAggregator};
use crate::url::{is_same_host, root_url};
use std::collections::BTreeSet;
use url::Url;

/// What an HTML inspector extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDocument {
    /// Values of `id` attributes and `<a name>` attributes
    pub anchor_ids: BTreeSet<String>,

    /// Raw `href` values of `<a>` elements
    pub hrefs: Vec<String>,

    /// Text of the page `<title>`, if there is one
    pub title: Option<String>,

    /// Absolute URLs of linked resources to crawl
    pub resources: Vec<String>,
}

/// Extracts anchors, links and the title from a fetched page
pub trait DocumentInspector: Send {
    fn inspect(&self, body: &[u8], page_url: &Url) -> PageDocument;
}

/// Audit state for one crawl run
pub struct AuditContext {
    seed: Url,
    policy: Policy,
    limits: ReportConfig,
    inspector: Box<dyn DocumentInspector>,
    anchors: AnchorLedger,
    tracker: LinkTracker,
    aggregator: ReportAggregator,
    ignored: BTreeSet<String>,
    disallowed: BTreeSet<String>,
}

impl AuditContext {
    pub fn new(seed: Url, config: &Config, inspector: Box<dyn DocumentInspector>) -> Self {
        let root = root_url(&seed);
        tracing::debug!("Compiling policies for root URL {}", root);

        Self {
            policy: Policy::new(&config.policy, &root),
            limits: config.report.clone(),
            inspector,
            anchors: AnchorLedger::new(),
            tracker: LinkTracker::new(),
            aggregator: ReportAggregator::new(root),
            ignored: BTreeSet::new(),
            disallowed: BTreeSet::new(),
            seed,
        }
    }

    pub fn root_url(&self) -> &str {
        self.policy.root_url()
    }

    /// Applies the fetch filter to `url`
    ///
    /// Rejected URLs are remembered as ignored and their anchors are never checked.
    pub fn fetch_allowed(&mut self, url: &str) -> bool {
        match self.policy.fetch_decision(url) {
            FetchDecision::Allowed => true,
            FetchDecision::Excluded(pattern) => {
                if self.ignored.insert(url.to_string()) {
                    tracing::info!("Ignoring {} as configured by {}", url, pattern);
                }
                false
            }
            FetchDecision::NotIncluded => {
                if self.ignored.insert(url.to_string()) {
                    tracing::info!("Ignoring {}: no include pattern matches", url);
                }
                false
            }
        }
    }

    /// Remembers a URL that robots.txt kept out of the crawl
    pub fn record_disallowed(&mut self, url: &str) {
        if self.disallowed.insert(url.to_string()) {
            tracing::info!("Disallowed by robots.txt: {}", url);
        }
    }

    /// Handles a successfully fetched resource
    ///
    /// Anchors are collected from every HTML page. Titles, expected anchors and
    /// resources to crawl are only taken from pages on the seed host. Returns the
    /// resource URLs found on the page.
    pub fn page_fetched(
        &mut self,
        url: &Url,
        content_type: &str,
        status: u16,
        body: &[u8],
    ) -> Vec<String> {
        tracing::debug!("Fetched {} ({}, {} bytes)", url, status, body.len());
        self.aggregator
            .record_success(url.as_str(), "Fetched", Some(content_type));

        if !is_html(content_type) {
            return Vec::new();
        }

        let document = self.inspector.inspect(body, url);
        self.anchors
            .record_found_anchors(url.as_str(), document.anchor_ids);

        if !is_same_host(url, &self.seed) {
            return Vec::new();
        }

        if let Some(title) = &document.title {
            if let Some(finding) = self.policy.check_title(url.as_str(), title) {
                self.record(finding);
            }
        }

        for href in &document.hrefs {
            self.anchors.record_expected_anchor(href, url);
        }

        document.resources
    }

    /// Records that `from` answered with a redirect to `to`
    pub fn redirect_followed(&mut self, from: &str, to: &str) {
        tracing::debug!("Redirect {} -> {}", from, to);
        self.tracker.record_redirect(from, to);
        self.aggregator
            .record_success(from, &format!("Redirected to {}", to), None);
    }

    /// Records links from `page` to each of `urls`
    pub fn resources_discovered(&mut self, page: &str, urls: &[String]) {
        for url in urls {
            self.tracker.record_link(page, url);
        }
    }

    /// Handles a fetch that did not produce a usable page
    ///
    /// A status that is only warned about still counts as a success.
    pub fn fetch_failed(&mut self, url: &str, failure: &FetchFailure, content_type: Option<&str>) {
        let finding = self.policy.classify_fetch_failure(url, failure);
        if finding.kind == FindingKind::Warning {
            self.aggregator.record_success(url, "Fetched", content_type);
        }
        self.record(finding);
    }

    /// Handles a request the HTTP client refused to make or follow
    pub fn client_rejected(&mut self, url: &str, message: &str) {
        let finding = self.policy.classify_client_rejection(url, message);
        self.record(finding);
    }

    /// Handles a URL that could not be queued
    pub fn queue_error(&mut self, url: &str, message: &str) {
        let finding = self.policy.classify_queue_error(url, message);
        self.record(finding);
    }

    /// Ends the run: reconciles anchors and builds the report
    pub fn finish(mut self) -> Report {
        let missing = {
            let ignored = &self.ignored;
            let disallowed = &self.disallowed;
            self.anchors.reconcile(&self.tracker, |url| {
                ignored.contains(url) || disallowed.contains(url)
            })
        };
        tracing::info!(
            "Checked {} expected anchors, {} missing",
            self.anchors.expected_count(),
            missing.len()
        );

        for anchor in missing {
            let finding = self.policy.classify_missing_anchor(anchor);
            self.record(finding);
        }

        let report = self.aggregator.finalize(
            &self.tracker,
            &self.limits,
            &self.ignored,
            &self.disallowed,
        );
        tracing::info!(
            "Audit finished: {} successes, {} warnings, {} errors, {} not found, {} timeouts",
            report.success_count,
            report.warnings.len(),
            report.errors.len(),
            report.not_found.len(),
            report.timeouts.len()
        );
        report
    }

    fn record(&mut self, finding: Finding) {
        match finding.kind {
            FindingKind::Error | FindingKind::NotFound => {
                tracing::error!("{}: {}", finding.url, finding.msg)
            }
            FindingKind::Warning => tracing::warn!("{}: {}", finding.url, finding.msg),
            FindingKind::Timeout => tracing::warn!("{}: timed out", finding.url),
            FindingKind::Success => tracing::trace!("{}: {}", finding.url, finding.msg),
        }
        self.aggregator.record(finding);
    }
}

/// True for `text/html` content types, parameters allowed
fn is_html(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("text/html")
}
