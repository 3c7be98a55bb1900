//! Finding classification
//!
//! Turns crawl events into findings through the configured URL pattern policies.
//! Every function here is pure over the event, the compiled policy and the root URL.

use crate::audit::anchors::MissingAnchor;
use crate::config::PolicyConfig;
use crate::output::{Finding, FindingKind};
use crate::url::PatternList;
use regex::Regex;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Status codes that are classified as HTTP failures
pub const HTTP_FAILURE_STATUS: RangeInclusive<u16> = 400..=510;

/// Why a fetch did not produce a usable response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server answered with a failing status
    HttpStatus,
    Timeout,
    Connection,
    /// The body could not be read to the end
    DataError,
    /// The body could not be decompressed
    Decode,
    ResourceTooLarge,
    Transport,
}

impl FailureKind {
    /// Crawl event name recorded on the finding
    pub fn event_name(&self) -> &'static str {
        match self {
            FailureKind::HttpStatus | FailureKind::Connection | FailureKind::Transport => {
                "fetch_error"
            }
            FailureKind::Timeout => "fetch_timeout",
            FailureKind::DataError => "fetch_data_error",
            FailureKind::Decode => "decode_error",
            FailureKind::ResourceTooLarge => "resource_too_large",
        }
    }
}

/// A failed fetch as reported by the crawl engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub message: String,
}

impl FetchFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// A response with a failing status code
    pub fn status(code: u16) -> Self {
        Self {
            kind: FailureKind::HttpStatus,
            status: Some(code),
            message: format!("Http code {}", code),
        }
    }

    pub fn with_status(mut self, code: u16) -> Self {
        self.status = Some(code);
        self
    }
}

/// Outcome of the fetch filter for one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDecision {
    Allowed,
    /// Matched this exclude pattern
    Excluded(String),
    /// Include patterns are configured and none matched
    NotIncluded,
}

impl FetchDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, FetchDecision::Allowed)
    }
}

/// URL pattern policies compiled once for a run
#[derive(Debug, Clone)]
pub struct Policy {
    root_url: String,
    exclude: PatternList,
    include: PatternList,
    http_warn_only: BTreeMap<u16, PatternList>,
    hash_warn_only: PatternList,
    title: Option<(String, Regex)>,
}

impl Policy {
    /// Compiles every pattern list of `config` with `root_url` substituted
    ///
    /// Warn-only keys that are not status codes and a title pattern that does not
    /// compile are dropped with a warning; a validated configuration has neither.
    pub fn new(config: &PolicyConfig, root_url: &str) -> Self {
        let http_warn_only = config
            .http_warn_only_patterns
            .iter()
            .filter_map(|(key, patterns)| match key.parse::<u16>() {
                Ok(code) => Some((code, PatternList::compile(patterns, root_url))),
                Err(_) => {
                    tracing::warn!("Ignoring warn-only patterns for non-status key '{}'", key);
                    None
                }
            })
            .collect();

        let title = config
            .title_pattern
            .as_ref()
            .and_then(|pattern| match Regex::new(pattern) {
                Ok(re) => Some((pattern.clone(), re)),
                Err(e) => {
                    tracing::warn!("Ignoring title pattern '{}': {}", pattern, e);
                    None
                }
            });

        Self {
            root_url: root_url.to_string(),
            exclude: PatternList::compile(&config.exclude_patterns, root_url),
            include: PatternList::compile(&config.include_patterns, root_url),
            http_warn_only,
            hash_warn_only: PatternList::compile(&config.hash_not_found_warn_only_patterns, root_url),
            title,
        }
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// Decides whether `url` may be fetched
    ///
    /// Exclude patterns are checked first and win over include patterns.
    pub fn fetch_decision(&self, url: &str) -> FetchDecision {
        if let Some(pattern) = self.exclude.first_match(url) {
            return FetchDecision::Excluded(pattern.to_string());
        }

        if !self.include.is_empty() && !self.include.matches(url) {
            return FetchDecision::NotIncluded;
        }

        FetchDecision::Allowed
    }

    /// Classifies a failing HTTP status
    ///
    /// Warn-only patterns for the status demote it to a warning. Otherwise a 404 is
    /// a not-found and anything else an error.
    pub fn classify_status(&self, url: &str, code: u16) -> Finding {
        if let Some(pattern) = self
            .http_warn_only
            .get(&code)
            .and_then(|patterns| patterns.first_match(url))
        {
            return Finding::new(
                FindingKind::Warning,
                url,
                format!("Ignoring {} as configured by {}", code, pattern),
            )
            .with_code(code);
        }

        let kind = if code == 404 {
            FindingKind::NotFound
        } else {
            FindingKind::Error
        };
        Finding::new(kind, url, format!("Http code {}", code)).with_code(code)
    }

    /// Classifies a failed fetch
    pub fn classify_fetch_failure(&self, url: &str, failure: &FetchFailure) -> Finding {
        if let Some(code) = failure.status.filter(|code| HTTP_FAILURE_STATUS.contains(code)) {
            return self.classify_status(url, code);
        }

        if failure.kind == FailureKind::Timeout {
            return Finding::new(FindingKind::Timeout, url, "Timed out")
                .with_event(failure.kind.event_name());
        }

        let msg = if failure.message.is_empty() {
            "Fetch error".to_string()
        } else {
            format!("Fetch error: {}", failure.message)
        };
        let finding = Finding::new(FindingKind::Error, url, msg).with_event(failure.kind.event_name());
        match failure.status {
            Some(code) => finding.with_code(code),
            None => finding,
        }
    }

    /// Classifies a request the HTTP client refused to make or follow
    pub fn classify_client_rejection(&self, url: &str, message: &str) -> Finding {
        Finding::new(FindingKind::Error, url, format!("Client error: {}", message))
            .with_event("fetch_client_error")
    }

    /// Classifies an anchor the final target page does not define
    ///
    /// Hash warn-only patterns are matched against the page the link lands on, after
    /// redirects.
    /// The finding carries its referrer and redirect chain as provenance.
    pub fn classify_missing_anchor(&self, missing: MissingAnchor) -> Finding {
        let finding = match self.hash_warn_only.first_match(&missing.final_url) {
            Some(pattern) => Finding::new(
                FindingKind::Warning,
                missing.url,
                format!("Ignoring hash not found as configured by {}", pattern),
            ),
            None => Finding::new(FindingKind::Error, missing.url, "Hash not found"),
        };

        finding.with_provenance(vec![missing.referrer], missing.redirect_chain)
    }

    /// Checks a page title against the configured title pattern
    ///
    /// A title mismatch is always an error.
    pub fn check_title(&self, url: &str, title: &str) -> Option<Finding> {
        let (pattern, re) = self.title.as_ref()?;
        if re.is_match(title) {
            return None;
        }

        Some(Finding::new(
            FindingKind::Error,
            url,
            format!("pattern: {} failed on title: {}", pattern, title),
        ))
    }

    /// Classifies a URL the crawl engine could not queue
    pub fn classify_queue_error(&self, url: &str, message: &str) -> Finding {
        Finding::new(FindingKind::Error, url, format!("Queue error: {}", message))
            .with_event("queue_error")
    }
}
