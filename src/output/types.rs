//! Report data model
//!
//! This module defines the findings produced during an audit, the final report, the
//! writer trait report sinks implement, and the errors they can return.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while writing a report
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Category a finding is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FindingKind {
    Error,
    Warning,
    NotFound,
    Timeout,
    Success,
}

impl FindingKind {
    /// Returns true for kinds that count towards the exit code
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            FindingKind::Error | FindingKind::NotFound | FindingKind::Timeout
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::Error => "error",
            FindingKind::Warning => "warning",
            FindingKind::NotFound => "not found",
            FindingKind::Timeout => "timeout",
            FindingKind::Success => "success",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classified observation about a URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Which report list the finding goes to
    #[serde(skip)]
    pub kind: FindingKind,

    pub url: String,

    pub msg: String,

    /// HTTP status code, when the finding came from a response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,

    /// Name of the crawl event the finding came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_from: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_from: Option<Vec<String>>,

    /// Set when provenance was supplied at creation and must not be recomputed
    #[serde(skip)]
    pub(crate) own_provenance: bool,
}

impl Finding {
    pub fn new(kind: FindingKind, url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            msg: msg.into(),
            code: None,
            event: None,
            linked_from: None,
            redirect_from: None,
            own_provenance: false,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Attaches provenance that replaces the graph-derived one
    ///
    /// Empty lists are left out of the serialized finding.
    pub fn with_provenance(mut self, linked_from: Vec<String>, redirect_from: Vec<String>) -> Self {
        self.linked_from = (!linked_from.is_empty()).then_some(linked_from);
        self.redirect_from = (!redirect_from.is_empty()).then_some(redirect_from);
        self.own_provenance = true;
        self
    }

    /// Returns true if the provenance was supplied when the finding was created
    pub fn has_own_provenance(&self) -> bool {
        self.own_provenance
    }
}

/// The final result of an audit run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub root_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// URLs fetched without a hard failure (warned statuses included)
    pub success_count: usize,

    /// Successes per response `Content-Type`
    pub mime_counts: BTreeMap<String, usize>,

    /// Every redirect observed, source -> destination
    pub redirects: BTreeMap<String, String>,

    /// URLs rejected by the exclude/include filter
    pub ignored: Vec<String>,

    /// URLs disallowed by robots.txt
    pub disallowed: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub successes: Option<Vec<Finding>>,

    pub warnings: Vec<Finding>,
    pub errors: Vec<Finding>,
    pub not_found: Vec<Finding>,
    pub timeouts: Vec<String>,

    /// errors + not found + timeouts
    pub exit_code: usize,
}

impl Report {
    /// Exit status for the process, saturated to what an exit code can carry
    pub fn process_exit_code(&self) -> u8 {
        self.exit_code.min(u8::MAX as usize) as u8
    }

    /// Returns true if nothing counted towards the exit code
    pub fn is_clean(&self) -> bool {
        self.exit_code == 0
    }

    /// Run duration in whole seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Counts-only view of the report
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            root_url: self.root_url.clone(),
            success_count: self.success_count,
            mime_counts: self.mime_counts.clone(),
            redirect_count: self.redirects.len(),
            ignored_count: self.ignored.len(),
            disallowed_count: self.disallowed.len(),
            warning_count: self.warnings.len(),
            error_count: self.errors.len(),
            not_found_count: self.not_found.len(),
            timeout_count: self.timeouts.len(),
            exit_code: self.exit_code,
        }
    }
}

/// Machine-readable summary of a report: counts per category and per MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub root_url: String,
    pub success_count: usize,
    pub mime_counts: BTreeMap<String, usize>,
    pub redirect_count: usize,
    pub ignored_count: usize,
    pub disallowed_count: usize,
    pub warning_count: usize,
    pub error_count: usize,
    pub not_found_count: usize,
    pub timeout_count: usize,
    pub exit_code: usize,
}

/// A sink a finished report can be written to
pub trait ReportWriter {
    /// Writes the whole report
    fn write_report(&self, report: &Report) -> OutputResult<()>;

    /// Short name used in log messages
    fn name(&self) -> &'static str;
}
