//! Output module for audit findings and reports
//!
//! This module handles:
//! - Collecting findings while a crawl runs and finalizing them into a [`Report`]
//! - Writing reports as JSON and markdown
//! - Printing a console summary

mod aggregator;
mod console;
mod json;
mod markdown;
mod types;

pub use aggregator::{attach_provenance, truncate_with_marker, ReportAggregator};
pub use console::print_report;
pub use json::JsonReportWriter;
pub use markdown::{format_markdown_report, MarkdownReportWriter};
pub use types::{
    Finding, FindingKind, OutputError, OutputResult, Report, ReportSummary, ReportWriter,
};
