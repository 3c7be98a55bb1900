//! Crawler module for fetching and inspecting a site
//!
//! This module contains the crawl engine the audit is driven by, including:
//! - HTTP fetching with size limits and manual redirect handling
//! - HTML inspection for anchors, links and titles
//! - Frontier scheduling and concurrency limiting
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{run_audit, Coordinator};
pub use fetcher::{build_http_client, fetch_url, FetchOutcome};
pub use parser::{parse_document, HtmlInspector};
pub use scheduler::{ScheduledFetch, Scheduler};
