use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of `linkedFrom` / `redirectFrom` entries kept per finding
pub const DEFAULT_PROVENANCE_LIMIT: usize = 5;

/// Main configuration structure for Spider-Audit
///
/// Every section and field has a default, so an empty file (or no file at all) is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub policy: PolicyConfig,
    pub report: ReportConfig,
}

/// Crawl engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once
    pub max_concurrency: u32,

    /// Delay between dispatching two fetches (milliseconds)
    pub interval_ms: u64,

    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,

    /// Largest response body read, in bytes
    pub max_resource_size: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Accept invalid TLS certificates
    pub accept_invalid_certs: bool,

    /// Honor robots.txt of every origin fetched from
    pub respect_robots_txt: bool,

    /// Extra paths, relative to the seed URL, queued at start
    pub additional_paths: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            interval_ms: 100,
            timeout_ms: 180_000,
            max_resource_size: 16 * 1024 * 1024,
            user_agent: format!("spider-audit/{}", env!("CARGO_PKG_VERSION")),
            accept_invalid_certs: true,
            respect_robots_txt: true,
            additional_paths: Vec::new(),
        }
    }
}

/// URL pattern policies
///
/// Every list is an ordered sequence of regular expressions. `#{ROOT_URL}` (or
/// `#{ROOT}`) in a pattern is replaced with the crawl's root URL.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolicyConfig {
    /// URLs matching any of these are never fetched
    pub exclude_patterns: Vec<String>,

    /// When non-empty, only URLs matching one of these are fetched
    pub include_patterns: Vec<String>,

    /// Per-status warn-only patterns, keyed by three-digit status code ("404", "503")
    pub http_warn_only_patterns: BTreeMap<String, Vec<String>>,

    /// Missing anchors on matching target URLs are warnings instead of errors
    pub hash_not_found_warn_only_patterns: Vec<String>,

    /// Every crawled page's `<title>` must match this pattern
    pub title_pattern: Option<String>,
}

/// Report shaping configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReportConfig {
    /// Maximum `linkedFrom` entries per finding (0 = unlimited)
    pub max_links_from: usize,

    /// Maximum `redirectFrom` entries per finding (0 = unlimited)
    pub max_redirects_from: usize,

    /// Include the full list of successes in the report
    pub include_successes: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_links_from: DEFAULT_PROVENANCE_LIMIT,
            max_redirects_from: DEFAULT_PROVENANCE_LIMIT,
            include_successes: false,
        }
    }
}
