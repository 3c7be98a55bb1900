//! Spider-Audit: a link and anchor integrity auditor for crawled sites
//!
//! This crate crawls a site, tracks which fragment identifiers every page defines and
//! which ones its links expect, follows redirect chains, checks page titles, and
//! classifies every defect through URL pattern policies into a deterministic report
//! whose error count doubles as a CI exit code.

pub mod audit;
pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Spider-Audit operations
///
/// Crawl findings (broken links, missing anchors, bad titles) are never errors of
/// this type; they are report data. These errors only stop a run from starting or
/// from writing its output.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid seed URL {url}: {reason}")]
    InvalidSeed { url: String, reason: String },

    #[error("Invalid queue state transition for {url}: {from:?} -> {to:?}")]
    InvalidTransition {
        url: String,
        from: state::QueueItemState,
        to: state::QueueItemState,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Cannot extend config {path}: {message}")]
    Extends { path: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Spider-Audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use audit::AuditContext;
pub use config::Config;
pub use output::{Finding, FindingKind, Report};
pub use state::QueueItemState;
pub use url::{first_matching_pattern, normalize_url, root_url, PatternList};
