//! Configuration module for Spider-Audit
//!
//! This module handles loading, merging (`extends`), parsing, and validating TOML
//! configuration files.
//!
//! # Example
//!
//! ```no_run
//! use spider_audit::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("audit.toml")).unwrap();
//! println!("Exclude patterns: {:?}", config.policy.exclude_patterns);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, PolicyConfig, ReportConfig, DEFAULT_PROVENANCE_LIMIT};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
