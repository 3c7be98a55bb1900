//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! URLs disallowed for our user agent are never fetched.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::{user_agent_token, ParsedRobots};

use reqwest::Client;

/// Fetches robots.txt for an origin
///
/// A missing file, a non-success status, or a transport failure all mean the
/// origin has no restrictions.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `origin` - `scheme://host[:port]` of the site
pub async fn fetch_robots(client: &Client, origin: &str) -> ParsedRobots {
    let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));
    tracing::debug!("Fetching {}", robots_url);

    let response = match client.get(&robots_url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Could not fetch {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!("{} returned {}", robots_url, response.status());
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(content) => ParsedRobots::from_content(&content),
        Err(e) => {
            tracing::warn!("Could not read {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}
