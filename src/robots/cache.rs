//! Per-origin robots.txt cache
//!
//! Each origin's robots.txt is fetched at most once per run.

use crate::robots::{fetch_robots, ParsedRobots};
use reqwest::Client;
use std::collections::HashMap;
use url::Url;

/// robots.txt rules for every origin seen during a run
#[derive(Debug, Default)]
pub struct RobotsCache {
    /// origin (`scheme://host[:port]`) -> rules
    entries: HashMap<String, ParsedRobots>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks `url` against its origin's robots.txt, fetching it on first use
    pub async fn is_allowed(&mut self, client: &Client, url: &Url, user_agent: &str) -> bool {
        let origin = url.origin().ascii_serialization();

        if !self.entries.contains_key(&origin) {
            let robots = fetch_robots(client, &origin).await;
            self.entries.insert(origin.clone(), robots);
        }

        self.entries
            .get(&origin)
            .map_or(true, |robots| robots.is_allowed(url.as_str(), user_agent))
    }

    /// Number of origins whose robots.txt has been resolved
    pub fn origin_count(&self) -> usize {
        self.entries.len()
    }
}
