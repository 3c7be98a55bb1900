//! Redirect and link graph tracker
//!
//! Built incrementally from crawl events. The forward redirect map resolves where a
//! link really lands; the reverse redirect index and the link graph only feed report
//! provenance. Every walk is bounded because the graphs come from network input.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Maximum number of redirect hops followed when resolving a chain
pub const MAX_REDIRECT_HOPS: usize = 32;

/// Result of following a redirect chain forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectChain {
    /// Where the chain ends: a URL with no outbound redirect, or where the walk stopped
    pub final_url: String,

    /// URLs passed through on the way, in order, excluding `final_url`
    pub chain: Vec<String>,
}

/// URLs that redirected into a target, capped with a count of the rest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ancestry {
    pub urls: Vec<String>,
    pub remaining: usize,
}

/// Tracks redirects and links observed during one crawl
#[derive(Debug, Default)]
pub struct LinkTracker {
    /// source -> destination, one entry per redirecting URL
    redirects: BTreeMap<String, String>,

    /// destination -> sources that redirected to it
    redirected_from: HashMap<String, Vec<String>>,

    /// target -> pages that linked to it, in discovery order
    links: HashMap<String, Vec<String>>,
}

impl LinkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `from` redirected to `to`
    ///
    /// If `from` was already recorded, the later redirect wins and `from` is moved
    /// to the new destination's reverse index.
    pub fn record_redirect(&mut self, from: &str, to: &str) {
        if let Some(previous) = self.redirects.insert(from.to_string(), to.to_string()) {
            if previous != to {
                if let Some(sources) = self.redirected_from.get_mut(&previous) {
                    sources.retain(|source| source != from);
                }
            } else {
                return;
            }
        }

        self.redirected_from
            .entry(to.to_string())
            .or_default()
            .push(from.to_string());
    }

    /// Records that `source` links to `target`
    pub fn record_link(&mut self, source: &str, target: &str) {
        self.links
            .entry(target.to_string())
            .or_default()
            .push(source.to_string());
    }

    /// Follows redirects forward from `start`
    ///
    /// The walk stops at a URL with no outbound redirect, when it would revisit a URL
    /// already on the chain, or after [`MAX_REDIRECT_HOPS`] hops. It always terminates.
    ///
    /// # Examples
    ///
    /// ```
    /// use spider_audit::audit::LinkTracker;
    ///
    /// let mut tracker = LinkTracker::new();
    /// tracker.record_redirect("https://a/old", "https://a/mid");
    /// tracker.record_redirect("https://a/mid", "https://a/new");
    ///
    /// let resolved = tracker.resolve_chain("https://a/old");
    /// assert_eq!(resolved.final_url, "https://a/new");
    /// assert_eq!(resolved.chain, vec!["https://a/old", "https://a/mid"]);
    /// ```
    pub fn resolve_chain(&self, start: &str) -> RedirectChain {
        let mut chain: Vec<String> = Vec::new();
        let mut current = start.to_string();

        while let Some(next) = self.redirect_target(&current) {
            if chain.contains(&current) {
                tracing::warn!("Redirect cycle detected at {}", current);
                break;
            }
            if chain.len() >= MAX_REDIRECT_HOPS {
                tracing::warn!(
                    "Redirect chain from {} exceeds {} hops, stopping at {}",
                    start,
                    MAX_REDIRECT_HOPS,
                    current
                );
                break;
            }

            chain.push(std::mem::replace(&mut current, next.to_string()));
        }

        RedirectChain {
            final_url: current,
            chain,
        }
    }

    /// Collects every URL that redirected into `url`, directly or transitively
    ///
    /// The reverse index is walked breadth-first with a visited set, so cycles are
    /// harmless and `url` itself is never reported. At most `max` URLs are returned
    /// (`0` means no limit); the number left out is reported in `remaining`.
    pub fn ancestors_of(&self, url: &str, max: usize) -> Ancestry {
        let mut ancestry = Ancestry::default();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        visited.insert(url);
        if let Some(sources) = self.redirected_from.get(url) {
            queue.extend(sources.iter().map(String::as_str));
        }

        while let Some(source) = queue.pop_front() {
            if !visited.insert(source) {
                continue;
            }

            if max == 0 || ancestry.urls.len() < max {
                ancestry.urls.push(source.to_string());
            } else {
                ancestry.remaining += 1;
            }

            if let Some(sources) = self.redirected_from.get(source) {
                queue.extend(sources.iter().map(String::as_str));
            }
        }

        ancestry
    }

    /// Pages that linked to `url`, in discovery order (duplicates kept)
    pub fn links_to(&self, url: &str) -> &[String] {
        self.links.get(url).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Where `url` redirected to, if it did
    pub fn redirect_target(&self, url: &str) -> Option<&str> {
        self.redirects.get(url).map(String::as_str)
    }

    /// Every redirect observed, ordered by source URL
    pub fn redirects(&self) -> &BTreeMap<String, String> {
        &self.redirects
    }
}
