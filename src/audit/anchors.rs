//! Anchor reconciliation
//!
//! Pages report the fragment identifiers they define (found anchors) and the
//! `#fragment` links they contain (expected anchors). Nothing is judged while the
//! crawl runs: the two sides are only compared in [`AnchorLedger::reconcile`], once
//! every page and redirect is known.

use crate::audit::graph::LinkTracker;
use crate::url::{resolve_href, split_fragment};
use std::collections::{BTreeMap, HashMap, HashSet};
use url::Url;

/// An expected anchor that the final target page does not define
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingAnchor {
    /// `final#fragment`, where the link really landed
    pub url: String,

    /// The link target before following redirects
    pub target: String,

    /// The page `target` redirects to, or `target` itself
    pub final_url: String,

    pub fragment: String,

    /// Last page seen linking to `target#fragment`
    pub referrer: String,

    /// Redirect hops from `target` to the final URL, each as `hop#fragment`
    pub redirect_chain: Vec<String>,
}

/// Found and expected anchors for one crawl run
#[derive(Debug, Default)]
pub struct AnchorLedger {
    /// page URL -> ids defined on that page
    found: HashMap<String, HashSet<String>>,

    /// target URL -> fragment -> referrer
    expected: BTreeMap<String, BTreeMap<String, String>>,
}

impl AnchorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `ids` into the anchors defined on `url`
    pub fn record_found_anchors<I>(&mut self, url: &str, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.found.entry(url.to_string()).or_default().extend(ids);
    }

    /// Registers the anchor an href on `referrer` expects to exist
    ///
    /// Hrefs without a fragment, or with an empty one, expect nothing. A bare
    /// `#fragment` (or an href whose URL part cannot be resolved) points back at the
    /// referring page itself. Links to non-http schemes are skipped.
    ///
    /// Returns true when an expectation was recorded. If the same `target#fragment`
    /// is linked from several pages, the last referrer wins.
    pub fn record_expected_anchor(&mut self, href: &str, referrer: &Url) -> bool {
        let (before, fragment) = split_fragment(href.trim());
        let fragment = match fragment {
            Some(fragment) if !fragment.is_empty() => fragment,
            _ => return false,
        };

        let target = if before.trim().is_empty() {
            strip_fragment(referrer)
        } else {
            match resolve_href(before, referrer) {
                Some(resolved) => resolved,
                None if links_elsewhere(before) => return false,
                None => strip_fragment(referrer),
            }
        };

        tracing::trace!(
            "Expecting #{} on {} (linked from {})",
            fragment,
            target,
            referrer
        );
        self.expected
            .entry(target.to_string())
            .or_default()
            .insert(fragment.to_string(), referrer.to_string());
        true
    }

    /// Compares expected anchors against found anchors after following redirects
    ///
    /// Targets for which `excluded` returns true (ignored or disallowed URLs, which
    /// were never fetched) are skipped. Results are ordered by target URL and then
    /// by fragment.
    pub fn reconcile<F>(&self, tracker: &LinkTracker, excluded: F) -> Vec<MissingAnchor>
    where
        F: Fn(&str) -> bool,
    {
        let mut missing = Vec::new();

        for (target, fragments) in &self.expected {
            if excluded(target) {
                tracing::debug!("Skipping anchors on excluded target {}", target);
                continue;
            }

            let resolved = tracker.resolve_chain(target);

            for (fragment, referrer) in fragments {
                if self.has_anchor(&resolved.final_url, fragment) {
                    continue;
                }

                missing.push(MissingAnchor {
                    url: format!("{}#{}", resolved.final_url, fragment),
                    target: target.clone(),
                    final_url: resolved.final_url.clone(),
                    fragment: fragment.clone(),
                    referrer: referrer.clone(),
                    redirect_chain: resolved
                        .chain
                        .iter()
                        .map(|hop| format!("{}#{}", hop, fragment))
                        .collect(),
                });
            }
        }

        missing
    }

    /// Number of distinct `target#fragment` expectations
    pub fn expected_count(&self) -> usize {
        self.expected.values().map(BTreeMap::len).sum()
    }

    /// Returns true if `url` is known to define `id`
    pub fn has_anchor(&self, url: &str, id: &str) -> bool {
        self.found.get(url).is_some_and(|ids| ids.contains(id))
    }
}

fn strip_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

/// True if `href` names a scheme that can never be fetched (`mailto:`, `ftp:`...)
fn links_elsewhere(href: &str) -> bool {
    match Url::parse(href.trim()) {
        Ok(url) => url.scheme() != "http" && url.scheme() != "https",
        Err(_) => false,
    }
}
