//! Scheduler for managing the crawl frontier and concurrency
//!
//! This module handles:
//! - FIFO queue management for URLs to crawl
//! - Deduplication: every URL is queued at most once per run
//! - Global concurrency limiting via a semaphore
//! - Queue item state tracking with transition checks

use crate::state::QueueItemState;
use crate::AuditError;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

/// A URL handed out for fetching, with its concurrency permit
///
/// The slot is released when the permit is dropped, so moving it into the fetch
/// task frees the slot when the task ends, however it ends.
pub struct ScheduledFetch {
    pub url: Url,
    pub permit: OwnedSemaphorePermit,
}

/// Frontier, seen-set and concurrency limit for one crawl run
pub struct Scheduler {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
    frontier: VecDeque<Url>,
    states: HashMap<String, QueueItemState>,
}

impl Scheduler {
    /// Creates a scheduler allowing `max_concurrency` fetches in flight
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            frontier: VecDeque::new(),
            states: HashMap::new(),
        }
    }

    /// Adds a URL to the frontier
    ///
    /// Returns false if the URL was seen before, in any state.
    pub fn enqueue(&mut self, url: Url) -> bool {
        if self.is_seen(url.as_str()) {
            return false;
        }

        tracing::trace!("Queued {}", url);
        self.states
            .insert(url.as_str().to_string(), QueueItemState::Queued);
        self.frontier.push_back(url);
        true
    }

    /// Records a URL that will never be fetched
    pub fn mark_skipped(&mut self, url: &str, state: QueueItemState) {
        debug_assert!(state.is_skipped());
        self.states.entry(url.to_string()).or_insert(state);
    }

    /// Takes the next URL if a fetch slot is free
    ///
    /// Returns `Ok(None)` when the frontier is empty or every slot is in use.
    pub fn next_url(&mut self) -> Result<Option<ScheduledFetch>, AuditError> {
        if self.frontier.is_empty() {
            return Ok(None);
        }

        let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
            return Ok(None);
        };

        match self.frontier.pop_front() {
            Some(url) => {
                self.transition(url.as_str(), QueueItemState::Fetching)?;
                Ok(Some(ScheduledFetch { url, permit }))
            }
            None => Ok(None),
        }
    }

    /// Moves a URL to a new state, refusing illegal transitions
    pub fn transition(&mut self, url: &str, next: QueueItemState) -> Result<(), AuditError> {
        let current = self
            .states
            .get_mut(url)
            .ok_or_else(|| AuditError::InvalidTransition {
                url: url.to_string(),
                from: QueueItemState::Queued,
                to: next,
            })?;

        if !current.can_transition_to(next) {
            return Err(AuditError::InvalidTransition {
                url: url.to_string(),
                from: *current,
                to: next,
            });
        }

        *current = next;
        Ok(())
    }

    pub fn is_seen(&self, url: &str) -> bool {
        self.states.contains_key(url)
    }

    /// Returns the number of URLs in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns the number of fetches currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.max_concurrency - self.semaphore.available_permits()
    }

    /// Counts seen URLs per state
    pub fn state_counts(&self) -> HashMap<QueueItemState, usize> {
        let mut counts = HashMap::new();
        for state in self.states.values() {
            *counts.entry(*state).or_default() += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://example.com{}", path)).unwrap()
    }

    #[test]
    fn test_new_scheduler() {
        let scheduler = Scheduler::new(4);
        assert_eq!(scheduler.frontier_size(), 0);
        assert_eq!(scheduler.in_flight(), 0);
    }

    #[test]
    fn test_enqueue_deduplicates() {
        let mut scheduler = Scheduler::new(4);
        assert!(scheduler.enqueue(url("/a")));
        assert!(!scheduler.enqueue(url("/a")));
        assert!(scheduler.enqueue(url("/b")));

        assert_eq!(scheduler.frontier_size(), 2);
        assert_eq!(
            scheduler.state_counts().get(&QueueItemState::Queued),
            Some(&2)
        );
    }

    #[test]
    fn test_skipped_urls_are_never_queued() {
        let mut scheduler = Scheduler::new(4);
        scheduler.mark_skipped("https://example.com/private", QueueItemState::Ignored);

        assert!(!scheduler.enqueue(url("/private")));
        assert_eq!(scheduler.frontier_size(), 0);
    }

    #[test]
    fn test_fifo_order() {
        let mut scheduler = Scheduler::new(4);
        scheduler.enqueue(url("/first"));
        scheduler.enqueue(url("/second"));

        let first = scheduler.next_url().unwrap().unwrap();
        let second = scheduler.next_url().unwrap().unwrap();
        assert_eq!(first.url.path(), "/first");
        assert_eq!(second.url.path(), "/second");
        assert!(scheduler.next_url().unwrap().is_none());
    }

    #[test]
    fn test_concurrency_limit() {
        let mut scheduler = Scheduler::new(2);
        for i in 0..3 {
            scheduler.enqueue(url(&format!("/{}", i)));
        }

        let a = scheduler.next_url().unwrap().unwrap();
        let _b = scheduler.next_url().unwrap().unwrap();
        assert_eq!(scheduler.in_flight(), 2);
        assert!(scheduler.next_url().unwrap().is_none());
        assert_eq!(scheduler.frontier_size(), 1);

        drop(a);
        assert_eq!(scheduler.in_flight(), 1);
        assert!(scheduler.next_url().unwrap().is_some());
    }

    #[test]
    fn test_state_transitions() {
        let mut scheduler = Scheduler::new(1);
        scheduler.enqueue(url("/a"));
        let fetch = scheduler.next_url().unwrap().unwrap();
        assert_eq!(
            scheduler.state_counts().get(&QueueItemState::Fetching),
            Some(&1)
        );

        scheduler
            .transition(fetch.url.as_str(), QueueItemState::Fetched)
            .unwrap();
        let err = scheduler
            .transition(fetch.url.as_str(), QueueItemState::Failed)
            .unwrap_err();
        assert!(matches!(err, AuditError::InvalidTransition { .. }));
    }

    #[test]
    fn test_unknown_url_transition_fails() {
        let mut scheduler = Scheduler::new(1);
        assert!(scheduler
            .transition("https://example.com/never", QueueItemState::Fetched)
            .is_err());
    }

    #[test]
    fn test_state_counts() {
        let mut scheduler = Scheduler::new(1);
        scheduler.enqueue(url("/a"));
        scheduler.enqueue(url("/b"));
        scheduler.mark_skipped("https://example.com/c", QueueItemState::Disallowed);

        let counts = scheduler.state_counts();
        assert_eq!(counts.get(&QueueItemState::Queued), Some(&2));
        assert_eq!(counts.get(&QueueItemState::Disallowed), Some(&1));
    }
}
