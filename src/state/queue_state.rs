/// Queue item state definitions for tracking crawl progress
///
/// This module defines every state a URL can be in once the crawl engine has seen it.
use std::fmt;

/// Represents the current state of a URL in the crawl queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueItemState {
    // ===== Active States =====
    /// URL is queued and waiting to be fetched
    Queued,

    /// URL is currently being fetched
    Fetching,

    // ===== Terminal Success States =====
    /// URL was fetched and its response handed to the audit
    Fetched,

    /// URL answered with a redirect; the target was queued separately
    Redirected,

    // ===== Terminal Error States =====
    /// Fetch failed (HTTP error status, transport error, rejected response)
    Failed,

    /// Fetch timed out
    TimedOut,

    // ===== Terminal Skip States =====
    /// URL was rejected by the exclude/include fetch filter
    Ignored,

    /// URL was disallowed by robots.txt
    Disallowed,
}

impl QueueItemState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this URL may still be fetched or is being fetched
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Fetching)
    }

    /// Returns true if this URL was never fetched on purpose
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Ignored | Self::Disallowed)
    }

    /// Returns true if the transition `self -> next` is legal
    ///
    /// Skip states are assigned when a URL is first seen and never change.
    pub fn can_transition_to(&self, next: QueueItemState) -> bool {
        match self {
            Self::Queued => next == Self::Fetching,
            Self::Fetching => matches!(
                next,
                Self::Fetched | Self::Redirected | Self::Failed | Self::TimedOut
            ),
            _ => false,
        }
    }

    /// Converts the state to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Redirected => "redirected",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Ignored => "ignored",
            Self::Disallowed => "disallowed",
        }
    }

    /// Returns all possible queue item states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Queued,
            Self::Fetching,
            Self::Fetched,
            Self::Redirected,
            Self::Failed,
            Self::TimedOut,
            Self::Ignored,
            Self::Disallowed,
        ]
    }
}

impl fmt::Display for QueueItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
