//! State module for tracking crawl progress
//!
//! Every URL the crawl engine has seen carries a [`QueueItemState`]. The scheduler uses
//! it to deduplicate the frontier and to reject out-of-order transitions.

mod queue_state;

pub use queue_state::QueueItemState;
