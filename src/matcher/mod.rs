//! Rule-based quick replies.
//!
//! [`PatternMatcher`] answers common prompts (greetings, thanks, ...) with a
//! canned reply instead of invoking the model. To avoid echoing itself, it
//! remembers its last few replies in a [`RecentReplies`] window and picks
//! the first candidate not in that window.
//!
//! Only the first matching pattern is considered. If all of its candidates
//! were served recently the matcher yields nothing, even when a later pattern
//! would also match.

mod patterns;

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::telemetry;

pub use patterns::{Pattern, PatternSpec, PatternTable};

/// Default size of the repetition-avoidance window.
pub const DEFAULT_RECENT_WINDOW: usize = 5;

/// Bounded FIFO of recently served quick replies.
#[derive(Debug, Clone)]
pub struct RecentReplies {
    replies: VecDeque<String>,
    capacity: usize,
}

impl RecentReplies {
    pub fn new(capacity: usize) -> Self {
        Self {
            replies: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn contains(&self, reply: &str) -> bool {
        self.replies.iter().any(|r| r == reply)
    }

    /// Append a reply, returning the oldest one if the window overflowed.
    pub fn push(&mut self, reply: String) -> Option<String> {
        self.replies.push_back(reply);
        if self.replies.len() > self.capacity {
            self.replies.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    /// Replies from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.replies.iter().map(String::as_str)
    }
}

impl Default for RecentReplies {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_WINDOW)
    }
}

/// Matches prompts against a [`PatternTable`] and rotates canned replies.
pub struct PatternMatcher {
    table: PatternTable,
    recent: Mutex<RecentReplies>,
}

impl PatternMatcher {
    pub fn new(table: PatternTable, window: usize) -> Self {
        Self {
            table,
            recent: Mutex::new(RecentReplies::new(window)),
        }
    }

    /// Matcher over the built-in table with the default window.
    pub fn builtin() -> Self {
        Self::new(PatternTable::builtin(), DEFAULT_RECENT_WINDOW)
    }

    /// Find a quick reply for `prompt`.
    ///
    /// The prompt is lowercased (not trimmed) before matching. The window
    /// check and the append happen under one lock, so concurrent callers
    /// never pick the same candidate off a stale view of the window.
    pub fn match_prompt(&self, prompt: &str) -> Option<String> {
        let lowered = prompt.to_lowercase();
        let pattern = self.table.first_match(&lowered)?;

        let mut recent = self.recent();
        let Some(reply) = pattern.replies().iter().find(|r| !recent.contains(r)) else {
            debug!(pattern = pattern.as_str(), "all candidates served recently");
            return None;
        };
        let reply = reply.clone();
        recent.push(reply.clone());
        drop(recent);

        metrics::counter!(telemetry::QUICK_REPLIES_TOTAL).increment(1);
        debug!(pattern = pattern.as_str(), %reply, "quick reply");
        Some(reply)
    }

    /// Snapshot of the repetition-avoidance window.
    pub fn recent_replies(&self) -> RecentReplies {
        self.recent().clone()
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    fn recent(&self) -> MutexGuard<'_, RecentReplies> {
        self.recent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::builtin()
    }
}
