//! Aggregate inbox counters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::record::{NotificationCategory, NotificationPriority};

/// Aggregate counters summarizing the user's full notification set.
///
/// Server-derived (or locally adjusted) counts over the whole record set,
/// independent of what is currently paged into the store. After a full
/// resync they equal the server's own scan; between resyncs they may
/// legitimately diverge from a scan of the local page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxStats {
    pub total: u64,
    pub unread: u64,
    pub archived: u64,
    #[serde(default)]
    pub by_category: HashMap<NotificationCategory, u64>,
    #[serde(default)]
    pub by_priority: HashMap<NotificationPriority, u64>,
}

/// A signed adjustment to the aggregate counters.
///
/// Used for optimistic adjustment when a push event arrives whose kind does
/// not require a full stats refetch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsDelta {
    pub category: Option<NotificationCategory>,
    pub priority: Option<NotificationPriority>,
    pub total: i64,
    pub unread: i64,
    pub archived: i64,
}

impl StatsDelta {
    /// Delta for one newly received, unread notification.
    pub fn received(category: NotificationCategory, priority: NotificationPriority) -> Self {
        Self {
            category: Some(category),
            priority: Some(priority),
            total: 1,
            unread: 1,
            archived: 0,
        }
    }
}

impl InboxStats {
    /// Full overwrite from an authoritative fetch.
    pub fn replace(&mut self, stats: InboxStats) {
        *self = stats;
    }

    /// Adjust counters in place. Deltas may be negative; a delta that would
    /// drive a counter below zero clamps it to zero instead (upstream data
    /// should prevent this, but the engine must never underflow).
    pub fn apply_delta(&mut self, delta: &StatsDelta) {
        apply_signed(&mut self.total, delta.total);
        apply_signed(&mut self.unread, delta.unread);
        apply_signed(&mut self.archived, delta.archived);

        if let Some(category) = delta.category {
            apply_signed(self.by_category.entry(category).or_insert(0), delta.total);
        }
        if let Some(priority) = delta.priority {
            apply_signed(self.by_priority.entry(priority).or_insert(0), delta.total);
        }
    }
}

fn apply_signed(counter: &mut u64, delta: i64) {
    if delta >= 0 {
        *counter = counter.saturating_add(delta as u64);
    } else {
        *counter = counter.saturating_sub(delta.unsigned_abs());
    }
}
