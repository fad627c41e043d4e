//! Feed filter and the shared match predicate.

use serde::{Deserialize, Serialize};

use super::record::{NotificationCategory, NotificationPriority, NotificationRecord};
use crate::config::DEFAULT_PAGE_LIMIT;

/// Filter for the paginated pull feed.
///
/// An immutable value: changing any field other than `page` invalidates the
/// current page store contents (full replace on the next fetch), while
/// bumping `page` alone appends. Page numbering starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<NotificationCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<NotificationPriority>,
    pub page: u32,
    pub limit: usize,
}

impl Default for FeedFilter {
    fn default() -> Self {
        Self {
            category: None,
            is_read: None,
            priority: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl FeedFilter {
    /// True when `other` differs from `self` in `page` only. Such a change
    /// is pagination (append), everything else is a new view (replace).
    pub fn is_pagination_of(&self, other: &FeedFilter) -> bool {
        self.category == other.category
            && self.is_read == other.is_read
            && self.priority == other.priority
            && self.limit == other.limit
    }

    /// Same filter pointed at the given page.
    pub fn with_page(&self, page: u32) -> FeedFilter {
        FeedFilter {
            page,
            ..self.clone()
        }
    }

    /// Same filter pointed at the next page.
    pub fn next_page(&self) -> FeedFilter {
        self.with_page(self.page + 1)
    }
}

/// Whether a record belongs on the page described by `filter`.
///
/// Used both when deciding store insertion for a push event and when
/// deciding whether an event warrants a refetch. Archived records never
/// match: the feed serves the inbox view, which archiving removes a record
/// from.
pub fn matches(record: &NotificationRecord, filter: &FeedFilter) -> bool {
    if record.is_archived {
        return false;
    }
    if let Some(category) = filter.category {
        if record.category != category {
            return false;
        }
    }
    if let Some(is_read) = filter.is_read {
        if record.is_read != is_read {
            return false;
        }
    }
    if let Some(priority) = filter.priority {
        if record.priority != priority {
            return false;
        }
    }
    true
}
