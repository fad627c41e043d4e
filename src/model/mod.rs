//! Notification data models: records, the feed filter, aggregate counters.

mod filter;
mod record;
mod stats;

pub use filter::{matches, FeedFilter};
pub use record::{
    NotificationCategory, NotificationPriority, NotificationRecord, PayloadData,
};
pub use stats::{InboxStats, StatsDelta};
