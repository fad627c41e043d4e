//! Wire shapes exchanged with the backend over the pull query surface.

use serde::{Deserialize, Serialize};

use crate::model::NotificationRecord;

/// Opaque bearer credential attached to every call.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct Credential(pub String);

/// One page of the feed, newest records first.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub records: Vec<NotificationRecord>,
    /// 1-based page number this response covers.
    pub page: u32,
    /// Page size the server actually applied.
    pub limit: usize,
    /// Total records matching the filter, across all pages.
    pub total: u64,
    pub has_more: bool,
}

/// Server acknowledgement of a bulk mark-all-read command.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadOutcome {
    /// How many records the server flipped to read.
    pub modified_count: u64,
}
