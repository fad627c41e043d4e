//! Trait seams over the backend: paginated feed reads and mutation commands.
//!
//! Implementations of these traits carry the actual HTTP (or test double)
//! plumbing; the engine only sees the contracts below.

use async_trait::async_trait;

use super::error::ApiError;
use super::models::{Credential, FeedPage, MarkAllReadOutcome};
use crate::model::{FeedFilter, InboxStats, NotificationRecord};

/// Read side of the backend: paginated feed and aggregate counters.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch one page of the feed for `filter` (its `page` field selects
    /// which page).
    async fn fetch_page(
        &self,
        credential: &Credential,
        filter: &FeedFilter,
    ) -> Result<FeedPage, ApiError>;

    /// Fetch the aggregate counters for the whole inbox.
    async fn fetch_stats(&self, credential: &Credential) -> Result<InboxStats, ApiError>;
}

/// Write side of the backend. Single-record calls return the record as the
/// server now holds it, so the caller can replace its optimistic guess.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait MutationGateway: Send + Sync {
    /// Flip a single record to read.
    async fn mark_read(
        &self,
        credential: &Credential,
        id: &str,
    ) -> Result<NotificationRecord, ApiError>;

    /// Flip every unread record to read.
    async fn mark_all_read(&self, credential: &Credential)
        -> Result<MarkAllReadOutcome, ApiError>;

    /// Archive a record. Archived records stay on the server but leave
    /// the visible feed.
    async fn archive(
        &self,
        credential: &Credential,
        id: &str,
    ) -> Result<NotificationRecord, ApiError>;

    /// Delete a record permanently.
    async fn delete(&self, credential: &Credential, id: &str) -> Result<(), ApiError>;
}

/// Source of the bearer credential attached to every backend call.
///
/// Kept as a trait so rotation (refresh, re-login) stays outside the
/// engine; the engine asks for a fresh value before each call.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credential(&self) -> Result<Credential, ApiError>;
}
