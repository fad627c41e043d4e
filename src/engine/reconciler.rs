//! Orchestration of pull pages, push events and optimistic mutation.
//!
//! One reconciler runs per user session. It owns the page store, the
//! aggregate counters and the dedup ledger, and is the only component
//! allowed to mutate them.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::ledger::DedupLedger;
use super::store::PageStore;
use crate::api::{
    ApiError, CredentialProvider, FeedFetcher, FeedPage, MarkAllReadOutcome, MutationGateway,
};
use crate::config::EngineConfig;
use crate::model::{matches, FeedFilter, InboxStats, NotificationRecord, StatsDelta};
use crate::push::{PushEvent, ReceivedPayload, UpdatedPayload};

/// Error returned by reconciler operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A pull call failed; local state is unchanged apart from `last_error`.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A single-record mutation was rejected by the server. The optimistic
    /// local change has already been rolled back.
    #[error("mutation on record {id} was rejected, local change rolled back: {source}")]
    MutationFailed { id: String, source: ApiError },

    /// The bulk mark-all-read was rejected; every optimistic flip has been
    /// rolled back.
    #[error("bulk mark-all-read was rejected, local changes rolled back: {source}")]
    BulkMutationFailed { source: ApiError },
}

/// Push channel state as the engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// Channel open, events flowing.
    Connected,
    /// Channel just (re)opened; the catch-up refetch is still running.
    Reconciling,
}

/// How a fetched page is folded into the store.
#[derive(Clone, Copy)]
enum PageApply {
    Replace,
    Append,
}

/// Everything that can change over the life of a session, behind one lock.
struct SessionState {
    store: PageStore,
    stats: InboxStats,
    ledger: DedupLedger,
    filter: FeedFilter,
    /// Bumped on every page fetch issue; completions carrying an older
    /// value are discarded instead of overwriting fresher state.
    generation: u64,
    /// Bumped on exact local counter writes (all-read sweeps); stats
    /// fetches issued before such a write are discarded on completion.
    stats_epoch: u64,
    /// Generation of the page fetch currently in flight, if any.
    pending_fetch: Option<u64>,
    has_more: bool,
    connection: ConnectionState,
    last_error: Option<String>,
}

/// Keeps the local inbox view consistent with the server.
///
/// Feed pages and stats arrive through [`FeedFetcher`], state changes
/// through push events, and local mutations go out through
/// [`MutationGateway`] with an optimistic local change that is rolled back
/// if the server rejects the call.
pub struct Reconciler {
    owner: String,
    fetcher: Arc<dyn FeedFetcher>,
    gateway: Arc<dyn MutationGateway>,
    credentials: Arc<dyn CredentialProvider>,
    state: RwLock<SessionState>,
}

impl Reconciler {
    pub fn new(
        owner: impl Into<String>,
        config: &EngineConfig,
        fetcher: Arc<dyn FeedFetcher>,
        gateway: Arc<dyn MutationGateway>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let filter = FeedFilter {
            limit: config.page_limit,
            ..FeedFilter::default()
        };
        Self {
            owner: owner.into(),
            fetcher,
            gateway,
            credentials,
            state: RwLock::new(SessionState {
                store: PageStore::new(config.page_limit),
                stats: InboxStats::default(),
                ledger: DedupLedger::new(config.dedup_capacity),
                filter,
                generation: 0,
                stats_epoch: 0,
                pending_fetch: None,
                has_more: false,
                connection: ConnectionState::Disconnected,
                last_error: None,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Pull operations
    // ------------------------------------------------------------------

    /// Install a new filter. A change in any field but `page` resets to
    /// page 1 and replaces the page and the stats; a page-only change is
    /// pagination and appends.
    pub async fn set_filter(&self, filter: FeedFilter) -> Result<(), EngineError> {
        let (filter, generation, apply) = {
            let mut state = self.state.write().await;
            state.last_error = None;
            state.generation += 1;
            state.pending_fetch = Some(state.generation);
            if filter.is_pagination_of(&state.filter) {
                (filter, state.generation, PageApply::Append)
            } else {
                let fresh = filter.with_page(1);
                state.filter = fresh.clone();
                (fresh, state.generation, PageApply::Replace)
            }
        };

        let page_result = self.run_page_fetch(filter, generation, apply).await;
        match apply {
            PageApply::Replace => {
                let stats_result = self.refresh_stats().await;
                page_result.and(stats_result)
            }
            PageApply::Append => page_result,
        }
    }

    /// Fetch the next page of the current filter and append it. Ignored
    /// while another fetch is in flight.
    pub async fn load_more(&self) -> Result<(), EngineError> {
        let (filter, generation) = {
            let mut state = self.state.write().await;
            if state.pending_fetch.is_some() {
                debug!("load_more ignored, a fetch is already in flight");
                return Ok(());
            }
            state.last_error = None;
            state.generation += 1;
            state.pending_fetch = Some(state.generation);
            (state.filter.next_page(), state.generation)
        };

        self.run_page_fetch(filter, generation, PageApply::Append).await
    }

    /// Full reconcile: refetch page 1 of the current filter and the stats.
    /// Used after reconnect and to retry after a failed fetch.
    pub async fn refresh(&self) -> Result<(), EngineError> {
        let (filter, generation) = {
            let mut state = self.state.write().await;
            state.last_error = None;
            state.generation += 1;
            state.pending_fetch = Some(state.generation);
            (state.filter.with_page(1), state.generation)
        };

        let page_result = self
            .run_page_fetch(filter, generation, PageApply::Replace)
            .await;
        let stats_result = self.refresh_stats().await;
        page_result.and(stats_result)
    }

    // ------------------------------------------------------------------
    // Optimistic mutations
    // ------------------------------------------------------------------

    /// Mark one record read: optimistic local flip, server confirmation,
    /// rollback of the flip if the server rejects.
    pub async fn mark_read(&self, id: &str) -> Result<(), EngineError> {
        let undo = {
            let mut state = self.state.write().await;
            state.last_error = None;
            let previous = state.store.get(id).map(|r| (r.is_read, r.read_at));
            let now = Utc::now().timestamp();
            state.store.patch(id, |r| r.mark_read(now));
            previous
        };

        let outcome = match self.confirm_mark_read(id).await {
            Ok(confirmed) => {
                let mut state = self.state.write().await;
                // Replace the optimistic guess with the server's record,
                // unless a concurrent delete already evicted it.
                if state.store.contains(id) {
                    state.store.upsert(confirmed);
                }
                Ok(())
            }
            Err(source) => {
                let mut state = self.state.write().await;
                if let Some((was_read, was_read_at)) = undo {
                    state.store.patch(id, |r| {
                        r.is_read = was_read;
                        r.read_at = was_read_at;
                    });
                }
                warn!("mark_read({}) rejected, rolled back: {}", id, source);
                Err(EngineError::MutationFailed {
                    id: id.to_string(),
                    source,
                })
            }
        };

        if let Err(e) = self.refresh_stats().await {
            warn!("Stats refresh after mark_read failed: {}", e);
        }
        outcome
    }

    /// Flip every record read: optimistic sweep over the page plus an
    /// exact `unread = 0`, then the bulk call, with full rollback on
    /// rejection.
    pub async fn mark_all_read(&self) -> Result<(), EngineError> {
        let (previous, unread_before) = {
            let mut state = self.state.write().await;
            state.last_error = None;
            let previous: Vec<(String, bool, Option<i64>)> = state
                .store
                .records()
                .iter()
                .map(|r| (r.id.clone(), r.is_read, r.read_at))
                .collect();
            let now = Utc::now().timestamp();
            state.store.patch_all(|r| r.mark_read(now));
            let unread_before = state.stats.unread;
            state.stats.unread = 0;
            state.stats_epoch += 1;
            (previous, unread_before)
        };

        let outcome = match self.confirm_mark_all_read().await {
            Ok(outcome) => {
                debug!("mark_all_read confirmed, {} flipped", outcome.modified_count);
                Ok(())
            }
            Err(source) => {
                let mut state = self.state.write().await;
                for (id, was_read, was_read_at) in previous {
                    state.store.patch(&id, |r| {
                        r.is_read = was_read;
                        r.read_at = was_read_at;
                    });
                }
                state.stats.unread = unread_before;
                state.stats_epoch += 1;
                warn!("mark_all_read rejected, rolled back: {}", source);
                Err(EngineError::BulkMutationFailed { source })
            }
        };

        if let Err(e) = self.refresh_stats().await {
            warn!("Stats refresh after mark_all_read failed: {}", e);
        }
        outcome
    }

    /// Archive one record. The record leaves the visible page immediately
    /// and is re-inserted if the server rejects the call.
    pub async fn archive(&self, id: &str) -> Result<(), EngineError> {
        let undo = {
            let mut state = self.state.write().await;
            state.last_error = None;
            state.store.remove(id)
        };

        let outcome = match self.confirm_archive(id).await {
            Ok(_) => Ok(()),
            Err(source) => {
                let mut state = self.state.write().await;
                if let Some(record) = undo {
                    state.store.upsert(record);
                }
                warn!("archive({}) rejected, rolled back: {}", id, source);
                Err(EngineError::MutationFailed {
                    id: id.to_string(),
                    source,
                })
            }
        };

        if let Err(e) = self.refresh_stats().await {
            warn!("Stats refresh after archive failed: {}", e);
        }
        outcome
    }

    /// Delete one record permanently, restoring it locally if the server
    /// rejects the call.
    pub async fn delete(&self, id: &str) -> Result<(), EngineError> {
        let undo = {
            let mut state = self.state.write().await;
            state.last_error = None;
            state.store.remove(id)
        };

        let outcome = match self.confirm_delete(id).await {
            Ok(()) => Ok(()),
            Err(source) => {
                let mut state = self.state.write().await;
                if let Some(record) = undo {
                    state.store.upsert(record);
                }
                warn!("delete({}) rejected, restored record: {}", id, source);
                Err(EngineError::MutationFailed {
                    id: id.to_string(),
                    source,
                })
            }
        };

        if let Err(e) = self.refresh_stats().await {
            warn!("Stats refresh after delete failed: {}", e);
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Push dispatch entries (called by the listener)
    // ------------------------------------------------------------------

    /// The push channel is open. Events missed while disconnected cannot
    /// be replayed, so every transition into connected reconciles.
    pub async fn handle_connected(&self, resumed: bool) {
        {
            let mut state = self.state.write().await;
            state.connection = ConnectionState::Reconciling;
        }
        if resumed {
            info!("Push channel resumed, reconciling");
        } else {
            debug!("Push channel connected");
        }
        if let Err(e) = self.refresh().await {
            warn!("Reconcile after connect failed: {}", e);
        }
        let mut state = self.state.write().await;
        state.connection = ConnectionState::Connected;
    }

    pub async fn handle_disconnected(&self) {
        let mut state = self.state.write().await;
        state.connection = ConnectionState::Disconnected;
        debug!("Push channel closed");
    }

    /// Apply one decoded push event.
    pub async fn handle_event(&self, event: PushEvent) {
        match event {
            PushEvent::Received(payload) => self.apply_received(payload).await,
            PushEvent::Updated(payload) => self.apply_updated(payload).await,
            PushEvent::Archived { id } => self.apply_archived(id).await,
            PushEvent::Deleted { id } => self.apply_deleted(id).await,
            PushEvent::AllRead => self.apply_all_read().await,
        }
    }

    // ------------------------------------------------------------------
    // Snapshot accessors
    // ------------------------------------------------------------------

    pub async fn records(&self) -> Vec<NotificationRecord> {
        self.state.read().await.store.records().to_vec()
    }

    pub async fn stats(&self) -> InboxStats {
        self.state.read().await.stats.clone()
    }

    pub async fn filter(&self) -> FeedFilter {
        self.state.read().await.filter.clone()
    }

    pub async fn has_more(&self) -> bool {
        self.state.read().await.has_more
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.state.read().await.connection
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn is_fetching(&self) -> bool {
        self.state.read().await.pending_fetch.is_some()
    }

    // ------------------------------------------------------------------
    // Event appliers
    // ------------------------------------------------------------------

    async fn apply_received(&self, payload: ReceivedPayload) {
        let mut state = self.state.write().await;
        // Check-then-mark stays atomic because both happen under the
        // write lock.
        if state.ledger.seen(&payload.id) {
            debug!("Duplicate received event skipped: {}", payload.id);
            return;
        }
        state.ledger.mark_seen(payload.id.clone());
        state
            .stats
            .apply_delta(&StatsDelta::received(payload.category, payload.priority));
        let record = payload.into_record(self.owner.clone());
        if matches(&record, &state.filter) {
            state.store.upsert(record);
        } else {
            // Counters move even when the record is not on the visible page
            debug!("Received event outside the active filter: {}", record.id);
        }
    }

    async fn apply_updated(&self, payload: UpdatedPayload) {
        {
            let mut state = self.state.write().await;
            let UpdatedPayload { id, is_read, read_at } = payload;
            let patched = state.store.patch(&id, |r| {
                if let Some(is_read) = is_read {
                    r.is_read = is_read;
                }
                if let Some(read_at) = read_at {
                    r.read_at = Some(read_at);
                }
            });
            if !patched {
                debug!("Updated event for a record outside the page: {}", id);
            }
        }
        // One updated event can stand for several distinct transitions,
        // so take the authoritative counters instead of guessing a delta.
        if let Err(e) = self.refresh_stats().await {
            warn!("Stats refresh after updated event failed: {}", e);
        }
    }

    async fn apply_archived(&self, id: String) {
        let refetch = {
            let mut state = self.state.write().await;
            // The visible page never shows archived records
            state.store.remove(&id);
            state.filter.is_read.is_some()
        };
        if refetch {
            if let Err(e) = self.refresh_stats().await {
                warn!("Stats refresh after archived event failed: {}", e);
            }
        }
    }

    async fn apply_deleted(&self, id: String) {
        {
            let mut state = self.state.write().await;
            state.store.remove(&id);
        }
        if let Err(e) = self.refresh_stats().await {
            warn!("Stats refresh after deleted event failed: {}", e);
        }
    }

    async fn apply_all_read(&self) {
        let mut state = self.state.write().await;
        let now = Utc::now().timestamp();
        state.store.patch_all(|r| r.mark_read(now));
        // Globally exhaustive sweep: unread is exactly zero, no refetch.
        // The epoch bump discards stats fetches issued before the sweep.
        state.stats.unread = 0;
        state.stats_epoch += 1;
    }

    // ------------------------------------------------------------------
    // Fetch plumbing
    // ------------------------------------------------------------------

    async fn run_page_fetch(
        &self,
        filter: FeedFilter,
        generation: u64,
        apply: PageApply,
    ) -> Result<(), EngineError> {
        let result = self.pull_page(&filter).await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!(
                "Discarding page fetch for superseded generation {} (live {})",
                generation, state.generation
            );
            return Ok(());
        }
        state.pending_fetch = None;
        match result {
            Ok(page) => {
                let capacity = page.limit * page.page.max(1) as usize;
                match apply {
                    PageApply::Replace => state.store.replace_page(page.records, capacity),
                    PageApply::Append => state.store.append_page(page.records, capacity),
                }
                state.has_more = page.has_more;
                state.filter = filter;
                state.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Feed page fetch failed: {}", e);
                state.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    async fn refresh_stats(&self) -> Result<(), EngineError> {
        let epoch = self.state.read().await.stats_epoch;

        let result = self.pull_stats().await;

        let mut state = self.state.write().await;
        match result {
            Ok(stats) => {
                if state.stats_epoch != epoch {
                    debug!("Discarding stats fetch superseded by an exact local write");
                    return Ok(());
                }
                state.stats.replace(stats);
                Ok(())
            }
            Err(e) => {
                warn!("Stats fetch failed: {}", e);
                state.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    async fn pull_page(&self, filter: &FeedFilter) -> Result<FeedPage, ApiError> {
        let credential = self.credentials.credential().await?;
        self.fetcher.fetch_page(&credential, filter).await
    }

    async fn pull_stats(&self) -> Result<InboxStats, ApiError> {
        let credential = self.credentials.credential().await?;
        self.fetcher.fetch_stats(&credential).await
    }

    async fn confirm_mark_read(&self, id: &str) -> Result<NotificationRecord, ApiError> {
        let credential = self.credentials.credential().await?;
        self.gateway.mark_read(&credential, id).await
    }

    async fn confirm_mark_all_read(&self) -> Result<MarkAllReadOutcome, ApiError> {
        let credential = self.credentials.credential().await?;
        self.gateway.mark_all_read(&credential).await
    }

    async fn confirm_archive(&self, id: &str) -> Result<NotificationRecord, ApiError> {
        let credential = self.credentials.credential().await?;
        self.gateway.archive(&credential, id).await
    }

    async fn confirm_delete(&self, id: &str) -> Result<(), ApiError> {
        let credential = self.credentials.credential().await?;
        self.gateway.delete(&credential, id).await
    }
}
