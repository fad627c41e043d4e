//! In-memory backend double implementing the engine's trait seams.
//!
//! One [`FakeBackend`] plays all three collaborator roles (feed reads,
//! mutation writes, credential supply) over a single record set, so a test
//! can script server-side behavior and assert what the engine sent back.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Duration};

use inbox_engine::api::{
    ApiError, Credential, CredentialProvider, FeedFetcher, FeedPage, MarkAllReadOutcome,
    MutationGateway,
};
use inbox_engine::config::EngineConfig;
use inbox_engine::engine::{ConnectionState, Reconciler};
use inbox_engine::model::{matches, FeedFilter, InboxStats, NotificationRecord};
use inbox_engine::push::{ChannelSignal, PushListener};

use super::fixtures::OWNER;

pub const TEST_CREDENTIAL: &str = "bearer-test-credential";

#[derive(Default)]
struct BackendState {
    records: Vec<NotificationRecord>,
    fail_next_credential: Option<ApiError>,
    fail_next_page: Option<ApiError>,
    fail_next_stats: Option<ApiError>,
    fail_next_mutation: Option<ApiError>,
    gate_next_page: Option<oneshot::Receiver<()>>,
    gate_next_stats: Option<oneshot::Receiver<()>>,
    page_calls: usize,
    stats_calls: usize,
    mutation_calls: usize,
}

pub struct FakeBackend {
    state: Mutex<BackendState>,
}

impl FakeBackend {
    pub fn new(records: Vec<NotificationRecord>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(BackendState {
                records,
                ..Default::default()
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    /// Add a record server-side, as if another producer wrote it.
    pub fn insert(&self, record: NotificationRecord) {
        self.lock().records.push(record);
    }

    /// Drop a record server-side without going through the gateway.
    pub fn remove(&self, id: &str) {
        self.lock().records.retain(|r| r.id != id);
    }

    pub fn record(&self, id: &str) -> Option<NotificationRecord> {
        self.lock().records.iter().find(|r| r.id == id).cloned()
    }

    /// Mutate one server-side record in place.
    pub fn mutate(&self, id: &str, change: impl FnOnce(&mut NotificationRecord)) {
        let mut state = self.lock();
        if let Some(record) = state.records.iter_mut().find(|r| r.id == id) {
            change(record);
        }
    }

    pub fn fail_next_credential(&self, error: ApiError) {
        self.lock().fail_next_credential = Some(error);
    }

    pub fn fail_next_page(&self, error: ApiError) {
        self.lock().fail_next_page = Some(error);
    }

    pub fn fail_next_stats(&self, error: ApiError) {
        self.lock().fail_next_stats = Some(error);
    }

    pub fn fail_next_mutation(&self, error: ApiError) {
        self.lock().fail_next_mutation = Some(error);
    }

    /// Hold the next page fetch until the returned sender fires.
    pub fn gate_next_page(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.lock().gate_next_page = Some(gate);
        release
    }

    /// Hold the next stats fetch until the returned sender fires.
    pub fn gate_next_stats(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.lock().gate_next_stats = Some(gate);
        release
    }

    pub fn page_calls(&self) -> usize {
        self.lock().page_calls
    }

    pub fn stats_calls(&self) -> usize {
        self.lock().stats_calls
    }

    pub fn mutation_calls(&self) -> usize {
        self.lock().mutation_calls
    }

    /// The counters a stats fetch would return right now.
    pub fn expected_stats(&self) -> InboxStats {
        compute_stats(&self.lock().records)
    }
}

fn check_credential(credential: &Credential) -> Result<(), ApiError> {
    if credential.0 == TEST_CREDENTIAL {
        Ok(())
    } else {
        Err(ApiError::rejected(401, "unknown credential"))
    }
}

fn compute_stats(records: &[NotificationRecord]) -> InboxStats {
    let mut stats = InboxStats {
        total: records.len() as u64,
        unread: records.iter().filter(|r| !r.is_read).count() as u64,
        archived: records.iter().filter(|r| r.is_archived).count() as u64,
        ..Default::default()
    };
    for record in records {
        *stats.by_category.entry(record.category).or_insert(0) += 1;
        *stats.by_priority.entry(record.priority).or_insert(0) += 1;
    }
    stats
}

#[async_trait]
impl FeedFetcher for FakeBackend {
    async fn fetch_page(
        &self,
        credential: &Credential,
        filter: &FeedFilter,
    ) -> Result<FeedPage, ApiError> {
        check_credential(credential)?;
        let (gate, failure) = {
            let mut state = self.lock();
            state.page_calls += 1;
            (state.gate_next_page.take(), state.fail_next_page.take())
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(error) = failure {
            return Err(error);
        }

        let state = self.lock();
        let mut visible: Vec<NotificationRecord> = state
            .records
            .iter()
            .filter(|r| matches(r, filter))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = visible.len() as u64;
        let start = (filter.page.max(1) as usize - 1) * filter.limit;
        let end = (start + filter.limit).min(visible.len());
        let records = if start < visible.len() {
            visible[start..end].to_vec()
        } else {
            Vec::new()
        };

        Ok(FeedPage {
            records,
            page: filter.page,
            limit: filter.limit,
            total,
            has_more: end < visible.len(),
        })
    }

    async fn fetch_stats(&self, credential: &Credential) -> Result<InboxStats, ApiError> {
        check_credential(credential)?;
        let (gate, failure) = {
            let mut state = self.lock();
            state.stats_calls += 1;
            (state.gate_next_stats.take(), state.fail_next_stats.take())
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(error) = failure {
            return Err(error);
        }
        Ok(compute_stats(&self.lock().records))
    }
}

#[async_trait]
impl MutationGateway for FakeBackend {
    async fn mark_read(
        &self,
        credential: &Credential,
        id: &str,
    ) -> Result<NotificationRecord, ApiError> {
        check_credential(credential)?;
        let mut state = self.lock();
        state.mutation_calls += 1;
        if let Some(error) = state.fail_next_mutation.take() {
            return Err(error);
        }
        let now = Utc::now().timestamp();
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiError::rejected(404, "unknown notification"))?;
        record.mark_read(now);
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn mark_all_read(&self, credential: &Credential) -> Result<MarkAllReadOutcome, ApiError> {
        check_credential(credential)?;
        let mut state = self.lock();
        state.mutation_calls += 1;
        if let Some(error) = state.fail_next_mutation.take() {
            return Err(error);
        }
        let now = Utc::now().timestamp();
        let mut modified_count = 0;
        for record in state.records.iter_mut().filter(|r| !r.is_read) {
            record.mark_read(now);
            record.updated_at = now;
            modified_count += 1;
        }
        Ok(MarkAllReadOutcome { modified_count })
    }

    async fn archive(
        &self,
        credential: &Credential,
        id: &str,
    ) -> Result<NotificationRecord, ApiError> {
        check_credential(credential)?;
        let mut state = self.lock();
        state.mutation_calls += 1;
        if let Some(error) = state.fail_next_mutation.take() {
            return Err(error);
        }
        let now = Utc::now().timestamp();
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiError::rejected(404, "unknown notification"))?;
        record.is_archived = true;
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn delete(&self, credential: &Credential, id: &str) -> Result<(), ApiError> {
        check_credential(credential)?;
        let mut state = self.lock();
        state.mutation_calls += 1;
        if let Some(error) = state.fail_next_mutation.take() {
            return Err(error);
        }
        let position = state
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ApiError::rejected(404, "unknown notification"))?;
        state.records.remove(position);
        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for FakeBackend {
    async fn credential(&self) -> Result<Credential, ApiError> {
        if let Some(error) = self.lock().fail_next_credential.take() {
            return Err(error);
        }
        Ok(Credential(TEST_CREDENTIAL.to_string()))
    }
}

/// Engine wired to `backend` for all three collaborator roles.
pub fn session(backend: &Arc<FakeBackend>) -> Arc<Reconciler> {
    session_with_config(backend, EngineConfig::default())
}

pub fn session_with_config(backend: &Arc<FakeBackend>, config: EngineConfig) -> Arc<Reconciler> {
    super::init_tracing();
    Arc::new(Reconciler::new(
        OWNER,
        &config,
        backend.clone(),
        backend.clone(),
        backend.clone(),
    ))
}

/// Run a listener for `engine` on a fresh channel, returning the sender.
pub fn spawn_listener(engine: Arc<Reconciler>) -> mpsc::Sender<ChannelSignal> {
    let (signals, receiver) = mpsc::channel(16);
    tokio::spawn(PushListener::new(engine).run(receiver));
    signals
}

/// Poll until `condition` holds, failing the test after about a second.
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within timeout");
}

pub async fn wait_for_connection(engine: &Reconciler, expected: ConnectionState) {
    for _ in 0..200 {
        if engine.connection_state().await == expected {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("connection never reached {:?}", expected);
}

pub async fn wait_for_record_count(engine: &Reconciler, count: usize) {
    for _ in 0..200 {
        if engine.records().await.len() == count {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("store never reached {} records", count);
}

pub async fn wait_for_unread(engine: &Reconciler, unread: u64) {
    for _ in 0..200 {
        if engine.stats().await.unread == unread {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("unread count never reached {}", unread);
}
