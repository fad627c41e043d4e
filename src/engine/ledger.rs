//! Session-scoped dedup of push event ids.

use std::collections::{HashSet, VecDeque};

/// Bounded set of already-applied push identifiers.
///
/// The push channel delivers at least once, so the same event can arrive
/// twice; the ledger makes application idempotent. FIFO eviction, oldest
/// first, once `capacity` ids are remembered. Never persisted: a new
/// session starts from a full reconcile anyway.
#[derive(Debug, Clone)]
pub struct DedupLedger {
    ids: HashSet<String>,
    /// Insertion order, oldest at the front.
    queue: VecDeque<String>,
    capacity: usize,
}

impl DedupLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::new(),
            queue: VecDeque::new(),
            capacity,
        }
    }

    /// Whether this id was already applied this session.
    pub fn seen(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Remember an id, evicting the oldest when full.
    pub fn mark_seen(&mut self, id: impl Into<String>) {
        let id = id.into();
        if self.ids.contains(&id) {
            return;
        }

        self.ids.insert(id.clone());
        self.queue.push_back(id);

        while self.queue.len() > self.capacity {
            if let Some(oldest) = self.queue.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
