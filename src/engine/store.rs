//! Local cache of the currently visible feed page(s).

use crate::model::NotificationRecord;

/// Ordered, capacity-bounded cache of notification records.
///
/// Holds at most the records of the pages fetched so far, unique by id and
/// sorted by `created_at` descending after every operation. Ties keep the
/// relative order they were received in. Exclusively owned by one
/// reconciler; no internal locking.
#[derive(Debug, Clone)]
pub struct PageStore {
    records: Vec<NotificationRecord>,
    /// Capacity installed by the last replace/append, also applied to
    /// single-record inserts.
    limit: usize,
}

impl PageStore {
    pub fn new(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            limit,
        }
    }

    /// Discard current contents and install a fresh page.
    pub fn replace_page(&mut self, records: Vec<NotificationRecord>, limit: usize) {
        self.records.clear();
        self.limit = limit;
        self.merge(records);
    }

    /// Merge a further page into the current contents. Records whose id is
    /// already present are overwritten in place, novel ids are inserted.
    pub fn append_page(&mut self, records: Vec<NotificationRecord>, limit: usize) {
        self.limit = limit;
        self.merge(records);
    }

    /// Insert one record, or overwrite it in place if the id is known.
    pub fn upsert(&mut self, record: NotificationRecord) {
        self.merge(vec![record]);
    }

    /// Remove a record, returning it so the caller can undo the removal.
    /// Absent ids are a no-op; removal races with capacity eviction.
    pub fn remove(&mut self, id: &str) -> Option<NotificationRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    /// Apply a field-level update to one record. Returns whether the id
    /// was present.
    pub fn patch<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut NotificationRecord),
    {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                f(record);
                self.restore_order();
                true
            }
            None => false,
        }
    }

    /// Apply an update to every record, returning how many were touched.
    pub fn patch_all<F>(&mut self, mut f: F) -> usize
    where
        F: FnMut(&mut NotificationRecord),
    {
        for record in &mut self.records {
            f(record);
        }
        self.restore_order();
        self.records.len()
    }

    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn merge(&mut self, records: Vec<NotificationRecord>) {
        for record in records {
            match self.records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => self.records.push(record),
            }
        }
        self.restore_order();
        self.records.truncate(self.limit);
    }

    // Stable sort: equal timestamps keep arrival order.
    fn restore_order(&mut self) {
        self.records
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}
