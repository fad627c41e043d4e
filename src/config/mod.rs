//! Engine configuration.

use anyhow::{bail, Result};

/// Default page size for the pull feed.
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Default capacity of the dedup ledger.
pub const DEFAULT_DEDUP_CAPACITY: usize = 8192;

/// Tuning knobs for one inbox session.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Page size requested from the pull feed. Also bounds the page store:
    /// merges re-sort and trim to this many records.
    pub page_limit: usize,
    /// Capacity of the dedup ledger. Oldest identifiers are evicted once
    /// the cap is reached; size it generously relative to the expected
    /// event burst rate.
    pub dedup_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            dedup_capacity: DEFAULT_DEDUP_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.page_limit == 0 {
            bail!("page_limit must be greater than zero");
        }
        if self.dedup_capacity == 0 {
            bail!("dedup_capacity must be greater than zero");
        }
        Ok(())
    }
}
