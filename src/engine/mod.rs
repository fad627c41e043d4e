//! The synchronization engine: page store, dedup ledger and reconciler.

mod ledger;
mod reconciler;
mod store;

pub use ledger::DedupLedger;
pub use reconciler::{ConnectionState, EngineError, Reconciler};
pub use store::PageStore;
