//! Shared test infrastructure.
//!
//! Tests should only import from this module: record fixtures plus an
//! in-memory [`FakeBackend`] standing in for the real backend.
#![allow(dead_code)]

mod fixtures;
mod server;

pub use fixtures::*;
pub use server::*;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Route engine logs to the test output, honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}
