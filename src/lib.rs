//! Notification Inbox Synchronization Engine
//!
//! Keeps a user-local view of a notification inbox consistent against two
//! independent sources of truth: a paginated pull feed and an at-least-once
//! push event stream. Handles duplicate event delivery, optimistic mutation
//! with rollback, aggregate counter drift and reconciliation on reconnect.

pub mod api;
pub mod config;
pub mod engine;
pub mod model;
pub mod push;

// Re-export commonly used types for convenience
pub use api::{ApiError, CredentialProvider, FeedFetcher, MutationGateway};
pub use engine::{ConnectionState, EngineError, Reconciler};
pub use model::{FeedFilter, InboxStats, NotificationRecord};
pub use push::{ChannelSignal, PushListener};
