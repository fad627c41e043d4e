//! Backend-facing surface: wire models, trait seams and the error taxonomy.

mod client;
mod error;
mod models;

pub use client::{CredentialProvider, FeedFetcher, MutationGateway};
pub use error::ApiError;
pub use models::{Credential, FeedPage, MarkAllReadOutcome};

#[cfg(feature = "mock")]
pub use client::{MockCredentialProvider, MockFeedFetcher, MockMutationGateway};
