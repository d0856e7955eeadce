//! Client-side session handling
//!
//! The session record is written by the login flow and read by the API client
//! before every authenticated call. Storage is abstracted behind the
//! `SessionProvider` trait so the client can be handed an in-memory fake in
//! tests and a file-backed store in the CLI.

pub mod adapters;
pub mod provider;
pub mod record;

pub use adapters::{FileSessionProvider, InMemorySessionProvider};
pub use provider::{SessionProvider, SessionProviderRef, SessionStoreError};
pub use record::{Role, SessionRecord, TokenClaims};

use crate::errors::{ApiError, ApiResult};

/// Reads and parses the current session record from `provider`.
///
/// An empty store and an unparseable record both yield `NoSession`.
pub async fn load_record(provider: &dyn SessionProvider) -> ApiResult<SessionRecord> {
    let raw = provider.load().await?.ok_or(ApiError::NoSession)?;
    SessionRecord::parse(&raw)
}

/// Resolves the bearer token from `provider`.
pub async fn resolve_token(provider: &dyn SessionProvider) -> ApiResult<String> {
    let record = load_record(provider).await?;
    record.token().map(str::to_string)
}
