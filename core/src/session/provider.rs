use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::ApiError;

/// Error type for session storage operations
#[derive(Error, Debug)]
pub enum SessionStoreError {
    /// The backing storage could not be read or written
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<SessionStoreError> for ApiError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::StorageError(msg) => ApiError::SessionStorage(msg),
        }
    }
}

/// Trait defining the interface for session storage
///
/// A provider owns a single slot holding the JSON-encoded session record,
/// written by the login flow.
#[async_trait]
pub trait SessionProvider: Send + Sync + Debug {
    /// Returns the raw session record, or `None` when nothing is stored
    async fn load(&self) -> Result<Option<String>, SessionStoreError>;

    /// Replaces the stored session record
    async fn store(&self, raw: String) -> Result<(), SessionStoreError>;

    /// Removes the stored session record, if any
    async fn clear(&self) -> Result<(), SessionStoreError>;
}

/// Type alias for Arc-wrapped SessionProvider trait objects
pub type SessionProviderRef = Arc<dyn SessionProvider>;
