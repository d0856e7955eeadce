use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use crate::session::provider::{SessionProvider, SessionStoreError};

/// In-memory implementation of SessionProvider
#[derive(Debug, Default)]
pub struct InMemorySessionProvider {
    raw: RwLock<Option<String>>,
    loads: AtomicUsize,
}

impl InMemorySessionProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider already holding `raw` as its session record
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: RwLock::new(Some(raw.into())),
            loads: AtomicUsize::new(0),
        }
    }

    /// Number of times the record has been read
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for InMemorySessionProvider {
    async fn load(&self) -> Result<Option<String>, SessionStoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let raw = self.raw.read().map_err(|e| {
            SessionStoreError::StorageError(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(raw.clone())
    }

    async fn store(&self, raw: String) -> Result<(), SessionStoreError> {
        let mut slot = self.raw.write().map_err(|e| {
            SessionStoreError::StorageError(format!("Failed to acquire write lock: {}", e))
        })?;
        *slot = Some(raw);
        debug!("Stored in-memory session record");
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        let mut slot = self.raw.write().map_err(|e| {
            SessionStoreError::StorageError(format!("Failed to acquire write lock: {}", e))
        })?;
        *slot = None;
        debug!("Cleared in-memory session record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_load() {
        let provider = InMemorySessionProvider::new();
        assert_eq!(provider.load().await.unwrap(), None);

        provider
            .store(r#"{"accessToken":"abc"}"#.to_string())
            .await
            .unwrap();
        assert_eq!(
            provider.load().await.unwrap().as_deref(),
            Some(r#"{"accessToken":"abc"}"#)
        );
        assert_eq!(provider.load_count(), 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let provider = InMemorySessionProvider::with_raw(r#"{"accessToken":"abc"}"#);
        provider.clear().await.unwrap();
        assert_eq!(provider.load().await.unwrap(), None);

        // Clearing twice is not an error
        provider.clear().await.unwrap();
    }
}
