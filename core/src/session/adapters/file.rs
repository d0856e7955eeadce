use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::session::provider::{SessionProvider, SessionStoreError};

/// Session record persisted as a single JSON file
///
/// A missing or blank file means no one is logged in.
#[derive(Debug, Clone)]
pub struct FileSessionProvider {
    path: PathBuf,
}

impl FileSessionProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionProvider for FileSessionProvider {
    async fn load(&self) -> Result<Option<String>, SessionStoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionStoreError::StorageError(format!(
                "Failed to read session file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn store(&self, raw: String) -> Result<(), SessionStoreError> {
        // Ensure the directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                SessionStoreError::StorageError(format!(
                    "Failed to create session directory: {}",
                    e
                ))
            })?;
        }

        fs::write(&self.path, raw).await.map_err(|e| {
            SessionStoreError::StorageError(format!(
                "Failed to write session file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!("Wrote session file {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Removed session file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionStoreError::StorageError(format!(
                "Failed to remove session file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
