//! Snapshot persistence.
//!
//! Storage sits outside the command layer: commands mutate memory, and a
//! store saves or loads whole snapshots afterwards.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::EquityError;
use crate::snapshot::Snapshot;

/// Error types for snapshot storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored snapshot failed import validation
    #[error(transparent)]
    Import(#[from] EquityError),
}

/// Trait for persisting whole-state snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot, replacing any previous one.
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Load the last saved snapshot, `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Whether a snapshot has been saved.
    async fn exists(&self) -> bool;
}

/// Snapshot stored as pretty-printed JSON on disk.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous snapshot intact.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = snapshot.to_json_pretty()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), "Saved snapshot");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = Snapshot::from_json(&json)?;
        tracing::debug!(path = %self.path.display(), "Loaded snapshot");
        Ok(Some(snapshot))
    }

    async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }
}

/// In-memory store holding the serialized JSON, for tests and embedding.
#[derive(Clone, Default)]
pub struct MemoryStore {
    json: Arc<RwLock<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored JSON, if any.
    pub async fn raw(&self) -> Option<String> {
        self.json.read().await.clone()
    }

    /// Overwrite the stored JSON directly.
    pub async fn put_raw(&self, json: impl Into<String>) {
        *self.json.write().await = Some(json.into());
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string(snapshot)?;
        *self.json.write().await = Some(json);
        Ok(())
    }

    async fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let json = self.json.read().await;
        match json.as_deref() {
            Some(json) => Ok(Some(Snapshot::from_json(json)?)),
            None => Ok(None),
        }
    }

    async fn exists(&self) -> bool {
        self.json.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::EquityAdmin;
    use crate::config::EquityConfig;
    use crate::types::EmployeeStatus;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(!store.exists().await);
        assert!(store.load().await.unwrap().is_none());

        let mut admin = EquityAdmin::new(&EquityConfig::default()).unwrap();
        admin
            .add_employee("Alice", "Engineering", "P7", EmployeeStatus::Active)
            .unwrap();
        let snapshot = admin.export_snapshot();
        store.save(&snapshot).await.unwrap();

        assert!(store.exists().await);
        assert_eq!(store.load().await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_memory_store_rejects_bad_json() {
        let store = MemoryStore::new();
        store.put_raw(r#"{"employees": []}"#).await;
        assert!(matches!(
            store.load().await,
            Err(StoreError::Import(EquityError::ImportFormat(_)))
        ));
    }

    #[test]
    fn test_temp_path() {
        let store = JsonFileStore::new("/var/lib/equity/state.json");
        assert_eq!(
            store.temp_path(),
            PathBuf::from("/var/lib/equity/state.json.tmp")
        );
    }
}
