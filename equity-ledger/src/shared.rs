//! Shared handle for serving the ledger to concurrent callers.
//!
//! One write lock guards the whole state, so a grant, its pool debit and the
//! employee update always land together.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::admin::EquityAdmin;
use crate::error::Result;
use crate::store::{SnapshotStore, StoreError};

#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<EquityAdmin>>,
}

impl SharedLedger {
    pub fn new(admin: EquityAdmin) -> Self {
        Self {
            inner: Arc::new(RwLock::new(admin)),
        }
    }

    /// Run a command with exclusive access.
    pub async fn command<T>(&self, f: impl FnOnce(&mut EquityAdmin) -> Result<T>) -> Result<T> {
        let mut admin = self.inner.write().await;
        f(&mut *admin)
    }

    /// Run a query with shared access.
    pub async fn query<T>(&self, f: impl FnOnce(&EquityAdmin) -> T) -> T {
        let admin = self.inner.read().await;
        f(&*admin)
    }

    /// Export under a read lock and hand the snapshot to the store.
    ///
    /// The lock is released before any I/O starts.
    pub async fn save_to(&self, store: &dyn SnapshotStore) -> std::result::Result<(), StoreError> {
        let snapshot = self.query(EquityAdmin::export_snapshot).await;
        store.save(&snapshot).await
    }

    /// Replace the state from the store. Returns `false` when the store is
    /// empty; the state is untouched on any error.
    pub async fn load_from(&self, store: &dyn SnapshotStore) -> std::result::Result<bool, StoreError> {
        let Some(snapshot) = store.load().await? else {
            return Ok(false);
        };
        self.command(|admin| admin.import_snapshot(snapshot)).await?;
        Ok(true)
    }

    /// Clone of the current state.
    pub async fn snapshot_state(&self) -> EquityAdmin {
        self.inner.read().await.clone()
    }
}
