//! Shared directory store with change notification.
//!
//! Holds the current [`ServiceDirectory`] behind an `RwLock` as an immutable
//! `Arc` snapshot, with a watch-based version channel so consumers can react
//! to reloads without polling. Readers take a snapshot and never observe a
//! half-applied replacement.

use super::ServiceDirectory;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, watch};

/// A shared, versioned view of the service directory.
pub struct DirectoryStore {
    inner: Arc<DirectoryStoreInner>,
}

struct DirectoryStoreInner {
    current: RwLock<Arc<ServiceDirectory>>,
    version: AtomicU64,
    version_tx: watch::Sender<u64>,
}

/// Receives notifications when the directory is replaced.
pub struct DirectoryWatcher {
    version_rx: watch::Receiver<u64>,
}

impl DirectoryStore {
    pub fn new(initial: ServiceDirectory) -> Self {
        let (version_tx, _) = watch::channel(0u64);
        Self {
            inner: Arc::new(DirectoryStoreInner {
                current: RwLock::new(initial.into_shared()),
                version: AtomicU64::new(0),
                version_tx,
            }),
        }
    }

    /// The current directory snapshot. Cheap (`Arc` clone); hold it for the
    /// duration of one operation rather than caching it.
    pub async fn snapshot(&self) -> Arc<ServiceDirectory> {
        self.inner.current.read().await.clone()
    }

    /// Replace the directory wholesale and notify watchers. Used by the
    /// SIGHUP reload path.
    pub async fn replace(&self, directory: ServiceDirectory) {
        let mut guard = self.inner.current.write().await;
        *guard = directory.into_shared();
        let new_version = self.inner.version.fetch_add(1, Ordering::Relaxed) + 1;
        drop(guard);
        let _ = self.inner.version_tx.send(new_version);
    }

    /// Subscribe to replacement notifications.
    pub fn subscribe(&self) -> DirectoryWatcher {
        DirectoryWatcher {
            version_rx: self.inner.version_tx.subscribe(),
        }
    }
}

impl Clone for DirectoryStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl DirectoryWatcher {
    /// Wait until the directory is replaced.
    ///
    /// Returns `Err` if the [`DirectoryStore`] has been dropped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.version_rx.changed().await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::ServiceConfig;
    use uuid::Uuid;

    #[tokio::test]
    async fn replace_swaps_the_snapshot_and_notifies() {
        let store = DirectoryStore::new(ServiceDirectory::default());
        let mut watcher = store.subscribe();
        let before = store.snapshot().await;
        assert_eq!(before.active_services().count(), 0);

        let service = ServiceConfig {
            id: Uuid::new_v4(),
            name: "General".to_string(),
            prefix: 'A',
            active: true,
        };
        let replacement = ServiceDirectory::new(vec![service], vec![], vec![]).unwrap();
        store.replace(replacement).await;

        watcher.changed().await.unwrap();
        let after = store.snapshot().await;
        assert_eq!(after.active_services().count(), 1);
        // The old snapshot is unchanged.
        assert_eq!(before.active_services().count(), 0);
    }
}
