//! Snapshot Store.
//!
//! Holds exactly one current snapshot per site. Replacement is a single
//! object write, so a reader sees either the previous or the new snapshot.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Snapshot, site_key};
use crate::storage::{ObjectStore, read_json, snapshot_key, write_json};

/// Per-site store of the most recently accepted snapshot.
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn ObjectStore>,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Current snapshot for a site, or `None` before the first accepted check.
    pub async fn get_current(&self, url: &str) -> Result<Option<Snapshot>> {
        read_json(self.store.as_ref(), &snapshot_key(&site_key(url))).await
    }

    /// Replace the current snapshot for a site.
    pub async fn replace(&self, url: &str, snapshot: &Snapshot) -> Result<()> {
        let key = snapshot_key(&site_key(url));
        write_json(self.store.as_ref(), &key, snapshot).await?;
        log::debug!(
            "Stored snapshot of {} pages for {} at {}",
            snapshot.len(),
            url,
            self.store.location(&key)
        );
        Ok(())
    }

    /// Drop the snapshot of a site that is no longer monitored.
    pub async fn discard(&self, url: &str) -> Result<()> {
        self.store.delete(&snapshot_key(&site_key(url))).await
    }
}
