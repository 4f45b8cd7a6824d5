//! Storage abstractions for monitoring state.
//!
//! Everything the engine persists goes through an [`ObjectStore`], a flat
//! key/value byte store whose writes replace an object all-or-nothing.
//!
//! ## Layout
//!
//! ```text
//! {root}/
//! ├── sites.json                  # Site Registry
//! ├── snapshots/
//! │   └── {site_key}.json         # Current snapshot per site
//! └── artifacts/
//!     └── {site_key}/
//!         ├── llms.txt
//!         └── llms-full.txt
//! ```

pub mod local;
pub mod memory;
pub mod registry;
#[cfg(feature = "s3")]
pub mod s3;
pub mod snapshots;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use registry::SiteRegistry;
pub use snapshots::SnapshotStore;

/// Registry object key.
pub const SITES_KEY: &str = "sites.json";

/// Snapshot object key for a site.
pub fn snapshot_key(site_key: &str) -> String {
    format!("snapshots/{}.json", site_key)
}

/// Artifact object key for a site.
pub fn artifact_key(site_key: &str, file_name: &str) -> String {
    format!("artifacts/{}/{}", site_key, file_name)
}

/// Trait for object storage backends.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object, returning `None` if it doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace an object atomically.
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Human-readable location of a key, for logs.
    fn location(&self, key: &str) -> String;
}

/// Read and deserialize a JSON object.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    key: &str,
) -> Result<Option<T>> {
    match store.read_bytes(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Serialize and write a JSON object.
pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    store.write_bytes(key, &bytes).await
}

/// Read a UTF-8 text object.
pub async fn read_text(store: &dyn ObjectStore, key: &str) -> Result<Option<String>> {
    match store.read_bytes(key).await? {
        Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        None => Ok(None),
    }
}
