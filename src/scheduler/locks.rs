//! Per-site mutual exclusion for checks.
//!
//! At most one check runs per site. A second check for the same site fails
//! fast instead of queueing behind the first.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{AppError, Result};

/// Held for the duration of one site's check.
pub type SiteGuard = OwnedMutexGuard<()>;

#[derive(Default)]
pub struct SiteLocks {
    locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SiteLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for `url`, or fail if a check already holds it.
    pub fn try_acquire(&self, url: &str) -> Result<SiteGuard> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(url.to_string()).or_default())
        };
        lock.try_lock_owned()
            .map_err(|_| AppError::ConcurrentCheckInProgress(url.to_string()))
    }

    /// Drop the lock entry of a removed site.
    pub fn forget(&self, url: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.remove(url);
    }
}
