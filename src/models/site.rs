// src/models/site.rs

//! Monitored site record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A website under periodic observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    /// Canonical absolute URL, unique key
    pub url: String,

    /// Seconds between due checks
    pub check_interval_secs: u64,

    /// Page budget for one crawl
    pub max_pages: usize,

    /// Most recent completed check attempt (success or failure)
    #[serde(default)]
    pub last_check_at: Option<DateTime<Utc>>,

    /// Most recent accepted regeneration
    #[serde(default)]
    pub last_update_at: Option<DateTime<Utc>>,

    /// When the site was registered
    pub added_at: DateTime<Utc>,
}

impl Site {
    pub fn new(
        url: impl Into<String>,
        check_interval_secs: u64,
        max_pages: usize,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            check_interval_secs,
            max_pages,
            last_check_at: None,
            last_update_at: None,
            added_at,
        }
    }

    /// Earliest time the next scheduled check may run.
    ///
    /// `None` means the site has never been checked and is due now.
    pub fn next_check_at(&self) -> Option<DateTime<Utc>> {
        let interval = i64::try_from(self.check_interval_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        self.last_check_at
            .map(|last| last.checked_add_signed(interval).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// Whether the check interval has elapsed at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_check_at().is_none_or(|next| now >= next)
    }

    /// Check interval expressed in hours.
    pub fn check_interval_hours(&self) -> f64 {
        self.check_interval_secs as f64 / 3600.0
    }

    /// Stable storage key derived from the URL.
    pub fn storage_key(&self) -> String {
        site_key(&self.url)
    }
}

/// First 16 hex characters of the SHA-256 of a canonical URL.
pub fn site_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(digest)[..16].to_string()
}
