//! Site Registry.
//!
//! Keeps the ordered set of monitored sites in memory and persists it as a
//! single `sites.json` object. Every mutation builds the next list, writes it
//! through the [`ObjectStore`] and only then publishes it, so readers never
//! observe a half-updated record and a failed write changes nothing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{SchedulerConfig, Site};
use crate::storage::{ObjectStore, SITES_KEY, read_json, write_json};
use crate::utils::url::normalize_url;

/// Bounds enforced on site configuration.
#[derive(Debug, Clone, Copy)]
pub struct SiteLimits {
    pub min_check_interval_secs: u64,
    pub max_pages_limit: usize,
}

impl From<&SchedulerConfig> for SiteLimits {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            min_check_interval_secs: config.min_check_interval_secs,
            max_pages_limit: config.max_pages_limit,
        }
    }
}

impl Default for SiteLimits {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

impl SiteLimits {
    /// Validate an interval and page budget.
    pub fn validate(&self, check_interval_secs: u64, max_pages: usize) -> Result<()> {
        if check_interval_secs == 0 {
            return Err(AppError::invalid_config("check interval must be positive"));
        }
        if check_interval_secs < self.min_check_interval_secs {
            return Err(AppError::invalid_config(format!(
                "check interval {}s is below the minimum of {}s",
                check_interval_secs, self.min_check_interval_secs
            )));
        }
        if max_pages == 0 {
            return Err(AppError::invalid_config("max pages must be positive"));
        }
        if max_pages > self.max_pages_limit {
            return Err(AppError::invalid_config(format!(
                "max pages {} exceeds the limit of {}",
                max_pages, self.max_pages_limit
            )));
        }
        Ok(())
    }
}

/// Persisted registry document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryFile {
    updated_at: DateTime<Utc>,
    count: usize,
    sites: Vec<Site>,
}

/// Canonical lookup form of a caller-supplied URL.
fn lookup_key(url: &str) -> String {
    normalize_url(url).unwrap_or_else(|_| url.trim().to_string())
}

/// Persistent, ordered registry of monitored sites.
pub struct SiteRegistry {
    store: Arc<dyn ObjectStore>,
    limits: SiteLimits,
    sites: RwLock<Vec<Site>>,
}

impl SiteRegistry {
    /// Open the registry, loading any persisted sites.
    pub async fn open(store: Arc<dyn ObjectStore>, limits: SiteLimits) -> Result<Self> {
        let sites = match read_json::<RegistryFile>(store.as_ref(), SITES_KEY).await? {
            Some(file) => {
                log::info!(
                    "Loaded {} monitored site(s) from {}",
                    file.sites.len(),
                    store.location(SITES_KEY)
                );
                file.sites
            }
            None => {
                log::info!("No registry at {}, starting empty", store.location(SITES_KEY));
                Vec::new()
            }
        };

        Ok(Self {
            store,
            limits,
            sites: RwLock::new(sites),
        })
    }

    pub fn limits(&self) -> SiteLimits {
        self.limits
    }

    /// Register a new site.
    pub async fn add(
        &self,
        url: &str,
        check_interval_secs: u64,
        max_pages: usize,
        now: DateTime<Utc>,
    ) -> Result<Site> {
        let url = normalize_url(url)?;
        self.limits.validate(check_interval_secs, max_pages)?;

        let site = Site::new(url, check_interval_secs, max_pages, now);
        let added = site.clone();
        self.mutate(now, move |sites| {
            if sites.iter().any(|s| s.url == site.url) {
                return Err(AppError::DuplicateSite(site.url));
            }
            sites.push(site);
            Ok(())
        })
        .await?;

        log::info!(
            "Registered {} (every {}s, {} pages)",
            added.url,
            added.check_interval_secs,
            added.max_pages
        );
        Ok(added)
    }

    /// All sites in insertion order.
    pub async fn list(&self) -> Vec<Site> {
        self.sites.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.sites.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Look up a site by URL.
    pub async fn get(&self, url: &str) -> Result<Site> {
        let key = lookup_key(url);
        self.sites
            .read()
            .await
            .iter()
            .find(|s| s.url == key)
            .cloned()
            .ok_or(AppError::NotFound(key))
    }

    /// Record a completed check attempt. Never moves the timestamp backwards.
    pub async fn record_check(&self, url: &str, at: DateTime<Utc>) -> Result<Site> {
        self.update_site(url, at, |site| {
            site.last_check_at = Some(site.last_check_at.map_or(at, |prev| prev.max(at)));
        })
        .await
    }

    /// Record an accepted regeneration. Never moves the timestamp backwards.
    pub async fn record_update(&self, url: &str, at: DateTime<Utc>) -> Result<Site> {
        self.update_site(url, at, |site| {
            site.last_update_at = Some(site.last_update_at.map_or(at, |prev| prev.max(at)));
        })
        .await
    }

    /// Stop monitoring a site.
    pub async fn remove(&self, url: &str, now: DateTime<Utc>) -> Result<Site> {
        let key = lookup_key(url);
        let removed = self
            .mutate(now, move |sites| {
                let index = sites
                    .iter()
                    .position(|s| s.url == key)
                    .ok_or_else(|| AppError::NotFound(key.clone()))?;
                Ok(sites.remove(index))
            })
            .await?;

        log::info!("Removed {} from monitoring", removed.url);
        Ok(removed)
    }

    async fn update_site<F>(&self, url: &str, at: DateTime<Utc>, apply: F) -> Result<Site>
    where
        F: FnOnce(&mut Site),
    {
        let key = lookup_key(url);
        self.mutate(at, move |sites| {
            let site = sites
                .iter_mut()
                .find(|s| s.url == key)
                .ok_or_else(|| AppError::NotFound(key.clone()))?;
            apply(site);
            Ok(site.clone())
        })
        .await
    }

    /// Apply a change to a copy of the list, persist it stamped `at`, then
    /// publish it.
    async fn mutate<F, R>(&self, at: DateTime<Utc>, change: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Site>) -> Result<R>,
    {
        let mut guard = self.sites.write().await;
        let mut next = guard.clone();
        let output = change(&mut next)?;

        let file = RegistryFile {
            updated_at: at,
            count: next.len(),
            sites: next,
        };
        if let Err(e) = write_json(self.store.as_ref(), SITES_KEY, &file).await {
            log::error!(
                "Failed to persist registry to {}: {}",
                self.store.location(SITES_KEY),
                e
            );
            return Err(e);
        }

        *guard = file.sites;
        Ok(output)
    }
}
