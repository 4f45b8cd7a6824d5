// src/scheduler/mod.rs

//! Monitoring scheduler.
//!
//! Owns the registry and the per-site locks, decides which sites are due and
//! drives each through the check pipeline.
//!
//! - `add_site` / `remove_site` / `list_sites`: registry management
//! - `check_site`: forced check of one site, due or not
//! - `check_due`: one sweep over every due site

mod clock;
mod driver;
mod locks;

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{CheckResult, CheckStatus, Config, SchedulerConfig, Site};
use crate::pipeline::SiteChecker;
use crate::services::{
    ArtifactGenerator, HttpSiteCrawler, LlmsTxtGenerator, SiteCrawler, StoredArtifacts,
};
use crate::storage::registry::SiteLimits;
use crate::storage::{ObjectStore, SiteRegistry, SnapshotStore};

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::run_periodic;
pub use locks::{SiteGuard, SiteLocks};

/// A newly registered site and, if it ran, its bootstrap check.
#[derive(Debug, Clone)]
pub struct AddedSite {
    pub site: Site,
    pub initial_result: Option<CheckResult>,
}

/// Counts over one sweep's results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub total: usize,
    pub checked: usize,
    pub updated: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl SweepSummary {
    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.status {
                CheckStatus::Checked => summary.checked += 1,
                CheckStatus::Error => summary.errors += 1,
                CheckStatus::Skipped => summary.skipped += 1,
            }
            if result.updated {
                summary.updated += 1;
            }
        }
        summary
    }
}

pub struct Scheduler {
    config: SchedulerConfig,
    registry: Arc<SiteRegistry>,
    snapshots: SnapshotStore,
    generator: Arc<dyn ArtifactGenerator>,
    clock: Arc<dyn Clock>,
    checker: SiteChecker,
    locks: SiteLocks,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        registry: Arc<SiteRegistry>,
        snapshots: SnapshotStore,
        crawler: Arc<dyn SiteCrawler>,
        generator: Arc<dyn ArtifactGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let checker = SiteChecker::new(
            Arc::clone(&registry),
            snapshots.clone(),
            crawler,
            Arc::clone(&generator),
            Arc::clone(&clock),
            &config,
        );
        Self {
            config,
            registry,
            snapshots,
            generator,
            clock,
            checker,
            locks: SiteLocks::new(),
        }
    }

    /// Build a scheduler with the HTTP crawler and llms.txt generator over
    /// `store`.
    pub async fn open(config: &Config, store: Arc<dyn ObjectStore>) -> Result<Self> {
        let registry = SiteRegistry::open(
            Arc::clone(&store),
            SiteLimits::from(&config.scheduler),
        )
        .await?;
        let crawler = HttpSiteCrawler::new(config.crawler.clone())?;
        let generator = LlmsTxtGenerator::new(Arc::clone(&store));

        Ok(Self::new(
            config.scheduler.clone(),
            Arc::new(registry),
            SnapshotStore::new(store),
            Arc::new(crawler),
            Arc::new(generator),
            Arc::new(SystemClock),
        ))
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    /// Register a site. Defaults apply to omitted settings; when configured,
    /// the bootstrap check runs before returning.
    pub async fn add_site(
        &self,
        url: &str,
        check_interval_secs: Option<u64>,
        max_pages: Option<usize>,
    ) -> Result<AddedSite> {
        let site = self
            .registry
            .add(
                url,
                check_interval_secs.unwrap_or(self.config.default_check_interval_secs),
                max_pages.unwrap_or(self.config.default_max_pages),
                self.clock.now(),
            )
            .await?;

        let initial_result = if self.config.check_on_add {
            match self.check_site(&site.url).await {
                Ok(result) => Some(result),
                Err(e) => {
                    log::warn!("Initial check of {} did not run: {}", site.url, e);
                    None
                }
            }
        } else {
            None
        };

        Ok(AddedSite {
            site,
            initial_result,
        })
    }

    /// Stop monitoring a site and drop its stored state.
    ///
    /// Fails with `ConcurrentCheckInProgress` while the site is being
    /// checked; a running check would otherwise write state back after it is
    /// discarded.
    pub async fn remove_site(&self, url: &str) -> Result<Site> {
        let site = self.registry.get(url).await?;
        let _guard = self.locks.try_acquire(&site.url)?;
        let site = self.registry.remove(&site.url, self.clock.now()).await?;

        if let Err(e) = self.snapshots.discard(&site.url).await {
            log::warn!("Failed to discard snapshot of {}: {}", site.url, e);
        }
        if let Err(e) = self.generator.discard(&site.url).await {
            log::warn!("Failed to discard artifacts of {}: {}", site.url, e);
        }
        self.locks.forget(&site.url);

        Ok(site)
    }

    pub async fn list_sites(&self) -> Vec<Site> {
        self.registry.list().await
    }

    pub async fn get_site(&self, url: &str) -> Result<Site> {
        self.registry.get(url).await
    }

    /// Last generated documents of a monitored site.
    pub async fn artifacts(&self, url: &str) -> Result<(Site, Option<StoredArtifacts>)> {
        let site = self.registry.get(url).await?;
        let artifacts = self.generator.load(&site.url).await?;
        Ok((site, artifacts))
    }

    /// Check one site now, whether or not it is due.
    ///
    /// Fails with `NotFound` for unknown sites and with
    /// `ConcurrentCheckInProgress` if the site is already being checked.
    pub async fn check_site(&self, url: &str) -> Result<CheckResult> {
        let site = self.registry.get(url).await?;
        let _guard = self.locks.try_acquire(&site.url)?;

        // Re-read under the lock so the pipeline sees the latest record.
        let site = self.registry.get(&site.url).await?;
        Ok(self.checker.check(&site).await)
    }

    /// Run one sweep: check every due site, skip the rest.
    ///
    /// Results come back in registry order. One site's failure never stops
    /// the others.
    pub async fn check_due(&self) -> Vec<CheckResult> {
        let now = self.clock.now();
        let sites = self.registry.list().await;
        let mut results: Vec<Option<CheckResult>> = vec![None; sites.len()];

        let mut due = Vec::new();
        for (index, site) in sites.into_iter().enumerate() {
            if site.is_due(now) {
                due.push((index, site));
            } else {
                results[index] = Some(CheckResult::skipped(&site.url, now, site.next_check_at()));
            }
        }
        log::debug!("{} of {} site(s) due", due.len(), results.len());

        let limit = self.config.max_concurrent_checks.max(1);
        let tasks: Vec<_> = due
            .into_iter()
            .map(|(index, site)| self.check_if_due(index, site))
            .collect();
        let checked: Vec<(usize, CheckResult)> = stream::iter(tasks)
            .buffer_unordered(limit)
            .collect()
            .await;

        for (index, result) in checked {
            results[index] = Some(result);
        }
        results.into_iter().flatten().collect()
    }

    async fn check_if_due(&self, index: usize, site: Site) -> (usize, CheckResult) {
        let _guard = match self.locks.try_acquire(&site.url) {
            Ok(guard) => guard,
            Err(e) => {
                log::info!("Skipping {}: {}", site.url, e);
                return (index, CheckResult::failed(&site.url, self.clock.now(), &e));
            }
        };

        // Another check may have finished, or the site been removed, since
        // the sweep listed it.
        let now = self.clock.now();
        let result = match self.registry.get(&site.url).await {
            Ok(current) if current.is_due(now) => self.checker.check(&current).await,
            Ok(current) => CheckResult::skipped(&current.url, now, current.next_check_at()),
            Err(e) => CheckResult::failed(&site.url, now, &e),
        };
        (index, result)
    }
}
