// src/pipeline/check.rs

//! Per-site check pipeline.
//!
//! Crawl -> snapshot -> diff -> classify -> (regenerate) -> record. The
//! caller holds the site's lock for the whole run. Every terminal path ends
//! in exactly one `record_check`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{CheckResult, PageSet, SchedulerConfig, Site, Snapshot};
use crate::pipeline::diff::calculate_diff;
use crate::pipeline::severity::decide;
use crate::scheduler::Clock;
use crate::services::{ArtifactGenerator, GeneratedArtifacts, SiteCrawler};
use crate::storage::{SiteRegistry, SnapshotStore};

/// Runs the check pipeline for one site at a time.
pub struct SiteChecker {
    registry: Arc<SiteRegistry>,
    snapshots: SnapshotStore,
    crawler: Arc<dyn SiteCrawler>,
    generator: Arc<dyn ArtifactGenerator>,
    clock: Arc<dyn Clock>,
    crawl_timeout: Duration,
    regenerate_timeout: Duration,
}

impl SiteChecker {
    pub fn new(
        registry: Arc<SiteRegistry>,
        snapshots: SnapshotStore,
        crawler: Arc<dyn SiteCrawler>,
        generator: Arc<dyn ArtifactGenerator>,
        clock: Arc<dyn Clock>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            snapshots,
            crawler,
            generator,
            clock,
            crawl_timeout: config.crawl_timeout(),
            regenerate_timeout: config.regenerate_timeout(),
        }
    }

    /// Check a site and record the attempt.
    pub async fn check(&self, site: &Site) -> CheckResult {
        log::debug!("Checking {}", site.url);
        let result = self.evaluate(site).await;

        if let Err(e) = self.registry.record_check(&site.url, result.checked_at).await {
            log::warn!("Could not record check for {}: {}", site.url, e);
            return CheckResult::failed(&site.url, result.checked_at, &e);
        }

        match &result.error {
            Some(error) => log::warn!("Check of {} failed: {}", site.url, error.message),
            None => log::info!(
                "Checked {}: {} (updated: {})",
                site.url,
                result.reason.as_deref().unwrap_or_default(),
                result.updated
            ),
        }
        result
    }

    async fn evaluate(&self, site: &Site) -> CheckResult {
        let url = site.url.as_str();

        let previous = match self.snapshots.get_current(url).await {
            Ok(previous) => previous,
            Err(e) => return CheckResult::failed(url, self.clock.now(), &e),
        };

        let pages = match self.crawl(site).await {
            Ok(pages) => pages,
            Err(e) => return CheckResult::failed(url, self.clock.now(), &e),
        };
        let pages_count = pages.pages.len();

        let snapshot = pages.to_snapshot();
        let changes = calculate_diff(previous.as_ref(), &snapshot);
        let decision = decide(previous.as_ref(), &changes);
        log::debug!(
            "{}: {} added, {} removed, {} modified of {} -> {}",
            url,
            changes.added_pages.len(),
            changes.removed_pages.len(),
            changes.modified_pages.len(),
            previous.as_ref().map_or(0, |s| s.len()),
            decision.severity
        );

        if !decision.regenerate {
            return CheckResult::checked(
                url,
                self.clock.now(),
                false,
                changes,
                decision.severity,
                decision.reason(),
            )
            .with_pages(pages_count);
        }

        let accepted = match self.regenerate(site, &pages).await {
            Ok(_) => self.accept(site, &snapshot).await,
            Err(e) => Err(e),
        };

        let now = self.clock.now();
        match accepted {
            Ok(()) => CheckResult::checked(url, now, true, changes, decision.severity, decision.reason())
                .with_pages(pages_count),
            Err(e) => CheckResult::failed(url, now, &e)
                .with_changes(changes, decision.severity)
                .with_pages(pages_count),
        }
    }

    async fn crawl(&self, site: &Site) -> Result<PageSet> {
        let crawl = self.crawler.crawl(&site.url, site.max_pages);
        let pages = bounded(self.crawl_timeout, crawl)
            .await
            .map_err(|e| crawl_failure(&site.url, e))?;

        if pages.is_empty() {
            return Err(AppError::crawl(&site.url, "no pages could be crawled"));
        }
        Ok(pages)
    }

    async fn regenerate(&self, site: &Site, pages: &PageSet) -> Result<GeneratedArtifacts> {
        let generate = self.generator.generate(site, pages);
        bounded(self.regenerate_timeout, generate)
            .await
            .map_err(|e| regeneration_failure(&site.url, e))
    }

    /// Make the new snapshot the baseline and stamp the update.
    async fn accept(&self, site: &Site, snapshot: &Snapshot) -> Result<()> {
        // A removed site must not get a baseline back.
        self.registry.get(&site.url).await?;
        self.snapshots.replace(&site.url, snapshot).await?;
        self.registry.record_update(&site.url, self.clock.now()).await?;
        Ok(())
    }
}

/// Outcome of a step run under a deadline.
enum Bounded {
    Failed(AppError),
    TimedOut(Duration),
}

async fn bounded<T, F>(limit: Duration, step: F) -> std::result::Result<T, Bounded>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, step).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(Bounded::Failed(e)),
        Err(_) => Err(Bounded::TimedOut(limit)),
    }
}

fn crawl_failure(url: &str, failure: Bounded) -> AppError {
    match failure {
        Bounded::Failed(e @ AppError::CrawlFailure { .. }) => e,
        Bounded::Failed(e) => AppError::crawl(url, e),
        Bounded::TimedOut(limit) => {
            AppError::crawl(url, format!("timed out after {}s", limit.as_secs()))
        }
    }
}

fn regeneration_failure(url: &str, failure: Bounded) -> AppError {
    match failure {
        Bounded::Failed(e @ AppError::RegenerationFailure { .. }) => e,
        Bounded::Failed(e) => AppError::regeneration(url, e),
        Bounded::TimedOut(limit) => {
            AppError::regeneration(url, format!("timed out after {}s", limit.as_secs()))
        }
    }
}
