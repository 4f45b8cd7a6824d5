//! Shared fixtures for scheduler integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Notify;

use sitewatch::error::{AppError, Result};
use sitewatch::models::{CrawledPage, PageSet, SchedulerConfig, Site};
use sitewatch::scheduler::{Clock, ManualClock, Scheduler};
use sitewatch::services::{ArtifactGenerator, GeneratedArtifacts, SiteCrawler};
use sitewatch::storage::registry::SiteLimits;
use sitewatch::storage::{MemoryStorage, ObjectStore, SiteRegistry, SnapshotStore};

pub const SITE: &str = "https://docs.example.com";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap()
}

pub fn page(url: &str, content: &str) -> CrawledPage {
    CrawledPage {
        url: url.to_string(),
        title: format!("Title of {url}"),
        description: String::new(),
        content: content.to_string(),
        links: Vec::new(),
    }
}

/// `count` pages under `base`, numbered from 0.
pub fn pages(base: &str, count: usize) -> Vec<CrawledPage> {
    (0..count)
        .map(|i| page(&format!("{base}/p{i}"), &format!("content {i}")))
        .collect()
}

/// What the fake crawler does for a URL.
#[derive(Clone)]
pub enum Script {
    Pages(Vec<CrawledPage>),
    Fail(String),
    /// Never completes
    Hang,
    /// Signals `entered`, then waits for `release`
    Gate {
        pages: Vec<CrawledPage>,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    },
}

#[derive(Default)]
pub struct FakeCrawler {
    scripts: Mutex<HashMap<String, Script>>,
    calls: AtomicUsize,
}

impl FakeCrawler {
    pub fn script(&self, url: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), script);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SiteCrawler for FakeCrawler {
    async fn crawl(&self, url: &str, _max_pages: usize) -> Result<PageSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().unwrap().get(url).cloned();

        let pages = match script {
            Some(Script::Pages(pages)) => pages,
            Some(Script::Fail(message)) => return Err(AppError::crawl(url, message)),
            Some(Script::Hang) => std::future::pending().await,
            Some(Script::Gate {
                pages,
                entered,
                release,
            }) => {
                entered.notify_one();
                release.notified().await;
                pages
            }
            None => Vec::new(),
        };
        Ok(PageSet::new(url, pages, Utc::now()))
    }
}

#[derive(Default)]
pub struct FakeGenerator {
    fail: AtomicBool,
    hang: AtomicBool,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Never complete while set.
    pub fn hang_next(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactGenerator for FakeGenerator {
    async fn generate(&self, site: &Site, pages: &PageSet) -> Result<GeneratedArtifacts> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::regeneration(&site.url, "generator unavailable"));
        }
        Ok(GeneratedArtifacts {
            llms_txt_location: format!("memory://{}/llms.txt", site.storage_key()),
            llms_full_txt_location: format!("memory://{}/llms-full.txt", site.storage_key()),
            page_count: pages.pages.len(),
            generated_at: Utc::now(),
        })
    }
}

pub struct Harness {
    pub scheduler: Arc<Scheduler>,
    pub snapshots: SnapshotStore,
    pub crawler: Arc<FakeCrawler>,
    pub generator: Arc<FakeGenerator>,
    pub clock: Arc<ManualClock>,
}

pub fn test_config() -> SchedulerConfig {
    SchedulerConfig {
        check_on_add: false,
        crawl_timeout_secs: 1,
        regenerate_timeout_secs: 1,
        max_concurrent_checks: 2,
        ..SchedulerConfig::default()
    }
}

pub async fn harness() -> Harness {
    harness_with(test_config()).await
}

pub async fn harness_with(config: SchedulerConfig) -> Harness {
    let store: Arc<dyn ObjectStore> = Arc::new(MemoryStorage::new());
    let registry = SiteRegistry::open(Arc::clone(&store), SiteLimits::from(&config))
        .await
        .unwrap();
    let snapshots = SnapshotStore::new(store);
    let crawler = Arc::new(FakeCrawler::default());
    let generator = Arc::new(FakeGenerator::default());
    let clock = Arc::new(ManualClock::new(start_time()));

    let scheduler = Scheduler::new(
        config,
        Arc::new(registry),
        snapshots.clone(),
        Arc::clone(&crawler) as Arc<dyn SiteCrawler>,
        Arc::clone(&generator) as Arc<dyn ArtifactGenerator>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    );

    Harness {
        scheduler: Arc::new(scheduler),
        snapshots,
        crawler,
        generator,
        clock,
    }
}
