//! End-to-end scheduler behavior against fake collaborators.

mod common;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::Notify;

use common::{SITE, Script, harness, harness_with, page, pages, test_config};
use sitewatch::error::{AppError, ErrorKind};
use sitewatch::models::{CheckStatus, Severity};
use sitewatch::scheduler::{Clock, run_periodic};

/// Register `SITE` and accept an initial crawl of `baseline` pages.
async fn bootstrapped(h: &common::Harness, baseline: usize) {
    h.scheduler.add_site(SITE, None, None).await.unwrap();
    h.crawler.script(SITE, Script::Pages(pages(SITE, baseline)));
    let first = h.scheduler.check_site(SITE).await.unwrap();
    assert!(first.updated);
    h.clock.advance(Duration::days(1));
}

#[tokio::test]
async fn scenario_a_first_check_bootstraps() {
    let h = harness().await;
    h.scheduler.add_site(SITE, None, None).await.unwrap();
    h.crawler.script(SITE, Script::Pages(pages(SITE, 12)));

    let result = h.scheduler.check_site(SITE).await.unwrap();

    assert_eq!(result.status, CheckStatus::Checked);
    assert!(result.updated);
    assert_eq!(result.reason.as_deref(), Some("Initial setup for monitoring"));
    assert_eq!(result.changes.as_ref().unwrap().added_pages.len(), 12);
    assert_eq!(result.pages_count, Some(12));

    let site = h.scheduler.get_site(SITE).await.unwrap();
    assert_eq!(site.last_check_at, Some(common::start_time()));
    assert_eq!(site.last_update_at, Some(common::start_time()));
    assert_eq!(h.snapshots.get_current(SITE).await.unwrap().unwrap().len(), 12);
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn scenario_b_minor_change_regenerates() {
    let h = harness().await;
    bootstrapped(&h, 40).await;

    let mut next = pages(SITE, 40);
    next.remove(0);
    next.push(page(&format!("{SITE}/new-1"), "fresh"));
    next.push(page(&format!("{SITE}/new-2"), "fresher"));
    h.crawler.script(SITE, Script::Pages(next));

    let result = h.scheduler.check_site(SITE).await.unwrap();

    assert_eq!(result.severity, Some(Severity::Minor));
    assert!(result.updated);
    let changes = result.changes.unwrap();
    assert_eq!(changes.added_pages.len(), 2);
    assert_eq!(changes.removed_pages.len(), 1);
    assert!(changes.modified_pages.is_empty());

    let snapshot = h.snapshots.get_current(SITE).await.unwrap().unwrap();
    assert!(snapshot.pages.contains_key(&format!("{SITE}/new-1")));
    assert_eq!(h.generator.calls(), 2);
}

#[tokio::test]
async fn scenario_c_minimal_change_keeps_snapshot() {
    let h = harness().await;
    bootstrapped(&h, 40).await;
    let baseline = h.snapshots.get_current(SITE).await.unwrap().unwrap();

    let mut next = pages(SITE, 40);
    next[7].content = "content 7, revised".to_string();
    h.crawler.script(SITE, Script::Pages(next));

    let result = h.scheduler.check_site(SITE).await.unwrap();

    assert_eq!(result.status, CheckStatus::Checked);
    assert_eq!(result.severity, Some(Severity::Minimal));
    assert!(!result.updated);
    assert_eq!(result.changes.as_ref().unwrap().modified_pages.len(), 1);

    assert_eq!(h.snapshots.get_current(SITE).await.unwrap().unwrap(), baseline);
    let site = h.scheduler.get_site(SITE).await.unwrap();
    assert_eq!(site.last_check_at, Some(h.clock.now()));
    assert_eq!(site.last_update_at, Some(common::start_time()));
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn scenario_d_crawl_timeout_records_check_only() {
    let h = harness().await;
    bootstrapped(&h, 10).await;
    let baseline = h.snapshots.get_current(SITE).await.unwrap().unwrap();
    h.crawler.script(SITE, Script::Hang);

    let result = h.scheduler.check_site(SITE).await.unwrap();

    assert_eq!(result.status, CheckStatus::Error);
    assert!(!result.updated);
    assert_eq!(result.error_kind(), Some(ErrorKind::CrawlFailure));
    assert!(result.error.unwrap().message.contains("timed out after 1s"));

    let site = h.scheduler.get_site(SITE).await.unwrap();
    assert_eq!(site.last_check_at, Some(h.clock.now()));
    assert_eq!(h.snapshots.get_current(SITE).await.unwrap().unwrap(), baseline);
}

#[tokio::test]
async fn empty_crawl_is_a_crawl_failure() {
    let h = harness().await;
    h.scheduler.add_site(SITE, None, None).await.unwrap();

    let result = h.scheduler.check_site(SITE).await.unwrap();

    assert_eq!(result.error_kind(), Some(ErrorKind::CrawlFailure));
    assert!(result.error.unwrap().message.contains("no pages could be crawled"));
    assert!(h.snapshots.get_current(SITE).await.unwrap().is_none());
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn regeneration_failure_retries_against_same_baseline() {
    let h = harness().await;
    bootstrapped(&h, 10).await;
    let baseline = h.snapshots.get_current(SITE).await.unwrap().unwrap();

    let mut next = pages(SITE, 10);
    next.push(page(&format!("{SITE}/extra-1"), "one"));
    next.push(page(&format!("{SITE}/extra-2"), "two"));
    h.crawler.script(SITE, Script::Pages(next));
    h.generator.fail_next(true);

    let failed = h.scheduler.check_site(SITE).await.unwrap();
    assert_eq!(failed.status, CheckStatus::Error);
    assert_eq!(failed.error_kind(), Some(ErrorKind::RegenerationFailure));
    assert!(!failed.updated);
    assert_eq!(failed.severity, Some(Severity::Moderate));
    assert_eq!(h.snapshots.get_current(SITE).await.unwrap().unwrap(), baseline);

    let site = h.scheduler.get_site(SITE).await.unwrap();
    assert_eq!(site.last_check_at, Some(h.clock.now()));
    assert_eq!(site.last_update_at, Some(common::start_time()));

    h.generator.fail_next(false);
    h.clock.advance(Duration::days(1));
    let retried = h.scheduler.check_site(SITE).await.unwrap();
    assert!(retried.updated);
    assert_eq!(retried.changes.unwrap().added_pages.len(), 2);
    assert_eq!(h.snapshots.get_current(SITE).await.unwrap().unwrap().len(), 12);
}

#[tokio::test]
async fn regeneration_timeout_keeps_baseline_and_releases_lock() {
    let h = harness().await;
    bootstrapped(&h, 10).await;
    let baseline = h.snapshots.get_current(SITE).await.unwrap().unwrap();

    h.crawler.script(SITE, Script::Pages(pages(SITE, 12)));
    h.generator.hang_next(true);

    let result = h.scheduler.check_site(SITE).await.unwrap();
    assert_eq!(result.status, CheckStatus::Error);
    assert_eq!(result.error_kind(), Some(ErrorKind::RegenerationFailure));
    assert!(!result.updated);
    assert!(result.error.unwrap().message.contains("timed out after 1s"));

    assert_eq!(h.snapshots.get_current(SITE).await.unwrap().unwrap(), baseline);
    let site = h.scheduler.get_site(SITE).await.unwrap();
    assert_eq!(site.last_check_at, Some(h.clock.now()));
    assert_eq!(site.last_update_at, Some(common::start_time()));

    h.generator.hang_next(false);
    let retried = h.scheduler.check_site(SITE).await.unwrap();
    assert_eq!(retried.status, CheckStatus::Checked);
    assert!(retried.updated);
    assert_eq!(h.snapshots.get_current(SITE).await.unwrap().unwrap().len(), 12);
}

#[tokio::test]
async fn simultaneous_checks_run_one_pipeline() {
    let h = harness().await;
    h.scheduler.add_site(SITE, None, None).await.unwrap();
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    h.crawler.script(
        SITE,
        Script::Gate {
            pages: pages(SITE, 3),
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        },
    );

    let scheduler = Arc::clone(&h.scheduler);
    let first = tokio::spawn(async move { scheduler.check_site(SITE).await });
    entered.notified().await;

    let second = h.scheduler.check_site(SITE).await;
    assert!(matches!(second, Err(AppError::ConcurrentCheckInProgress(_))));

    release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status, CheckStatus::Checked);
    assert_eq!(h.crawler.calls(), 1);
}

#[tokio::test]
async fn sweep_reports_busy_site_without_recording() {
    let h = harness().await;
    h.scheduler.add_site(SITE, None, None).await.unwrap();
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    h.crawler.script(
        SITE,
        Script::Gate {
            pages: pages(SITE, 3),
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        },
    );

    let scheduler = Arc::clone(&h.scheduler);
    let forced = tokio::spawn(async move { scheduler.check_site(SITE).await });
    entered.notified().await;

    let results = h.scheduler.check_due().await;
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].error_kind(),
        Some(ErrorKind::ConcurrentCheckInProgress)
    );
    assert!(h.scheduler.get_site(SITE).await.unwrap().last_check_at.is_none());

    release.notify_one();
    forced.await.unwrap().unwrap();
    assert!(h.scheduler.get_site(SITE).await.unwrap().last_check_at.is_some());
}

#[tokio::test]
async fn sweep_isolates_failures_and_keeps_registry_order() {
    let h = harness().await;
    let (a, b, c) = ("https://a.dev", "https://b.dev", "https://c.dev");
    for url in [a, b, c] {
        h.scheduler.add_site(url, None, None).await.unwrap();
    }
    h.crawler.script(a, Script::Fail("connection refused".into()));
    h.crawler.script(b, Script::Pages(pages(b, 4)));
    h.crawler.script(c, Script::Pages(pages(c, 2)));
    h.scheduler.check_site(c).await.unwrap();
    h.clock.advance(Duration::minutes(5));

    let results = h.scheduler.check_due().await;

    let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec![a, b, c]);
    assert_eq!(results[0].status, CheckStatus::Error);
    assert_eq!(results[1].status, CheckStatus::Checked);
    assert!(results[1].updated);
    assert_eq!(results[2].status, CheckStatus::Skipped);
    assert_eq!(
        results[2].next_check_at,
        Some(common::start_time() + Duration::days(1))
    );

    let failed = h.scheduler.get_site(a).await.unwrap();
    assert_eq!(failed.last_check_at, Some(h.clock.now()));
}

#[tokio::test]
async fn due_status_follows_interval() {
    let h = harness().await;
    h.scheduler
        .add_site(SITE, Some(7200), Some(5))
        .await
        .unwrap();
    h.crawler.script(SITE, Script::Pages(pages(SITE, 2)));

    assert_eq!(h.scheduler.check_due().await[0].status, CheckStatus::Checked);

    h.clock.advance(Duration::seconds(7199));
    assert_eq!(h.scheduler.check_due().await[0].status, CheckStatus::Skipped);

    h.clock.advance(Duration::seconds(1));
    assert_eq!(h.scheduler.check_due().await[0].status, CheckStatus::Checked);
    assert_eq!(h.crawler.calls(), 2);
}

#[tokio::test]
async fn last_check_never_moves_backwards() {
    let h = harness().await;
    h.scheduler.add_site(SITE, None, None).await.unwrap();
    h.crawler.script(SITE, Script::Pages(pages(SITE, 2)));

    h.clock.advance(Duration::hours(2));
    h.scheduler.check_site(SITE).await.unwrap();
    let later = h.clock.now();

    h.clock.advance(Duration::hours(-1));
    h.scheduler.check_site(SITE).await.unwrap();

    let site = h.scheduler.get_site(SITE).await.unwrap();
    assert_eq!(site.last_check_at, Some(later));
}

#[tokio::test]
async fn add_site_runs_bootstrap_when_configured() {
    let config = sitewatch::models::SchedulerConfig {
        check_on_add: true,
        ..test_config()
    };
    let h = harness_with(config).await;
    h.crawler.script(SITE, Script::Pages(pages(SITE, 5)));

    let added = h.scheduler.add_site(SITE, None, None).await.unwrap();

    assert_eq!(added.site.check_interval_secs, 86_400);
    assert_eq!(added.site.max_pages, 20);
    let initial = added.initial_result.unwrap();
    assert!(initial.updated);
    assert_eq!(initial.reason.as_deref(), Some("Initial setup for monitoring"));
}

#[tokio::test]
async fn add_rejects_duplicates_and_bad_config() {
    let h = harness().await;
    h.scheduler.add_site(SITE, None, None).await.unwrap();

    let duplicate = h.scheduler.add_site(&format!("{SITE}/"), None, None).await;
    assert!(matches!(duplicate, Err(AppError::DuplicateSite(_))));

    let too_frequent = h.scheduler.add_site("https://b.dev", Some(60), None).await;
    assert!(matches!(too_frequent, Err(AppError::InvalidConfig(_))));

    let no_budget = h.scheduler.add_site("https://b.dev", None, Some(0)).await;
    assert!(matches!(no_budget, Err(AppError::InvalidConfig(_))));

    assert_eq!(h.scheduler.list_sites().await.len(), 1);
}

#[tokio::test]
async fn remove_site_drops_state() {
    let h = harness().await;
    bootstrapped(&h, 3).await;

    let removed = h.scheduler.remove_site(SITE).await.unwrap();
    assert_eq!(removed.url, SITE);

    assert!(h.snapshots.get_current(SITE).await.unwrap().is_none());
    assert!(h.scheduler.list_sites().await.is_empty());
    assert!(matches!(
        h.scheduler.check_site(SITE).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        h.scheduler.remove_site(SITE).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn remove_during_check_is_refused_and_readd_bootstraps() {
    let h = harness().await;
    h.scheduler.add_site(SITE, None, None).await.unwrap();
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    h.crawler.script(
        SITE,
        Script::Gate {
            pages: pages(SITE, 12),
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        },
    );

    let scheduler = Arc::clone(&h.scheduler);
    let running = tokio::spawn(async move { scheduler.check_site(SITE).await });
    entered.notified().await;

    let busy = h.scheduler.remove_site(SITE).await;
    assert!(matches!(busy, Err(AppError::ConcurrentCheckInProgress(_))));
    assert_eq!(h.scheduler.list_sites().await.len(), 1);

    release.notify_one();
    let finished = running.await.unwrap().unwrap();
    assert_eq!(finished.status, CheckStatus::Checked);
    assert!(finished.updated);

    h.scheduler.remove_site(SITE).await.unwrap();
    assert!(h.snapshots.get_current(SITE).await.unwrap().is_none());

    h.scheduler.add_site(SITE, None, None).await.unwrap();
    h.crawler.script(SITE, Script::Pages(pages(SITE, 12)));
    let readded = h.scheduler.check_site(SITE).await.unwrap();
    assert!(readded.updated);
    assert_eq!(readded.reason.as_deref(), Some("Initial setup for monitoring"));
    assert_eq!(readded.changes.unwrap().added_pages.len(), 12);
}

#[tokio::test]
async fn periodic_driver_sweeps_until_shutdown() {
    let h = harness().await;
    h.scheduler.add_site(SITE, None, None).await.unwrap();
    h.crawler.script(SITE, Script::Pages(pages(SITE, 2)));

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let driver = tokio::spawn(run_periodic(
        Arc::clone(&h.scheduler),
        StdDuration::from_millis(20),
        async move {
            let _ = stop_rx.await;
        },
    ));

    tokio::time::sleep(StdDuration::from_millis(100)).await;
    stop_tx.send(()).unwrap();
    driver.await.unwrap();

    // Clock never advanced, so only the first sweep found the site due.
    assert_eq!(h.crawler.calls(), 1);
    assert!(h.scheduler.get_site(SITE).await.unwrap().last_check_at.is_some());
}
