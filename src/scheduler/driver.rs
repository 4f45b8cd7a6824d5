//! Periodic sweep driver.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::{Scheduler, SweepSummary};

/// Run a sweep every `tick` until `shutdown` resolves.
///
/// The first sweep runs immediately. A sweep that overruns its tick delays
/// the next one instead of stacking.
pub async fn run_periodic<F>(scheduler: Arc<Scheduler>, tick: Duration, shutdown: F)
where
    F: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    log::info!("Periodic checks every {}s", tick.as_secs());
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("Periodic checks stopped");
                break;
            }
            _ = interval.tick() => {
                let results = scheduler.check_due().await;
                let summary = SweepSummary::from_results(&results);
                log::info!(
                    "Sweep: {} site(s), {} checked, {} updated, {} error(s), {} skipped",
                    summary.total,
                    summary.checked,
                    summary.updated,
                    summary.errors,
                    summary.skipped
                );
            }
        }
    }
}
