use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::services::aggregator::{gather_trending_projects, JobContext};

const RANKING_INTERVAL: Duration = Duration::from_secs(600);

/// Drives the ranking cycle every 10 minutes, forever. Cycles run inside
/// this loop, so a slow cycle can never overlap the next one; a tick that
/// lands while a run is still in progress is skipped instead of bursting.
pub async fn start_monitoring(ctx: Arc<JobContext>) {
    tracing::info!("Starting ranking scheduler...");
    let mut timer = interval(RANKING_INTERVAL);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        timer.tick().await;
        tracing::info!("Executing ranking task");
        match gather_trending_projects(&ctx).await {
            Some(records) => {
                tracing::info!("Ranking cycle upserted {} records", records.len())
            }
            None => tracing::warn!("Ranking cycle aborted without writing"),
        }
    }
}
