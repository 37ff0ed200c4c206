//! Recurring per-channel harvest scheduling
//!
//! Each channel runs on its own cadence: movers & shakers hourly, best
//! sellers daily, outlet and warehouse weekly by default. One task per
//! channel ticks on a tokio interval; a run that overruns its interval
//! causes the missed ticks to be skipped, never stacked.

use crate::channel::Channel;
use crate::config::ScheduleConfig;
use crate::orchestrator::MultiChannelCrawler;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

/// Drives recurring channel harvests until shut down
pub struct Scheduler {
    crawler: Arc<MultiChannelCrawler>,
    schedule: ScheduleConfig,
}

impl Scheduler {
    pub fn new(crawler: Arc<MultiChannelCrawler>, schedule: ScheduleConfig) -> Self {
        Self { crawler, schedule }
    }

    /// Interval between runs of one channel
    pub fn interval_for(schedule: &ScheduleConfig, channel: Channel) -> Duration {
        let hours = match channel {
            Channel::BestSellers => schedule.best_sellers_hours,
            Channel::MoversShakers => schedule.movers_shakers_hours,
            Channel::Outlet => schedule.outlet_hours,
            Channel::Warehouse => schedule.warehouse_hours,
        };
        // A zero interval would spin; clamp to one hour
        Duration::from_secs(hours.max(1) * 3600)
    }

    /// Runs every channel on its cadence; returns only if all loops stop
    pub async fn run(self) {
        let mut tasks = JoinSet::new();

        for channel in Channel::ALL {
            let crawler = Arc::clone(&self.crawler);
            let period = Self::interval_for(&self.schedule, channel);
            tracing::info!(
                "Scheduling {} every {} hours",
                channel,
                period.as_secs() / 3600
            );

            tasks.spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    tracing::info!("Scheduled harvest of {} starting", channel);
                    match crawler.run(&[channel], None).await {
                        Ok(summary) => tracing::info!(
                            "Scheduled harvest of {} done: {} products",
                            channel,
                            summary.total_products
                        ),
                        Err(e) => tracing::error!("Scheduled harvest of {} failed: {}", channel, e),
                    }
                }
            });
        }

        while tasks.join_next().await.is_some() {}
    }
}
