//! Fixed-interval status polling.
//!
//! The poller feeds the same handler sink as channel pushes, so both
//! sources race to update the same displayed fields and the last write
//! wins. A failed poll logs and waits for the next tick; there is no
//! early retry.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use forgeboard_feed::{StatsUpdate, StatusUpdate, UpdateHandler};

use crate::{ApiClient, BotStatus};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Polls `GET /api/status` on a fixed interval.
pub struct StatusPoller {
    client: ApiClient,
    interval: Duration,
}

impl StatusPoller {
    #[must_use]
    pub fn new(client: ApiClient, interval: Duration) -> Self {
        Self { client, interval }
    }

    /// Poll until the task is dropped. The first fetch happens
    /// immediately; later ones on the fixed interval.
    pub async fn run(&self, handler: Arc<dyn UpdateHandler>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.client.status().await {
                Ok(status) => {
                    debug!("status poll succeeded");
                    handler.on_status(&status_to_update(&status));
                }
                Err(error) => warn!("status poll failed: {error}"),
            }
        }
    }
}

/// Map a REST status payload onto the feed's update shape so polls and
/// pushes drive the same handlers.
#[must_use]
pub fn status_to_update(status: &BotStatus) -> StatusUpdate {
    StatusUpdate {
        running: Some(status.running),
        uptime: status.uptime.clone(),
        version: status.version.clone(),
        commands: status.commands,
        modules: status.modules,
        stats: Some(StatsUpdate {
            messages: Some(status.stats.messages),
            commands_executed: Some(status.stats.commands_executed),
        }),
        activity: None,
        logs: None,
    }
}
