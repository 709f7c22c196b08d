use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use super::Dashboard;

/// Fixed-interval refresh driver.
///
/// Fires once immediately, then every `period`. A tick landing while a cycle
/// is still running is dropped rather than queued.
pub struct RefreshScheduler {
    dashboard: Arc<Dashboard>,
    period: Duration,
}

impl RefreshScheduler {
    pub fn new(dashboard: Arc<Dashboard>, period: Duration) -> Self {
        Self { dashboard, period }
    }

    /// Spawns the ticking task.
    ///
    /// Aborting the returned handle stops future ticks; a cycle that already
    /// started runs to completion on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        info!(period = ?self.period, "Refresh scheduler started");

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if !self.dashboard.request_refresh() {
                debug!("Previous refresh still running, tick skipped");
            }
        }
    }
}
