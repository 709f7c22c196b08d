//! Polling, caching and fan-out of dashboard state.
//!
//! [`Dashboard`] is the application context shared by every handler. It owns
//! the [`SnapshotStore`], the [`BroadcastHub`] and the [`Inspector`] used to
//! reach the inspection server, and enforces the ordering rules between them:
//!
//! - at most one reconciliation cycle runs at a time; concurrent requests are
//!   coalesced into the running one
//! - every commit is broadcast exactly once, in commit order
//! - a new subscriber gets the current snapshot and then every later event,
//!   with no gap and no duplicate
//!
//! ```text
//! RefreshScheduler ──tick──▶ Dashboard::refresh ──▶ reconcile(Inspector)
//!                                   │
//!                         commit ▼  ▼ broadcast
//!                      SnapshotStore  BroadcastHub ──▶ subscribers
//! ```

pub mod hub;
pub mod models;
pub mod reconciler;
pub mod scheduler;
pub mod store;

pub use hub::{BroadcastHub, ConfigUpdate, DashboardEvent, SubscriberId, Subscription};
pub use models::{ConnectivityStatus, Snapshot};
pub use scheduler::RefreshScheduler;
pub use store::SnapshotStore;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use reqwest::Url;
use tracing::{info, warn};

use crate::observability::Metrics;
use crate::upstream::{Inspector, UpstreamError};
use models::{Application, MetadataPatch};
use reconciler::Reconciliation;

/// What a refresh request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Connected,
    Disconnected,
    /// Another cycle was already running; this request joined it.
    Coalesced,
}

#[derive(bon::Builder)]
pub struct Dashboard {
    inspector: Arc<dyn Inspector>,
    #[builder(default = Arc::new(Metrics::new()))]
    metrics: Arc<Metrics>,
    #[builder(default = 64)]
    subscriber_buffer: usize,
    #[builder(skip = SnapshotStore::new(Snapshot::initial(inspector.base_url().as_str())))]
    store: SnapshotStore,
    #[builder(skip = BroadcastHub::new(subscriber_buffer, Arc::clone(&metrics)))]
    hub: BroadcastHub,
    #[builder(skip)]
    refreshing: AtomicBool,
    /// Bumped whenever the upstream target changes.
    #[builder(skip)]
    generation: AtomicU64,
    /// Serializes commit+broadcast pairs and subscriber catch-up.
    #[builder(skip)]
    publish: Mutex<()>,
}

impl Dashboard {
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.read()
    }

    pub fn inspector(&self) -> &dyn Inspector {
        self.inspector.as_ref()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.len()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Registers a real-time subscriber; its first event is the current snapshot.
    pub fn subscribe(&self) -> Subscription {
        let _guard = self.lock_publish();
        self.hub.register(self.store.read())
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.hub.unregister(id);
    }

    /// Runs one reconciliation cycle, or joins the one already running.
    pub async fn refresh(&self) -> RefreshOutcome {
        if !self.try_begin_refresh() {
            return RefreshOutcome::Coalesced;
        }
        let in_flight = InFlight::new(&self.refreshing);
        self.run_cycle(&in_flight).await
    }

    /// Starts a cycle in the background unless one is already running.
    ///
    /// Returns `false` when the request was coalesced.
    pub fn request_refresh(self: &Arc<Self>) -> bool {
        if !self.try_begin_refresh() {
            return false;
        }

        let dashboard = Arc::clone(self);
        tokio::spawn(async move {
            let in_flight = InFlight::new(&dashboard.refreshing);
            dashboard.run_cycle(&in_flight).await;
        });
        true
    }

    /// Points the dashboard at a different inspection server.
    ///
    /// Clears the cached applications, announces the change with a
    /// `config-update` event and kicks off a reconciliation right away.
    pub fn reconfigure(self: &Arc<Self>, url: Url) {
        {
            let _guard = self.lock_publish();
            self.inspector.set_base_url(url.clone());
            self.generation.fetch_add(1, Ordering::AcqRel);

            let snapshot = self
                .store
                .commit(Snapshot::connecting(url.as_str(), Utc::now()));
            self.hub.broadcast(DashboardEvent::ConfigUpdate(ConfigUpdate {
                jlib_server_url: snapshot.jlib_server_url.clone(),
                server_status: snapshot.connectivity_status,
            }));
        }
        info!(url = %url, "Inspection server target changed");

        if !self.request_refresh() {
            // The running cycle notices the generation bump and polls again.
            info!("Refresh already running, it will pick up the new target");
        }
    }

    /// Writes metadata through to the inspection server, then patches the
    /// cached application and broadcasts the result.
    ///
    /// Nothing is changed locally unless the inspection server accepts the
    /// write. Returns the inspection server's persisted copy.
    pub async fn update_metadata(
        &self,
        app_id: &str,
        patch: &MetadataPatch,
    ) -> Result<Application, UpstreamError> {
        let persisted = self
            .inspector
            .update_application_metadata(app_id, patch)
            .await?;

        let _guard = self.lock_publish();
        match self.store.patch_application(app_id, patch) {
            Some(snapshot) => {
                self.hub.broadcast(DashboardEvent::DataUpdate(snapshot));
                info!(app_id, "Application metadata updated");
            }
            None => {
                warn!(app_id, "Metadata accepted upstream for an application not in the cache");
            }
        }

        Ok(persisted)
    }

    fn try_begin_refresh(&self) -> bool {
        let started = self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !started {
            self.metrics.refresh_coalesced();
        }
        started
    }

    async fn run_cycle(&self, in_flight: &InFlight<'_>) -> RefreshOutcome {
        loop {
            let generation = self.generation.load(Ordering::Acquire);
            let outcome = reconciler::reconcile(self.inspector.as_ref()).await;

            match self.publish_reconciliation(generation, outcome, in_flight) {
                Some(outcome) => return outcome,
                None => info!("Inspection server changed during refresh, polling again"),
            }
        }
    }

    /// Commits and broadcasts a cycle's result unless the target changed
    /// while it was running.
    ///
    /// The in-flight flag is cleared before the publish lock is released, so
    /// a `reconfigure` serialized after this commit always starts a new cycle.
    fn publish_reconciliation(
        &self,
        generation: u64,
        outcome: Reconciliation,
        in_flight: &InFlight<'_>,
    ) -> Option<RefreshOutcome> {
        let _guard = self.lock_publish();
        if self.generation.load(Ordering::Acquire) != generation {
            return None;
        }

        let connected = outcome.is_connected();
        let snapshot = self
            .store
            .update(|previous| Some(outcome.apply(previous)))?;

        if connected {
            self.metrics.refresh_succeeded();
            info!(
                applications = snapshot.applications.len(),
                jars = snapshot.jar_count,
                "Dashboard refreshed"
            );
        } else {
            self.metrics.refresh_failed();
            warn!(
                applications = snapshot.applications.len(),
                "Inspection server unreachable, keeping last known applications"
            );
        }

        self.hub.broadcast(DashboardEvent::DataUpdate(snapshot));
        in_flight.release();

        Some(if connected {
            RefreshOutcome::Connected
        } else {
            RefreshOutcome::Disconnected
        })
    }

    fn lock_publish(&self) -> std::sync::MutexGuard<'_, ()> {
        self.publish.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight flag when a cycle ends, however it ends.
///
/// Releases at most once: after an explicit [`InFlight::release`] the flag may
/// already belong to the next cycle, so dropping the guard leaves it alone.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    armed: AtomicBool,
}

impl<'a> InFlight<'a> {
    fn new(flag: &'a AtomicBool) -> Self {
        Self {
            flag,
            armed: AtomicBool::new(true),
        }
    }

    fn release(&self) {
        if self.armed.swap(false, Ordering::AcqRel) {
            self.flag.store(false, Ordering::Release);
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
pub(crate) mod testing;
