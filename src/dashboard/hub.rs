use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::models::{ConnectivityStatus, Snapshot};
use crate::observability::Metrics;

pub type SubscriberId = Uuid;

/// Message pushed to real-time subscribers.
///
/// Serialized as `{"type": "data-update", "data": {...}}` /
/// `{"type": "config-update", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum DashboardEvent {
    DataUpdate(Arc<Snapshot>),
    ConfigUpdate(ConfigUpdate),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub jlib_server_url: String,
    pub server_status: ConnectivityStatus,
}

/// Receiving end handed to one connection.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub events: mpsc::Receiver<DashboardEvent>,
}

/// Fan-out to every connected subscriber.
///
/// Each subscriber owns a bounded queue. A send that fails, either because
/// the connection is gone or because it stopped draining its queue, drops that
/// subscriber without affecting delivery to the others.
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<DashboardEvent>>>,
    buffer: usize,
    metrics: Arc<Metrics>,
}

impl BroadcastHub {
    pub fn new(buffer: usize, metrics: Arc<Metrics>) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            buffer: buffer.max(1),
            metrics,
        }
    }

    /// Adds a subscriber and queues `current` as its first event.
    pub fn register(&self, current: Arc<Snapshot>) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();

        // Fresh channel with capacity >= 1, cannot be full or closed yet.
        let _ = tx.try_send(DashboardEvent::DataUpdate(current));

        let total = {
            let mut subscribers = self.lock();
            subscribers.insert(id, tx);
            subscribers.len()
        };
        info!(subscriber = %id, total, "Subscriber registered");

        Subscription { id, events: rx }
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            info!(subscriber = %id, "Subscriber unregistered");
        }
        removed
    }

    /// Sends `event` to every registered subscriber, pruning dead ones.
    ///
    /// Returns the number of subscribers the event was queued for.
    pub fn broadcast(&self, event: DashboardEvent) -> usize {
        let mut subscribers = self.lock();
        let mut dead = Vec::new();

        for (id, tx) in subscribers.iter() {
            match tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Closed(_)) => {
                    debug!(subscriber = %id, "Subscriber connection closed");
                    dead.push(*id);
                }
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber = %id, "Subscriber queue full, dropping");
                    dead.push(*id);
                }
            }
        }

        for id in &dead {
            subscribers.remove(id);
            self.metrics.subscriber_pruned();
        }

        let delivered = subscribers.len();
        self.metrics.broadcast_sent();
        debug!(delivered, pruned = dead.len(), "Event broadcast");
        delivered
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriberId, mpsc::Sender<DashboardEvent>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
