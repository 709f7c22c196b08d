//! One reconciliation cycle against the inspection server.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::models::{ConnectivityStatus, DashboardSummary, Snapshot};
use crate::upstream::{Inspector, UpstreamError};

/// Result of polling the inspection server once.
#[derive(Debug)]
pub enum Reconciliation {
    Connected {
        summary: DashboardSummary,
        at: DateTime<Utc>,
    },
    Disconnected {
        reason: UpstreamError,
        at: DateTime<Utc>,
    },
}

/// Polls health, then the application listing.
///
/// Either call failing yields [`Reconciliation::Disconnected`]; nothing is
/// retried here.
pub async fn reconcile(inspector: &dyn Inspector) -> Reconciliation {
    if let Err(reason) = inspector.check_health().await {
        warn!(error = %reason, "Inspection server health check failed");
        return Reconciliation::Disconnected {
            reason,
            at: Utc::now(),
        };
    }

    match inspector.fetch_dashboard_summary().await {
        Ok(summary) => {
            debug!(applications = summary.applications.len(), "Fetched application list");
            Reconciliation::Connected {
                summary,
                at: Utc::now(),
            }
        }
        Err(reason) => {
            warn!(error = %reason, "Fetching application list failed");
            Reconciliation::Disconnected {
                reason,
                at: Utc::now(),
            }
        }
    }
}

impl Reconciliation {
    pub fn is_connected(&self) -> bool {
        matches!(self, Reconciliation::Connected { .. })
    }

    /// Builds the snapshot that follows `previous`.
    ///
    /// A failed cycle keeps `previous`'s applications and counts and only
    /// flips the status. A successful one replaces them wholesale; embedded
    /// jars are dropped since the browser loads them per application.
    pub fn apply(self, previous: &Snapshot) -> Snapshot {
        match self {
            Reconciliation::Disconnected { at, .. } => previous.disconnected(at),
            Reconciliation::Connected { summary, at } => {
                let counts = summary.counts();
                let last_updated = summary
                    .last_updated
                    .as_deref()
                    .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                    .map(|ts| ts.with_timezone(&Utc))
                    .unwrap_or(at);

                let applications = summary
                    .applications
                    .into_iter()
                    .map(|mut app| {
                        app.jars = None;
                        app
                    })
                    .collect();

                let mut next = Snapshot {
                    applications,
                    last_updated: Some(last_updated),
                    connectivity_status: ConnectivityStatus::Connected,
                    jlib_server_url: previous.jlib_server_url.clone(),
                    ..Snapshot::initial(String::new())
                };
                next.set_counts(counts);
                next
            }
        }
    }
}
