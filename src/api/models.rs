//! Request and response bodies of the dashboard API that are not part of the
//! dashboard data model itself (see [`crate::dashboard::models`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dashboard::ConnectivityStatus;
use crate::observability::MetricsSnapshot;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

/// `POST /api/server-config` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfigRequest {
    pub jlib_server_url: String,
}

/// `GET`/`POST /api/server-config` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfigResponse {
    pub jlib_server_url: String,
    pub server_status: ConnectivityStatus,
}

/// `POST /api/refresh` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// `false` when the request joined a cycle already in flight
    pub accepted: bool,
}

/// `GET /api/health` response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub jlib_server_status: ConnectivityStatus,
    pub applications_count: usize,
    pub subscribers: usize,
    pub version: &'static str,
    pub metrics: MetricsSnapshot,
}
