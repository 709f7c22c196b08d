//! Dashboard data model.
//!
//! The [`Snapshot`] is the single aggregate handed to the browser, both through
//! `GET /api/dashboard` and through the real-time channel. Applications and
//! jars mirror what the inspection server reports; fields the dashboard does
//! not interpret are kept in a flattened `extra` map and relayed untouched.
//!
//! Wire format is camelCase to match the inspection server and the browser
//! bundle, e.g.
//!
//! ```json
//! {
//!   "applications": [{ "appId": "a1b2", "name": "orders", "tags": ["prod"] }],
//!   "applicationCount": 1,
//!   "jarCount": 42,
//!   "activeJarCount": 40,
//!   "inactiveJarCount": 2,
//!   "lastUpdated": "2025-01-01T10:00:00Z",
//!   "serverStatus": "connected",
//!   "jlibServerUrl": "http://localhost:8080/"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Sentinel the inspection server uses when a checksum could not be computed.
pub const CHECKSUM_UNAVAILABLE: &str = "?";

/// Outcome of the most recent reconciliation attempt.
///
/// Only the reconciler (and the upstream reconfiguration path, which sets
/// `Connecting`) writes this. The real-time transport never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityStatus {
    #[default]
    Unknown,
    Connecting,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub applications: Vec<Application>,
    pub application_count: usize,
    pub jar_count: usize,
    pub active_jar_count: usize,
    pub inactive_jar_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(rename = "serverStatus")]
    pub connectivity_status: ConnectivityStatus,
    pub jlib_server_url: String,
}

impl Snapshot {
    /// State before the first reconciliation has run.
    pub fn initial(jlib_server_url: impl Into<String>) -> Self {
        Self {
            applications: Vec::new(),
            application_count: 0,
            jar_count: 0,
            active_jar_count: 0,
            inactive_jar_count: 0,
            last_updated: None,
            connectivity_status: ConnectivityStatus::Unknown,
            jlib_server_url: jlib_server_url.into(),
        }
    }

    /// Same data, flagged as unreachable at `at`.
    ///
    /// Applications and counts are carried over from `self` so a connection
    /// blip never empties the dashboard.
    pub fn disconnected(&self, at: DateTime<Utc>) -> Self {
        Self {
            last_updated: Some(at),
            connectivity_status: ConnectivityStatus::Disconnected,
            ..self.clone()
        }
    }

    /// Empty state used right after the upstream target changes.
    pub fn connecting(jlib_server_url: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            last_updated: Some(at),
            connectivity_status: ConnectivityStatus::Connecting,
            ..Self::initial(jlib_server_url)
        }
    }

    pub fn application(&self, app_id: &str) -> Option<&Application> {
        self.applications.iter().find(|app| app.app_id == app_id)
    }

    pub fn set_counts(&mut self, counts: Counts) {
        self.application_count = counts.applications;
        self.jar_count = counts.jars;
        self.active_jar_count = counts.active_jars;
        self.inactive_jar_count = counts.inactive_jars;
    }
}

/// One monitored JVM process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub app_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub command_line: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub jdk_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub jdk_vendor: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Number of jars upstream attributes to this application, when the bulk
    /// listing reports it instead of embedding the jars themselves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jar_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jars: Option<Vec<Jar>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Application {
    /// Applies the editable fields present in `patch`, leaving the rest alone.
    pub fn apply(&mut self, patch: &MetadataPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
    }
}

/// A dependency artifact, top-level or nested inside another archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Jar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jar_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default = "unavailable_checksum", deserialize_with = "checksum_or_sentinel")]
    pub checksum: String,
    #[serde(default = "unknown_size")]
    pub size: i64,
    #[serde(default)]
    pub loaded: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub manifest: BTreeMap<String, String>,
    /// Back-references, present on the per-jar detail view only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<JarUsage>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Jar {
    /// Stable identity: upstream `jarId`, falling back to the path.
    pub fn identity(&self) -> &str {
        self.jar_id.as_deref().unwrap_or(&self.path)
    }

    pub fn known_checksum(&self) -> Option<&str> {
        Some(self.checksum.as_str()).filter(|sum| !sum.is_empty() && *sum != CHECKSUM_UNAVAILABLE)
    }

    /// Size in bytes; `None` for the `-1`/`0` "unknown" sentinels.
    pub fn known_size(&self) -> Option<u64> {
        u64::try_from(self.size).ok().filter(|size| *size > 0)
    }
}

fn unavailable_checksum() -> String {
    CHECKSUM_UNAVAILABLE.to_string()
}

fn unknown_size() -> i64 {
    -1
}

/// Where and how one application uses a jar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JarUsage {
    pub app_id: String,
    #[serde(default)]
    pub loaded: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /api/apps/{appId}/jars` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JarList {
    #[serde(default)]
    pub jars: Vec<Jar>,
}

/// Entry of the deduplicated, server-wide jar inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JarSummary {
    pub jar_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_name: String,
    #[serde(default = "unavailable_checksum", deserialize_with = "checksum_or_sentinel")]
    pub checksum: String,
    #[serde(default = "unknown_size")]
    pub size: i64,
    #[serde(default)]
    pub app_count: usize,
    #[serde(default)]
    pub loaded_app_count: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /api/jars` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JarInventory {
    #[serde(default)]
    pub jars: Vec<JarSummary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// JVM runtime details. Opaque to the dashboard, relayed as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JvmDetails(pub Value);

/// Bulk listing returned by the inspection server.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub application_count: Option<usize>,
    #[serde(default)]
    pub jar_count: Option<usize>,
    #[serde(default)]
    pub active_jar_count: Option<usize>,
    #[serde(default)]
    pub inactive_jar_count: Option<usize>,
}

impl DashboardSummary {
    /// Counts for the snapshot: upstream figures win, local ones fill gaps.
    pub fn counts(&self) -> Counts {
        let local = Counts::derive(&self.applications);
        let jars = self.jar_count.unwrap_or(local.jars);
        // A partial upstream split is completed so that active + inactive == jars.
        let (active_jars, inactive_jars) = match (self.active_jar_count, self.inactive_jar_count) {
            (Some(active), Some(inactive)) => (active, inactive),
            (Some(active), None) => (active, jars.saturating_sub(active)),
            (None, Some(inactive)) => (jars.saturating_sub(inactive), inactive),
            (None, None) if self.jar_count.is_none() => (local.active_jars, local.inactive_jars),
            (None, None) => (0, jars),
        };
        Counts {
            applications: self.application_count.unwrap_or(local.applications),
            jars,
            active_jars,
            inactive_jars,
        }
    }
}

/// Editable application metadata. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl MetadataPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.tags.is_none()
    }
}

/// Aggregate counts shown on the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub applications: usize,
    pub jars: usize,
    pub active_jars: usize,
    pub inactive_jars: usize,
}

impl Counts {
    /// Computes counts from the applications alone.
    ///
    /// Embedded jars are deduplicated by identity; a jar is active when any
    /// application has it loaded. Without embedded jars only the per-app
    /// `jarCount` hints are available: the total is their sum and, since
    /// none of those jars is known to be loaded, they count as inactive.
    /// `jars == active_jars + inactive_jars` always holds.
    pub fn derive(applications: &[Application]) -> Self {
        let mut seen = HashSet::new();
        let mut active = HashSet::new();
        let mut hinted = 0;

        for app in applications {
            match &app.jars {
                Some(jars) if !jars.is_empty() => {
                    for jar in jars {
                        seen.insert(jar.identity());
                        if jar.loaded {
                            active.insert(jar.identity());
                        }
                    }
                }
                _ => hinted += app.jar_count.unwrap_or(0),
            }
        }

        let jars = seen.len() + hinted;
        Self {
            applications: applications.len(),
            jars,
            active_jars: active.len(),
            inactive_jars: seen.len() - active.len() + hinted,
        }
    }
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn checksum_or_sentinel<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|sum| !sum.is_empty())
        .unwrap_or_else(unavailable_checksum))
}
