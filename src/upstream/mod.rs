//! Client side of the inspection server contract.
//!
//! The [`Inspector`] trait is the seam between the dashboard and the server
//! doing the JVM introspection. [`HttpInspector`] implements it over HTTP;
//! tests substitute scripted implementations.
//!
//! No call retries. The refresh cadence is the retry policy for polling and
//! the browser retries proxied reads itself.

mod client;
mod error;

pub use client::{HttpInspector, HttpSettings};
pub use error::{Result, UpstreamError};

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;

use crate::dashboard::models::{
    Application, DashboardSummary, Jar, JarInventory, JvmDetails, MetadataPatch,
};

#[async_trait]
pub trait Inspector: Send + Sync {
    /// Current target. Always ends with a path separator.
    fn base_url(&self) -> Url;

    /// Points subsequent calls at `url`. Calls already in flight finish
    /// against the previous target.
    fn set_base_url(&self, url: Url);

    /// `GET /health`
    async fn check_health(&self) -> Result<()>;

    /// `GET /api/apps`
    async fn fetch_dashboard_summary(&self) -> Result<DashboardSummary>;

    /// `GET /api/apps/{appId}/jars`
    async fn fetch_application_jars(&self, app_id: &str) -> Result<Vec<Jar>>;

    /// `GET /api/apps/{appId}/jvm`
    async fn fetch_jvm_details(&self, app_id: &str) -> Result<JvmDetails>;

    /// `GET /api/jars`
    async fn fetch_global_jars(&self) -> Result<JarInventory>;

    /// `GET /api/jars/{jarId}`
    async fn fetch_jar_detail(&self, jar_id: &str) -> Result<Jar>;

    /// `PUT /api/apps/{appId}/metadata`, returning upstream's persisted copy.
    async fn update_application_metadata(
        &self,
        app_id: &str,
        patch: &MetadataPatch,
    ) -> Result<Application>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BaseUrlError {
    #[error("URL is empty")]
    Empty,
    #[error("URL is malformed: {0}")]
    Malformed(String),
    #[error("URL scheme must be http or https, got '{0}'")]
    UnsupportedScheme(String),
    #[error("URL must include a host")]
    MissingHost,
    #[error("URL must not carry a query string or fragment")]
    UnexpectedQuery,
}

/// Parses and normalizes an inspection server base URL.
///
/// Accepts absolute `http`/`https` URLs with a host, optionally with a path
/// prefix (for servers mounted behind a reverse proxy). The result always
/// ends with `/` so endpoint paths can be appended to it.
pub fn parse_base_url(raw: &str) -> std::result::Result<Url, BaseUrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(BaseUrlError::Empty);
    }

    let mut url = Url::parse(raw).map_err(|e| BaseUrlError::Malformed(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(BaseUrlError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(BaseUrlError::MissingHost);
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(BaseUrlError::UnexpectedQuery);
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
