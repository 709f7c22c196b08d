//! HTTP implementation of [`Inspector`].

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::{Result, UpstreamError};
use super::Inspector;
use crate::config::UpstreamConfig;
use crate::dashboard::models::{
    Application, DashboardSummary, Jar, JarInventory, JarList, JvmDetails, MetadataPatch,
};

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            user_agent: format!("jlib-dashboard/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&UpstreamConfig> for HttpSettings {
    fn from(config: &UpstreamConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout.as_duration(),
            request_timeout: config.request_timeout.as_duration(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Talks to the inspection server over HTTP.
///
/// The target can be swapped at runtime; the underlying connection pool is
/// shared across targets.
pub struct HttpInspector {
    client: Client,
    base_url: RwLock<Url>,
}

impl HttpInspector {
    pub fn new(base_url: Url, settings: &HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(&settings.user_agent)
            .build()
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: RwLock::new(base_url),
        })
    }

    /// Builds `<base>/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url();
        match url.path_segments_mut() {
            Ok(mut path) => {
                path.pop_if_empty().extend(segments);
            }
            Err(()) => return Err(UpstreamError::InvalidUrl(self.base_url().to_string())),
        }
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "Upstream request");
        Ok(self.client.request(method, url))
    }

    /// Sends the request and sorts the outcome into not-found, unreachable
    /// or success.
    async fn send(&self, request: RequestBuilder, entity: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::Unreachable(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound(entity.to_string()));
        }
        if !status.is_success() {
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str], entity: &str) -> Result<T> {
        let request = self.request(Method::GET, segments)?;
        let response = self.send(request, entity).await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else {
            UpstreamError::InvalidResponse(e.to_string())
        }
    })
}

#[async_trait]
impl Inspector for HttpInspector {
    fn base_url(&self) -> Url {
        self.base_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_base_url(&self, url: Url) {
        *self.base_url.write().unwrap_or_else(PoisonError::into_inner) = url;
    }

    async fn check_health(&self) -> Result<()> {
        let request = self.request(Method::GET, &["health"])?;
        self.send(request, "health endpoint").await?;
        Ok(())
    }

    async fn fetch_dashboard_summary(&self) -> Result<DashboardSummary> {
        self.get_json(&["api", "apps"], "application list").await
    }

    async fn fetch_application_jars(&self, app_id: &str) -> Result<Vec<Jar>> {
        let list: JarList = self
            .get_json(&["api", "apps", app_id, "jars"], &format!("application {app_id}"))
            .await?;
        Ok(list.jars)
    }

    async fn fetch_jvm_details(&self, app_id: &str) -> Result<JvmDetails> {
        self.get_json(&["api", "apps", app_id, "jvm"], &format!("application {app_id}"))
            .await
    }

    async fn fetch_global_jars(&self) -> Result<JarInventory> {
        self.get_json(&["api", "jars"], "jar inventory").await
    }

    async fn fetch_jar_detail(&self, jar_id: &str) -> Result<Jar> {
        self.get_json(&["api", "jars", jar_id], &format!("jar {jar_id}"))
            .await
    }

    async fn update_application_metadata(
        &self,
        app_id: &str,
        patch: &MetadataPatch,
    ) -> Result<Application> {
        let request = self
            .request(Method::PUT, &["api", "apps", app_id, "metadata"])?
            .json(patch);
        let response = self.send(request, &format!("application {app_id}")).await?;
        decode(response).await
    }
}
