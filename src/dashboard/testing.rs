//! Scripted [`Inspector`] for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::json;
use tokio::sync::Notify;

use super::models::{
    Application, DashboardSummary, Jar, JarInventory, JvmDetails, MetadataPatch,
};
use crate::upstream::{Inspector, Result, UpstreamError, parse_base_url};

pub(crate) fn app(app_id: &str) -> Application {
    serde_json::from_value(json!({
        "appId": app_id,
        "name": format!("{app_id} service"),
        "description": "",
        "commandLine": format!("java -jar {app_id}.jar"),
        "jdkVersion": "21.0.2",
        "jdkVendor": "Eclipse Adoptium",
        "tags": [],
        "jarCount": 3
    }))
    .unwrap()
}

pub(crate) struct ScriptedInspector {
    base_url: Mutex<Url>,
    applications: Mutex<Vec<Application>>,
    healthy: AtomicBool,
    summary_fails: AtomicBool,
    metadata_fails: AtomicBool,
    hold_health: AtomicBool,
    gate: Arc<Notify>,
    health_calls: AtomicUsize,
    summary_calls: AtomicUsize,
}

impl ScriptedInspector {
    pub(crate) fn new(applications: Vec<Application>) -> Arc<Self> {
        Arc::new(Self {
            base_url: Mutex::new(parse_base_url("http://localhost:8080").unwrap()),
            applications: Mutex::new(applications),
            healthy: AtomicBool::new(true),
            summary_fails: AtomicBool::new(false),
            metadata_fails: AtomicBool::new(false),
            hold_health: AtomicBool::new(false),
            gate: Arc::new(Notify::new()),
            health_calls: AtomicUsize::new(0),
            summary_calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub(crate) fn set_summary_fails(&self, fails: bool) {
        self.summary_fails.store(fails, Ordering::SeqCst);
    }

    pub(crate) fn set_metadata_fails(&self, fails: bool) {
        self.metadata_fails.store(fails, Ordering::SeqCst);
    }

    pub(crate) fn set_applications(&self, applications: Vec<Application>) {
        *self.applications.lock().unwrap() = applications;
    }

    /// Makes health checks block until the returned gate is notified.
    pub(crate) fn hold_health_checks(&self) -> Arc<Notify> {
        self.hold_health.store(true, Ordering::SeqCst);
        Arc::clone(&self.gate)
    }

    pub(crate) fn release_health_checks(&self) {
        self.hold_health.store(false, Ordering::SeqCst);
    }

    pub(crate) fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait_for_health_calls(&self, expected: usize) {
        while self.health_calls() < expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl Inspector for ScriptedInspector {
    fn base_url(&self) -> Url {
        self.base_url.lock().unwrap().clone()
    }

    fn set_base_url(&self, url: Url) {
        *self.base_url.lock().unwrap() = url;
    }

    async fn check_health(&self) -> Result<()> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_health.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(UpstreamError::Unreachable("connection refused".into()))
        }
    }

    async fn fetch_dashboard_summary(&self) -> Result<DashboardSummary> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if self.summary_fails.load(Ordering::SeqCst) {
            return Err(UpstreamError::Timeout);
        }
        Ok(DashboardSummary {
            applications: self.applications.lock().unwrap().clone(),
            ..Default::default()
        })
    }

    async fn fetch_application_jars(&self, app_id: &str) -> Result<Vec<Jar>> {
        Err(UpstreamError::NotFound(format!("application {app_id}")))
    }

    async fn fetch_jvm_details(&self, app_id: &str) -> Result<JvmDetails> {
        Err(UpstreamError::NotFound(format!("application {app_id}")))
    }

    async fn fetch_global_jars(&self) -> Result<JarInventory> {
        Err(UpstreamError::Unreachable("not scripted".into()))
    }

    async fn fetch_jar_detail(&self, jar_id: &str) -> Result<Jar> {
        Err(UpstreamError::NotFound(format!("jar {jar_id}")))
    }

    async fn update_application_metadata(
        &self,
        app_id: &str,
        patch: &MetadataPatch,
    ) -> Result<Application> {
        if self.metadata_fails.load(Ordering::SeqCst) {
            return Err(UpstreamError::Rejected { status: 500 });
        }
        let mut persisted = app(app_id);
        persisted.apply(patch);
        Ok(persisted)
    }
}
