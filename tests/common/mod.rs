//! In-process stand-in for the inspection server.
//!
//! Serves the subset of the inspection server's HTTP contract the dashboard
//! consumes, backed by fixtures that tests can change while it runs.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Fixtures {
    unhealthy: bool,
    metadata_fails: bool,
    applications: Vec<Value>,
    app_jars: HashMap<String, Vec<Value>>,
    jvm: HashMap<String, Value>,
    jar_details: HashMap<String, Value>,
    inventory: Vec<Value>,
    summary_calls: usize,
    metadata_calls: usize,
}

#[derive(Clone)]
pub struct MockInspectionServer {
    pub url: String,
    fixtures: Arc<Mutex<Fixtures>>,
}

impl MockInspectionServer {
    /// Starts a server on an ephemeral port with two applications.
    pub async fn start() -> Self {
        let fixtures = Arc::new(Mutex::new(Fixtures {
            applications: vec![
                application("orders", "Orders Service", &["prod"]),
                application("billing", "Billing Service", &[]),
            ],
            app_jars: HashMap::from([(
                "orders".to_string(),
                vec![json!({
                    "jarId": "j-1",
                    "fileName": "spring-core-6.1.0.jar",
                    "path": "/app/lib/spring-core-6.1.0.jar",
                    "checksum": "abc123",
                    "size": 1024,
                    "loaded": true
                })],
            )]),
            jvm: HashMap::from([(
                "orders".to_string(),
                json!({ "heap": { "used": 1024, "max": 4096 }, "threads": 12 }),
            )]),
            jar_details: HashMap::from([(
                "j-1".to_string(),
                json!({
                    "jarId": "j-1",
                    "fileName": "spring-core-6.1.0.jar",
                    "checksum": "abc123",
                    "size": 1024,
                    "applications": [
                        { "appId": "orders", "loaded": true, "path": "/app/lib/spring-core-6.1.0.jar" }
                    ]
                }),
            )]),
            inventory: vec![json!({
                "jarId": "j-1",
                "fileName": "spring-core-6.1.0.jar",
                "checksum": "abc123",
                "size": 1024,
                "appCount": 1,
                "loadedAppCount": 1
            })],
            ..Fixtures::default()
        }));

        let app = Router::new()
            .route("/health", get(health))
            .route("/api/apps", get(list_apps))
            .route("/api/apps/{app_id}/jars", get(app_jars))
            .route("/api/apps/{app_id}/jvm", get(jvm))
            .route("/api/apps/{app_id}/metadata", put(update_metadata))
            .route("/api/jars", get(inventory))
            .route("/api/jars/{jar_id}", get(jar_detail))
            .with_state(Arc::clone(&fixtures));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock inspection server");
        let addr = listener.local_addr().expect("Failed to read mock address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            url: format!("http://{}", addr),
            fixtures,
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.fixtures.lock().unwrap().unhealthy = !healthy;
    }

    pub fn set_metadata_fails(&self, fails: bool) {
        self.fixtures.lock().unwrap().metadata_fails = fails;
    }

    pub fn set_applications(&self, applications: Vec<Value>) {
        self.fixtures.lock().unwrap().applications = applications;
    }

    pub fn summary_calls(&self) -> usize {
        self.fixtures.lock().unwrap().summary_calls
    }

    pub fn metadata_calls(&self) -> usize {
        self.fixtures.lock().unwrap().metadata_calls
    }
}

pub fn application(app_id: &str, name: &str, tags: &[&str]) -> Value {
    json!({
        "appId": app_id,
        "name": name,
        "description": "",
        "commandLine": format!("java -jar {app_id}.jar"),
        "jdkVersion": "21.0.2",
        "jdkVendor": "Eclipse Adoptium",
        "tags": tags,
        "jarCount": 1,
        "lastUpdated": "2025-01-01T10:00:00Z"
    })
}

/// An address nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Polls `condition` until it holds or five seconds pass.
pub async fn eventually<F: FnMut() -> bool>(mut condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

type Shared = State<Arc<Mutex<Fixtures>>>;

async fn health(State(fixtures): Shared) -> StatusCode {
    if fixtures.lock().unwrap().unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

async fn list_apps(State(fixtures): Shared) -> impl IntoResponse {
    let mut fixtures = fixtures.lock().unwrap();
    fixtures.summary_calls += 1;
    Json(json!({
        "applications": fixtures.applications,
        "lastUpdated": "2025-01-01T10:00:00Z"
    }))
}

async fn app_jars(State(fixtures): Shared, Path(app_id): Path<String>) -> impl IntoResponse {
    match fixtures.lock().unwrap().app_jars.get(&app_id) {
        Some(jars) => Json(json!({ "jars": jars })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn jvm(State(fixtures): Shared, Path(app_id): Path<String>) -> impl IntoResponse {
    match fixtures.lock().unwrap().jvm.get(&app_id) {
        Some(details) => Json(details.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn inventory(State(fixtures): Shared) -> impl IntoResponse {
    Json(json!({ "jars": fixtures.lock().unwrap().inventory }))
}

async fn jar_detail(State(fixtures): Shared, Path(jar_id): Path<String>) -> impl IntoResponse {
    match fixtures.lock().unwrap().jar_details.get(&jar_id) {
        Some(jar) => Json(jar.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn update_metadata(
    State(fixtures): Shared,
    Path(app_id): Path<String>,
    Json(patch): Json<Value>,
) -> impl IntoResponse {
    let mut fixtures = fixtures.lock().unwrap();
    fixtures.metadata_calls += 1;
    if fixtures.metadata_fails {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let Some(app) = fixtures
        .applications
        .iter_mut()
        .find(|app| app["appId"] == app_id.as_str())
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    for field in ["name", "description", "tags"] {
        if let Some(value) = patch.get(field) {
            app[field] = value.clone();
        }
    }
    Json(app.clone()).into_response()
}
