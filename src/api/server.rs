use std::sync::Arc;

use axum::{
    Router,
    routing::{any, get, post, put},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    decompression::RequestDecompressionLayer,
    services::{ServeDir, ServeFile},
};
use tracing::info;

use super::{
    services::{
        api_not_found, get_application, get_application_jars, get_dashboard, get_jar,
        get_jvm_details, get_server_config, health, list_applications, list_jars, refresh,
        update_metadata, update_server_config,
    },
    state::AppState,
    ws,
};
use crate::config::Config;
use crate::dashboard::{Dashboard, RefreshScheduler};
use crate::observability::Metrics;
use crate::upstream::{HttpInspector, HttpSettings, Inspector, parse_base_url};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Builds the dashboard's HTTP surface over `state`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route(
            "/api/server-config",
            get(get_server_config).post(update_server_config),
        )
        .route("/api/apps", get(list_applications))
        .route("/api/apps/{app_id}", get(get_application))
        .route("/api/apps/{app_id}/jars", get(get_application_jars))
        .route("/api/apps/{app_id}/jvm", get(get_jvm_details))
        .route("/api/apps/{app_id}/metadata", put(update_metadata))
        .route("/api/applications", get(list_applications))
        .route("/api/applications/{app_id}", get(get_application))
        .route("/api/jars", get(list_jars))
        .route("/api/jars/{jar_id}", get(get_jar))
        .route("/api/refresh", post(refresh))
        .route("/api/health", get(health))
        .route("/api", any(api_not_found))
        .route("/api/{*rest}", any(api_not_found))
        .route("/ws", get(ws::subscribe));

    let app = match &state.config.server.static_dir {
        Some(dir) => {
            // Client-side routes resolve to the bundle's entry point.
            let static_service =
                ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html")));
            api.fallback_service(static_service)
        }
        None => api.fallback(api_not_found),
    };

    app.with_state(state)
        .layer(CorsLayer::permissive())
        // Automatically decompress gzip request bodies
        .layer(RequestDecompressionLayer::new())
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    let base_url = parse_base_url(&config.upstream.base_url)
        .map_err(|e| format!("Invalid upstream base URL: {}", e))?;
    let inspector = HttpInspector::new(base_url, &HttpSettings::from(&config.upstream))
        .map_err(|e| format!("Failed to build inspection server client: {}", e))?;

    let dashboard = Arc::new(
        Dashboard::builder()
            .inspector(Arc::new(inspector) as Arc<dyn Inspector>)
            .metrics(Arc::new(Metrics::new()))
            .subscriber_buffer(config.subscribers.buffer)
            .build(),
    );

    info!(
        upstream = %dashboard.inspector().base_url(),
        interval = %config.refresh.interval,
        "Starting refresh scheduler"
    );
    let scheduler =
        RefreshScheduler::new(Arc::clone(&dashboard), config.refresh.interval.as_duration())
            .spawn();

    let address = config.server.bind_addr;
    if let Some(dir) = &config.server.static_dir {
        info!(path = %dir.display(), "Serving browser bundle");
    }
    let app = router(AppState::new(config, dashboard));

    let listener = TcpListener::bind(address).await?;
    info!(%address, "JLib dashboard listening");

    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    scheduler.abort();
    info!("Refresh scheduler stopped");

    served?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
