use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{info, warn};

use super::{
    models::{HealthResponse, RefreshResponse, ServerConfigRequest, ServerConfigResponse},
    state::AppState,
    utils::read_json_body,
    validation::validate_metadata,
};
use crate::api::error::ApiError;
use crate::dashboard::models::{JarList, MetadataPatch};
use crate::upstream::{UpstreamError, parse_base_url};

/// Current snapshot (GET /api/dashboard)
pub async fn get_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.dashboard.snapshot())
}

/// Cached application list (GET /api/apps, GET /api/applications)
///
/// Applications are listed without their jars; those are fetched per
/// application through [`get_application_jars`].
pub async fn list_applications(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.dashboard.snapshot();
    Json(snapshot.applications.clone())
}

/// One cached application (GET /api/apps/{app_id})
pub async fn get_application(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.dashboard.snapshot();
    let application = snapshot
        .application(&app_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("application {app_id}")))?;

    Ok(Json(application))
}

/// Jars of one application, read through (GET /api/apps/{app_id}/jars)
pub async fn get_application_jars(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let jars = state
        .dashboard
        .inspector()
        .fetch_application_jars(&app_id)
        .await
        .map_err(|err| proxy_error(&state, "application jars", err))?;

    Ok(Json(JarList { jars }))
}

/// JVM runtime details, read through (GET /api/apps/{app_id}/jvm)
pub async fn get_jvm_details(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state
        .dashboard
        .inspector()
        .fetch_jvm_details(&app_id)
        .await
        .map_err(|err| proxy_error(&state, "jvm details", err))?;

    Ok(Json(details))
}

/// Server-wide jar inventory, read through (GET /api/jars)
pub async fn list_jars(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let inventory = state
        .dashboard
        .inspector()
        .fetch_global_jars()
        .await
        .map_err(|err| proxy_error(&state, "jar inventory", err))?;

    Ok(Json(inventory))
}

/// One jar with its application back-references (GET /api/jars/{jar_id})
pub async fn get_jar(
    State(state): State<AppState>,
    Path(jar_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let jar = state
        .dashboard
        .inspector()
        .fetch_jar_detail(&jar_id)
        .await
        .map_err(|err| proxy_error(&state, "jar detail", err))?;

    Ok(Json(jar))
}

/// Metadata write-through (PUT /api/apps/{app_id}/metadata)
///
/// The patch is validated here, forwarded to the inspection server and only
/// applied to the cached snapshot once the inspection server accepted it.
/// Responds with the inspection server's persisted copy.
pub async fn update_metadata(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    let patch: MetadataPatch = read_json_body(&headers, body, state.max_body_bytes()).await?;
    let patch = validate_metadata(patch).map_err(|err| ApiError::InvalidPayload(err.to_string()))?;

    let persisted = state
        .dashboard
        .update_metadata(&app_id, &patch)
        .await
        .map_err(|err| proxy_error(&state, "metadata update", err))?;

    Ok(Json(persisted))
}

/// Current inspection server target (GET /api/server-config)
pub async fn get_server_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(server_config(&state))
}

/// Retargets the dashboard (POST /api/server-config)
///
/// Malformed URLs are rejected with 400 before anything changes. On success
/// subscribers receive a `config-update` followed by the next reconciliation.
pub async fn update_server_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    let request: ServerConfigRequest =
        read_json_body(&headers, body, state.max_body_bytes()).await?;
    let url = parse_base_url(&request.jlib_server_url)
        .map_err(|err| ApiError::InvalidPayload(format!("jlibServerUrl: {err}")))?;

    state.dashboard.reconfigure(url);

    Ok(Json(server_config(&state)))
}

/// Manual refresh (POST /api/refresh)
pub async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    let accepted = state.dashboard.request_refresh();
    if !accepted {
        info!("Manual refresh joined the cycle already running");
    }

    (StatusCode::ACCEPTED, Json(RefreshResponse { accepted }))
}

/// Dashboard liveness (GET /api/health)
///
/// Always 200 while the process serves requests; inspection server
/// reachability is reported in `jlibServerStatus`, not in the status code.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.dashboard.snapshot();

    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now(),
        jlib_server_status: snapshot.connectivity_status,
        applications_count: snapshot.applications.len(),
        subscribers: state.dashboard.subscriber_count(),
        version: env!("CARGO_PKG_VERSION"),
        metrics: state.dashboard.metrics().snapshot(),
    })
}

/// Unknown `/api/*` route
pub async fn api_not_found() -> ApiError {
    ApiError::NotFound("API endpoint".to_string())
}

fn server_config(state: &AppState) -> ServerConfigResponse {
    let snapshot = state.dashboard.snapshot();
    ServerConfigResponse {
        jlib_server_url: snapshot.jlib_server_url.clone(),
        server_status: snapshot.connectivity_status,
    }
}

/// Counts and logs a failed proxied call before it is mapped to a response.
fn proxy_error(state: &AppState, operation: &'static str, err: UpstreamError) -> ApiError {
    if !err.is_not_found() {
        state.dashboard.metrics().upstream_error();
        warn!(operation, error = %err, "Inspection server call failed");
    }
    err.into()
}
