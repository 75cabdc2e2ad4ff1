use crate::infra::{AppPoolService, AppState};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use division_pool::error::AppError;
use division_pool::pool::pool_router;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_pool_routes(service: Arc<AppPoolService>) -> axum::Router {
    pool_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/photos/:file", axum::routing::get(photo_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Serve a roster photo by file name. Anything resembling a path is refused.
pub(crate) async fn photo_endpoint(
    Extension(state): Extension<AppState>,
    Path(file): Path<String>,
) -> Result<Response, AppError> {
    if file.is_empty() || file.contains(['/', '\\']) || file.starts_with('.') {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid photo name" })),
        )
            .into_response());
    }

    let bytes = tokio::fs::read(state.photo_dir.join(&file)).await?;
    let mime = mime_guess::from_path(&file).first_or_octet_stream();

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime.essence_str().to_string())],
        bytes,
    )
        .into_response())
}
