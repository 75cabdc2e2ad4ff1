use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::SubjectId;
use super::ingest::BulkSource;
use super::service::{PoolService, PoolServiceError};
use super::store::PoolGateway;

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub category: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RosterQuery {
    pub search: Option<String>,
}

/// Router builder exposing the pool operations over HTTP.
pub fn pool_router<G, S>(service: Arc<PoolService<G, S>>) -> Router
where
    G: PoolGateway + 'static,
    S: BulkSource + 'static,
{
    Router::new()
        .route("/api/v1/pool/leaderboard", get(leaderboard_handler::<G, S>))
        .route("/api/v1/pool/choices", get(choices_handler::<G, S>))
        .route(
            "/api/v1/pool/choices/:subject_id",
            put(confirm_handler::<G, S>),
        )
        .route("/api/v1/pool/roster", get(roster_handler::<G, S>))
        .route("/api/v1/pool/categories", get(categories_handler::<G, S>))
        .route("/api/v1/pool/reset", post(reset_handler::<G, S>))
        .with_state(service)
}

pub(crate) async fn leaderboard_handler<G, S>(
    State(service): State<Arc<PoolService<G, S>>>,
    Query(query): Query<LeaderboardQuery>,
) -> Response
where
    G: PoolGateway + 'static,
    S: BulkSource + 'static,
{
    match service.leaderboard(query.size) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn choices_handler<G, S>(
    State(service): State<Arc<PoolService<G, S>>>,
) -> Response
where
    G: PoolGateway + 'static,
    S: BulkSource + 'static,
{
    match service.choices() {
        Ok(choices) => (StatusCode::OK, Json(choices)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn confirm_handler<G, S>(
    State(service): State<Arc<PoolService<G, S>>>,
    Path(subject_id): Path<SubjectId>,
    Json(request): Json<ConfirmRequest>,
) -> Response
where
    G: PoolGateway + 'static,
    S: BulkSource + 'static,
{
    let category = request.category.trim();
    if !service.accepts_category(category) {
        let payload = json!({
            "error": format!("unknown category '{category}'"),
            "categories": service.categories(),
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    match service.confirm(subject_id, category) {
        Ok(choice) => (StatusCode::OK, Json(choice)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn roster_handler<G, S>(
    State(service): State<Arc<PoolService<G, S>>>,
    Query(query): Query<RosterQuery>,
) -> Response
where
    G: PoolGateway + 'static,
    S: BulkSource + 'static,
{
    match service.roster(query.search.as_deref()) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn categories_handler<G, S>(
    State(service): State<Arc<PoolService<G, S>>>,
) -> Response
where
    G: PoolGateway + 'static,
    S: BulkSource + 'static,
{
    (StatusCode::OK, Json(service.categories().to_vec())).into_response()
}

pub(crate) async fn reset_handler<G, S>(
    State(service): State<Arc<PoolService<G, S>>>,
) -> Response
where
    G: PoolGateway + 'static,
    S: BulkSource + 'static,
{
    match service.reset() {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: PoolServiceError) -> Response {
    let status = match err {
        PoolServiceError::UnknownSubject(_) => StatusCode::NOT_FOUND,
        PoolServiceError::SaveFailed(_)
        | PoolServiceError::ResetFailed
        | PoolServiceError::Unavailable
        | PoolServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
