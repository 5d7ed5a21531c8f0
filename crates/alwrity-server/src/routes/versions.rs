//! Content version routes: snapshots, performance and comparison.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use alwrity_core::Error;
use alwrity_runtime::{PerformanceReport, VersionComparison};
use alwrity_store::ContentVersion;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/versions", get(list_versions).post(save_version))
        .route("/versions/compare", post(compare_versions))
        .route("/versions/{id}", get(get_version).delete(delete_version))
        .route("/versions/{id}/performance", post(fetch_performance))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveRequest {
    #[serde(default)]
    content: Option<String>,
    /// Snapshot the current full text of this outline instead.
    #[serde(default)]
    outline_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompareRequest {
    left_id: String,
    right_id: String,
}

async fn list_versions(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ContentVersion>>> {
    Ok(Json(state.tracker.list_versions()?))
}

/// POST /api/versions: blank content is accepted and ignored.
async fn save_version(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let content = match (req.outline_id, req.content) {
        (Some(outline_id), _) => state
            .outline(&outline_id)
            .ok_or_else(|| Error::NotFound(format!("outline {}", outline_id)))?
            .full_content(),
        (None, Some(content)) => content,
        (None, None) => {
            return Err(Error::InvalidInput("content or outlineId is required".into()).into())
        }
    };

    match state.tracker.save_version(&content)? {
        Some(version) => Ok((
            StatusCode::CREATED,
            Json(json!({ "saved": true, "version": version })),
        )),
        None => Ok((StatusCode::OK, Json(json!({ "saved": false })))),
    }
}

/// GET /api/versions/{id}: the version and its last fetched series, if any.
async fn get_version(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let version = state.tracker.get_version(&id)?;
    Ok(Json(json!({
        "version": version,
        "series": state.tracker.cached_series(&id),
    })))
}

async fn delete_version(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.tracker.delete_version(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound(format!("version {}", id)).into())
    }
}

/// POST /api/versions/{id}/performance
async fn fetch_performance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<PerformanceReport>> {
    Ok(Json(state.tracker.fetch_performance(&id).await?))
}

/// POST /api/versions/compare
async fn compare_versions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompareRequest>,
) -> ApiResult<Json<VersionComparison>> {
    Ok(Json(
        state
            .tracker
            .compare_versions(&req.left_id, &req.right_id)
            .await?,
    ))
}
