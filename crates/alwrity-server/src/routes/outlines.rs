//! Outline routes: planning, editing, generation and progress.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use alwrity_core::Error;
use alwrity_providers::OutlineRequest;
use alwrity_runtime::OutlineState;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/outlines", post(create_outline))
        .route("/outlines/{id}", get(get_outline))
        .route("/outlines/{id}/sections/{sid}", delete(delete_section))
        .route("/outlines/{id}/sections/{sid}/move", post(move_section))
        .route("/outlines/{id}/sections/{sid}/generate", post(generate_section))
        .route("/outlines/{id}/generate", post(generate_all))
        .route("/outlines/{id}/cancel", post(cancel))
        .route("/outlines/{id}/progress", get(get_progress))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    /// Defaults to the outline title.
    #[serde(default)]
    global_context: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateQuery {
    /// Run to completion and return the report instead of starting in the background.
    #[serde(default)]
    wait: bool,
}

#[derive(Debug, Deserialize)]
struct MoveBody {
    position: usize,
}

fn find_outline(state: &AppState, id: &str) -> Result<Arc<OutlineState>, Error> {
    state
        .outline(id)
        .ok_or_else(|| Error::NotFound(format!("outline {}", id)))
}

fn outline_json(outline: &OutlineState) -> Value {
    json!({
        "id": outline.id(),
        "title": outline.title(),
        "sections": outline.snapshot(),
        "busy": outline.is_busy(),
    })
}

// ---------------------------------------------------------------
// Planning and editing
// ---------------------------------------------------------------

/// POST /api/outlines: plan a new outline from a title or query.
async fn create_outline(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OutlineRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let planned = state.planner.plan(&request).await?;
    let outline = state.insert_outline(OutlineState::new(planned.title, planned.sections));
    info!(
        "Created outline {} with {} sections (cached={})",
        outline.id(),
        outline.len(),
        planned.cached
    );

    let mut body = outline_json(&outline);
    body["cached"] = json!(planned.cached);
    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /api/outlines/{id}
async fn get_outline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let outline = find_outline(&state, &id)?;
    Ok(Json(outline_json(&outline)))
}

/// DELETE /api/outlines/{id}/sections/{sid}
async fn delete_section(
    State(state): State<Arc<AppState>>,
    Path((id, sid)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let outline = find_outline(&state, &id)?;
    outline.remove_section(&sid)?;
    Ok(Json(outline_json(&outline)))
}

/// POST /api/outlines/{id}/sections/{sid}/move
async fn move_section(
    State(state): State<Arc<AppState>>,
    Path((id, sid)): Path<(String, String)>,
    Json(body): Json<MoveBody>,
) -> ApiResult<Json<Value>> {
    let outline = find_outline(&state, &id)?;
    outline.move_section(&sid, body.position)?;
    Ok(Json(outline_json(&outline)))
}

// ---------------------------------------------------------------
// Generation
// ---------------------------------------------------------------

/// POST /api/outlines/{id}/sections/{sid}/generate: generate or retry one section.
async fn generate_section(
    State(state): State<Arc<AppState>>,
    Path((id, sid)): Path<(String, String)>,
    Json(body): Json<GenerateBody>,
) -> ApiResult<Json<Value>> {
    let outline = find_outline(&state, &id)?;
    let context = body
        .global_context
        .unwrap_or_else(|| outline.title().to_string());
    let outcome = state
        .generator
        .generate_section(&outline, &sid, &context)
        .await?;
    Ok(Json(json!({
        "outcome": outcome,
        "section": outline.section(&sid),
    })))
}

/// POST /api/outlines/{id}/generate: generate every section in order.
async fn generate_all(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<GenerateQuery>,
    Json(body): Json<GenerateBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let outline = find_outline(&state, &id)?;
    let batch = outline
        .try_begin_owned_batch()
        .ok_or_else(|| Error::Busy(format!("outline {} is already generating", id)))?;
    let context = body
        .global_context
        .unwrap_or_else(|| outline.title().to_string());

    if query.wait {
        let report = state.generator.generate_claimed(batch, &context).await;
        state.reports.write().insert(id, report.clone());
        return Ok((StatusCode::OK, Json(json!({ "report": report }))));
    }

    let task_state = state.clone();
    tokio::spawn(async move {
        let report = task_state.generator.generate_claimed(batch, &context).await;
        task_state
            .reports
            .write()
            .insert(outline.id().to_string(), report);
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "outlineId": id, "status": "generating" })),
    ))
}

/// POST /api/outlines/{id}/cancel: stop a running generate-all before its next section.
async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let outline = find_outline(&state, &id)?;
    Ok(Json(json!({ "cancelled": outline.request_cancel() })))
}

/// GET /api/outlines/{id}/progress
async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let outline = find_outline(&state, &id)?;
    let sections: Vec<Value> = outline
        .all_progress()
        .into_iter()
        .map(|(section_id, progress)| {
            let mut entry = json!(progress);
            entry["sectionId"] = json!(section_id);
            entry
        })
        .collect();
    let report = state.reports.read().get(&id).cloned();

    Ok(Json(json!({
        "outlineId": id,
        "busy": outline.is_busy(),
        "sections": sections,
        "report": report,
    })))
}
