//! LLM provider configuration routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use alwrity_providers::{LLMConfigResponse, LLMConfigUpdate};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/llm/config", get(get_config).put(update_config))
}

async fn get_config(State(state): State<Arc<AppState>>) -> Json<LLMConfigResponse> {
    Json(state.llm_config.read().to_response())
}

async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<LLMConfigUpdate>,
) -> ApiResult<Json<LLMConfigResponse>> {
    let mut config = state.llm_config.write();
    config.apply_update(&update);
    config.save()?;
    Ok(Json(config.to_response()))
}
