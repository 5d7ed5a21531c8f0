//! Ad-hoc scoring of a section against its outline.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use alwrity_analyze::{extract_keywords, extract_themes};
use alwrity_core::Error;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/analyze/section", post(analyze_section))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    /// Every section's text, in outline order.
    sections: Vec<String>,
    /// Position of the section to score.
    index: usize,
}

/// POST /api/analyze/section
async fn analyze_section(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult<Json<Value>> {
    let text = req.sections.get(req.index).ok_or_else(|| {
        Error::InvalidInput(format!(
            "index {} out of range for {} sections",
            req.index,
            req.sections.len()
        ))
    })?;

    let scorer = state.generator.scorer();
    let scores = scorer.score(&req.sections, req.index);
    let mut seen = HashSet::new();
    let mut keywords = extract_keywords(text);
    keywords.retain(|k| seen.insert(k.clone()));

    Ok(Json(json!({
        "scores": scores,
        "optimizationScore": scores.optimization_score(),
        "themes": extract_themes(text, scorer.config().max_themes),
        "keywords": keywords,
    })))
}
