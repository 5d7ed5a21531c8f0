//! HTTP route handlers.

pub mod analyze;
pub mod llm;
pub mod outlines;
pub mod versions;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(outlines::routes())
        .merge(analyze::routes())
        .merge(versions::routes())
        .merge(llm::routes())
}

/// GET /api/health
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let llm_available = state.llm_config.read().resolve_provider().is_some();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "llmAvailable": llm_available,
        "searchConsoleAuthenticated": state.analytics.is_authenticated(),
        "outlines": state.outlines.read().len(),
    }))
}


#[cfg(test)]
mod tests {
    use super::testing::{app_state, send};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = app_state(dir.path(), &[]);
        let (status, body) = send(&state, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["searchConsoleAuthenticated"], true);
        assert_eq!(body["outlines"], 0);
    }

    #[tokio::test]
    async fn test_unknown_route_404() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = app_state(dir.path(), &[]);
        let (status, _) = send(&state, "GET", "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
