use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde_json::json;

use crate::state::AppState;

/// GET / - the client's login page when a static dir is configured, else a banner.
pub async fn root(State(state): State<AppState>) -> Response {
    if let Some(dir) = &state.config.server.static_dir {
        match tokio::fs::read_to_string(dir.join("login.html")).await {
            Ok(page) => return Html(page).into_response(),
            Err(e) => tracing::debug!("no login page in {}: {}", dir.display(), e),
        }
    }

    Json(json!({
        "success": true,
        "data": {
            "name": "Study Diary API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/signup, /login, POST /api/users (public)",
                "users": "/api/users/me, /api/users/:id (protected)",
                "courses": "/api/courses[/:id] (protected)",
                "weekly_topics": "/api/weeklyTopics[/:id[/status]] (protected)",
                "covered_topics": "/api/coveredTopics (protected)",
                "health": "/health (public)"
            }
        }
    }))
    .into_response()
}

/// GET /health - store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
