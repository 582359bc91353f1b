//! services/api/src/web/dashboard.rs
//!
//! The pull-based read side: the dashboard and a liveness probe.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::middleware::resolve_current_user;
use crate::web::state::AppState;
use crate::web::views::{BookView, DashboardResponse, LoginPrompt, ReadingView};

/// GET / - The dashboard for a logged-in user, a login prompt otherwise
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Dashboard with per-book progress and reading history; a LoginPrompt when there is no session", body = DashboardResponse)
    )
)]
pub async fn index_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(user) = resolve_current_user(&state, &headers).await else {
        return Ok(Json(LoginPrompt {
            authenticated: false,
            message: "Log in or register to track your reading.".to_string(),
        })
        .into_response());
    };

    let books = state.db.book_summaries(user.user_id).await?;
    let readings = state.db.reading_history(user.user_id).await?;

    Ok(Json(DashboardResponse {
        authenticated: true,
        user_id: user.user_id,
        username: user.username,
        today: Utc::now().date_naive(),
        books: books.into_iter().map(BookView::from).collect(),
        readings: readings.into_iter().map(ReadingView::from).collect(),
    })
    .into_response())
}

/// GET /health - Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
