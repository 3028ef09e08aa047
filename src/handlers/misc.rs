use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::{error::Result, repositories::directory::Directory, state::AppState};

/// The response payload for the health route.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub tracked_sessions: usize,
}

/// The response payload for the database diagnostics route.
#[derive(Serialize)]
pub struct DbCheckResponse {
    pub success: bool,
    pub message: String,
    pub user_count: usize,
    pub users: Vec<String>,
}

/// Reports liveness and the number of tracked sessions.
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> Result<Response> {
    let response = HealthResponse {
        status: "Server is running!".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        tracked_sessions: state.sessions.len(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Checks directory connectivity by sampling a handful of user emails.
#[axum::debug_handler]
pub async fn test_db(State(state): State<AppState>) -> Result<Response> {
    let users = state.directory.sample_emails(5).await?;

    tracing::info!("✅ Directory connectivity check: {} users sampled", users.len());

    let response = DbCheckResponse {
        success: true,
        message: "Database connection successful".to_string(),
        user_count: users.len(),
        users,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
