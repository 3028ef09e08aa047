use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    models::user::DirectoryUser,
    repositories::directory::Directory,
    state::AppState,
    validation::identity::validate_email,
};

/// The payload the form builder posts on registration.
#[derive(Deserialize, Debug)]
pub struct WebhookRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// The response payload for the registration webhook.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub user: DirectoryUser,
}

/// Handles the form builder's registration webhook: upserts the user into
/// the directory by email.
#[axum::debug_handler]
pub async fn tilda_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookRequest>,
) -> Result<Response> {
    tracing::info!("📝 Webhook received - Payload: {:?}", payload);

    let email = payload.email.as_deref().unwrap_or("");
    validate_email(email)?;

    let user = state
        .directory
        .upsert_user(email, payload.name.as_deref())
        .await?;

    tracing::info!("✅ Webhook upsert completed for {}", user.email);

    let response = WebhookResponse {
        success: true,
        user,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
