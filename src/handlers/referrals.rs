use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Result},
    models::user::{DirectoryUser, ReferralForest},
    repositories::directory::Directory,
    services::{identity, referrals as referral_service},
    state::AppState,
};

use super::identity::{session_cookie_email, IdentityQuery};

/// The response payload for `/referrals`.
#[derive(Serialize)]
pub struct ReferralsResponse {
    pub success: bool,
    pub email: String,
    pub referrals: ReferralForest,
    pub total: usize,
    pub message: String,
}

/// The response payload for `/referrer`.
#[derive(Serialize)]
pub struct ReferrerResponse {
    pub success: bool,
    pub email: String,
    pub referrer: Option<DirectoryUser>,
    pub message: String,
}

/// Returns the three-level referral forest for the resolved visitor.
#[axum::debug_handler]
pub async fn get_referrals(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<IdentityQuery>,
) -> Result<Response> {
    let cookie_email = session_cookie_email(&cookies);
    let resolved = identity::resolve(
        &state.sessions,
        query.email.as_deref(),
        query.browser_id.as_deref(),
        cookie_email.as_deref(),
    );

    let Some(email) = resolved.email else {
        return Err(AppError::Validation("Email is required".to_string()));
    };

    tracing::info!("🌳 Referral forest requested for {}", email);

    // Primary identity path: a gateway failure here is a server error.
    let user = state.directory.find_by_email(&email).await?;

    let Some(user) = user else {
        let response = ReferralsResponse {
            success: true,
            email,
            referrals: ReferralForest::default(),
            total: 0,
            message: "User not found".to_string(),
        };
        return Ok((StatusCode::OK, Json(response)).into_response());
    };

    let forest = match user.referral_code.as_deref().filter(|c| !c.is_empty()) {
        Some(code) => referral_service::build_forest(&state.directory, code).await,
        None => ReferralForest::default(),
    };

    let total = forest.total();
    tracing::info!("✅ Referral forest for {}: {} users", email, total);

    let response = ReferralsResponse {
        success: true,
        email,
        referrals: forest,
        total,
        message: "Referrals fetched successfully".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Returns the directory user who referred the resolved visitor, if any.
#[axum::debug_handler]
pub async fn get_referrer(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<IdentityQuery>,
) -> Result<Response> {
    let cookie_email = session_cookie_email(&cookies);
    let resolved = identity::resolve(
        &state.sessions,
        query.email.as_deref(),
        query.browser_id.as_deref(),
        cookie_email.as_deref(),
    );

    let Some(email) = resolved.email else {
        return Err(AppError::Validation("Email is required".to_string()));
    };

    let referrer = referral_service::find_referrer(&state.directory, &email).await?;

    let message = if referrer.is_some() {
        "Referrer found successfully"
    } else {
        "Referrer not found"
    };

    let response = ReferrerResponse {
        success: true,
        email,
        referrer,
        message: message.to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
