use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_cookies::{cookie::time::Duration, Cookie, Cookies};

use crate::{
    error::Result,
    models::{session::SessionRecord, user::DirectoryUser},
    repositories::directory::Directory,
    services::identity::{self, IdentitySource},
    state::AppState,
    validation::identity::*,
};

/// Name of the server-assigned session cookie set by `/auth-sync`.
const SESSION_COOKIE: &str = "bridge_session";

/// The payload the front end posts when a visitor signs in or registers.
#[derive(Deserialize, Debug)]
pub struct AuthSyncRequest {
    pub email: Option<String>,
    pub action: Option<String>,
    pub browser_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub page: Option<String>,
}

/// The response payload for a sync call. `known` says whether the directory
/// already has this email.
#[derive(Serialize)]
pub struct AuthSyncResponse {
    pub success: bool,
    pub known: bool,
    pub user: Option<DirectoryUser>,
}

/// Query parameters shared by the identity-resolving GET endpoints.
#[derive(Deserialize)]
pub struct IdentityQuery {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub browser_id: Option<String>,
}

/// The response payload for `/get-user`.
#[derive(Serialize)]
pub struct ResolveResponse {
    pub success: bool,
    pub email: Option<String>,
    pub source: IdentitySource,
    pub user: Option<DirectoryUser>,
    pub message: String,
}

/// Creates the HttpOnly session cookie carrying the encoded email.
fn create_session_cookie(value: String, max_age_days: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);

    let is_production =
        std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()) == "production";

    cookie.set_http_only(true);
    if is_production {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_days * 86400));
    cookie.set_path("/");

    cookie
}

/// Reads the email back out of the session cookie, if present and decodable.
pub(crate) fn session_cookie_email(cookies: &Cookies) -> Option<String> {
    let cookie = cookies.get(SESSION_COOKIE)?;
    let decoded = URL_SAFE_NO_PAD.decode(cookie.value()).ok()?;
    String::from_utf8(decoded).ok().filter(|e| !e.is_empty())
}

/// Handles a sign-in sync: records the session under both indices, issues
/// the session cookie, and reports whether the directory knows the email.
#[axum::debug_handler]
pub async fn auth_sync(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<AuthSyncRequest>,
) -> Result<Response> {
    tracing::info!("🔄 Auth sync - Payload: {:?}", payload);

    let email = payload.email.as_deref().unwrap_or("");
    validate_email(email)?;
    let action = payload.action.as_deref().unwrap_or("");
    validate_action(action)?;
    if let Some(browser_id) = payload.browser_id.as_deref() {
        validate_browser_id(browser_id)?;
    }

    let now = Utc::now();
    let record = SessionRecord {
        email: email.to_string(),
        action: action.to_string(),
        browser_id: payload.browser_id.clone(),
        timestamp: payload.timestamp.unwrap_or(now),
        source: payload.source.unwrap_or_else(|| "unknown".to_string()),
        page: payload.page.unwrap_or_default(),
        last_activity: now,
    };
    state.sessions.put(record);
    tracing::info!("✅ Session synced for {} (action: {})", email, action);

    let encoded = URL_SAFE_NO_PAD.encode(email.as_bytes());
    cookies.add(create_session_cookie(
        encoded,
        state.config.session_duration_days,
    ));

    // The directory check is auxiliary here: a gateway failure must not undo
    // the sync, so it degrades to "not known".
    let user = match state.directory.find_by_email(email).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("⚠️ Directory check failed during auth sync: {}", e);
            None
        }
    };

    let response = AuthSyncResponse {
        success: true,
        known: user.is_some(),
        user,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Resolves the current visitor and returns their directory record, if any.
#[axum::debug_handler]
pub async fn get_user(
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
        tracing::debug!("No identity resolvable for /get-user request");
        let response = ResolveResponse {
            success: true,
            email: None,
            source: IdentitySource::None,
            user: None,
            message: "No identity".to_string(),
        };
        return Ok((StatusCode::OK, Json(response)).into_response());
    };

    tracing::debug!("Resolved {} via {:?}", email, resolved.source);

    // Primary identity path: a gateway failure here is a server error.
    let user = state.directory.find_by_email(&email).await?;

    let message = if user.is_some() {
        "User found successfully"
    } else {
        "User not found"
    };

    let response = ResolveResponse {
        success: true,
        email: Some(email),
        source: resolved.source,
        user,
        message: message.to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
