use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use http::{header, Method};
use std::net::SocketAddr;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod sessions;
mod state;

mod models {
    pub mod session;
    pub mod user;
}

mod repositories {
    pub mod directory;
}

mod services {
    pub mod identity;
    pub mod referrals;
}

mod handlers {
    pub mod identity;
    pub mod misc;
    pub mod referrals;
    pub mod webhook;
}

mod validation {
    pub mod identity;
}

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config)?;
    tracing::info!("✅ AppState initialized");

    // Permissive CORS: the read endpoints are consumed by the form builder's
    // embedded script from arbitrary published-page origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = Router::new()
        .route("/", get(handlers::misc::health))
        .route("/test-db", get(handlers::misc::test_db))
        .route("/tilda-webhook", post(handlers::webhook::tilda_webhook))
        .route("/auth-sync", post(handlers::identity::auth_sync))
        .route("/get-user", get(handlers::identity::get_user))
        .route("/referrals", get(handlers::referrals::get_referrals))
        .route("/referrer", get(handlers::referrals::get_referrer))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
