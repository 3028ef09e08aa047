use anyhow::{Context, Result};
use std::env;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL-backed user directory.
    pub database_url: String,
    /// The port the server listens on.
    pub port: u16,
    /// Maximum entries held per session index before eviction kicks in.
    pub session_capacity: usize,
    /// The lifetime of the server session cookie in days.
    pub session_duration_days: i64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let session_capacity: usize = env::var("SESSION_CAPACITY")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .context("Invalid SESSION_CAPACITY")?;

        if session_capacity == 0 {
            anyhow::bail!("SESSION_CAPACITY must be at least 1");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
            session_capacity,
            session_duration_days: env::var("SESSION_DURATION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .context("Invalid SESSION_DURATION_DAYS")?,
        })
    }
}
