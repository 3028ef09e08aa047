use crate::config::Config;
use crate::error::Result;
use crate::repositories::directory::PgDirectory;
use crate::sessions::SessionStore;

/// The application's state.
///
/// Cloned into every handler; the session store is injected here rather than
/// living in a process-wide global so tests can build isolated instances.
#[derive(Clone)]
pub struct AppState {
    /// The gateway toward the user directory.
    pub directory: PgDirectory,
    /// The in-memory session store.
    pub sessions: SessionStore,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let pool = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized with deadpool-postgres");

        let sessions = SessionStore::new(config.session_capacity);
        tracing::info!(
            "✅ Session store initialized (capacity {} per index)",
            config.session_capacity
        );

        Ok(AppState {
            directory: PgDirectory::new(pool),
            sessions,
            config: config.clone(),
        })
    }
}
