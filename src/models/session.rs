use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents one browser session observed through `/auth-sync`.
///
/// A record is a whole-value snapshot of the latest sync: every new sync for
/// the same key overwrites the previous record completely, fields are never
/// merged across syncs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The email the client reported for this session.
    pub email: String,
    /// The client action that triggered the sync ("login", "register", ...).
    pub action: String,
    /// The client-generated opaque browser identifier, if the browser sent one.
    pub browser_id: Option<String>,
    /// When the client says the action happened.
    pub timestamp: DateTime<Utc>,
    /// Which integration the sync came from ("tilda", "landing", ...).
    pub source: String,
    /// The page the client was on when it synced.
    pub page: String,
    /// When this record was last written.
    pub last_activity: DateTime<Utc>,
}
