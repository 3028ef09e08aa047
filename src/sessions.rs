use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::models::session::SessionRecord;

/// An in-memory store of ephemeral browser sessions.
///
/// The store keeps two independent indices over the same logical sessions:
/// one keyed by opaque browser identifier and one keyed by email. A `put`
/// writes into both; the indices may therefore hold independent copies of
/// the same session and no cross-referential integrity is enforced between
/// them. Records live for the lifetime of the process only.
///
/// The store is cloned into request handlers (cheap `Arc` clone) rather than
/// living in a global, so tests can construct their own instances.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Indices>>,
    capacity: usize,
}

#[derive(Default)]
struct Indices {
    by_browser: HashMap<String, SessionRecord>,
    by_email: HashMap<String, SessionRecord>,
}

impl SessionStore {
    /// Creates a store that holds at most `capacity` entries per index.
    ///
    /// When inserting a new key into a full index, the entry with the oldest
    /// `last_activity` in that index is evicted first.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Indices::default())),
            capacity: capacity.max(1),
        }
    }

    /// Inserts or overwrites the session for the record's keys.
    ///
    /// The record lands in the email index always, and in the browser index
    /// when it carries a non-empty `browser_id`. Overwrites replace the whole
    /// record; concurrent writers race and the last write wins as a unit.
    /// Records without an email are dropped (callers validate upstream).
    pub fn put(&self, record: SessionRecord) {
        if record.email.is_empty() {
            tracing::warn!("Session record without email dropped");
            return;
        }

        let mut indices = self.inner.write().unwrap();

        if let Some(browser_id) = record.browser_id.clone().filter(|b| !b.is_empty()) {
            insert_bounded(&mut indices.by_browser, browser_id, record.clone(), self.capacity);
        }

        let email = record.email.clone();
        insert_bounded(&mut indices.by_email, email, record, self.capacity);
    }

    /// Looks up the session last synced by the given browser.
    pub fn get_by_browser_id(&self, browser_id: &str) -> Option<SessionRecord> {
        self.inner.read().unwrap().by_browser.get(browser_id).cloned()
    }

    /// Scans the email index and returns the record with the newest
    /// `timestamp`.
    ///
    /// This is the global last-resort fallback for identity resolution; ties
    /// between equal timestamps resolve in map iteration order, which callers
    /// must not depend on.
    pub fn latest_by_email_index(&self) -> Option<SessionRecord> {
        self.inner
            .read()
            .unwrap()
            .by_email
            .values()
            .max_by_key(|record| record.timestamp)
            .cloned()
    }

    /// Number of distinct emails currently tracked.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().by_email.len()
    }
}

/// Inserts into one index, evicting the stalest entry when a new key would
/// push the index past `capacity`.
fn insert_bounded(
    map: &mut HashMap<String, SessionRecord>,
    key: String,
    record: SessionRecord,
    capacity: usize,
) {
    if !map.contains_key(&key) && map.len() >= capacity {
        let oldest = map
            .iter()
            .min_by_key(|(_, r)| r.last_activity)
            .map(|(k, _)| k.clone());
        if let Some(oldest) = oldest {
            tracing::debug!("Session store at capacity, evicting entry for {}", oldest);
            map.remove(&oldest);
        }
    }
    map.insert(key, record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(email: &str, browser_id: Option<&str>, offset_secs: i64) -> SessionRecord {
        let now = Utc::now() + Duration::seconds(offset_secs);
        SessionRecord {
            email: email.to_string(),
            action: "login".to_string(),
            browser_id: browser_id.map(|b| b.to_string()),
            timestamp: now,
            source: "tilda".to_string(),
            page: "/".to_string(),
            last_activity: now,
        }
    }

    #[test]
    fn last_sync_wins_per_browser_id() {
        let store = SessionStore::new(100);
        store.put(record("first@example.com", Some("browser-a"), 0));
        store.put(record("second@example.com", Some("browser-a"), 1));
        store.put(record("other@example.com", Some("browser-b"), 2));

        let found = store.get_by_browser_id("browser-a").unwrap();
        assert_eq!(found.email, "second@example.com");
        let found = store.get_by_browser_id("browser-b").unwrap();
        assert_eq!(found.email, "other@example.com");
    }

    #[test]
    fn unknown_browser_id_is_absent() {
        let store = SessionStore::new(100);
        store.put(record("a@example.com", Some("browser-a"), 0));
        assert!(store.get_by_browser_id("browser-z").is_none());
    }

    #[test]
    fn latest_by_email_index_picks_newest_timestamp() {
        let store = SessionStore::new(100);
        store.put(record("old@example.com", Some("browser-a"), 0));
        store.put(record("newest@example.com", Some("browser-b"), 50));
        store.put(record("middle@example.com", Some("browser-c"), 25));

        let latest = store.latest_by_email_index().unwrap();
        assert_eq!(latest.email, "newest@example.com");
    }

    #[test]
    fn record_without_browser_id_still_reaches_email_index() {
        let store = SessionStore::new(100);
        store.put(record("a@example.com", None, 0));
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.latest_by_email_index().unwrap().email,
            "a@example.com"
        );
    }

    #[test]
    fn repeated_identical_sync_is_idempotent() {
        let store = SessionStore::new(100);
        let rec = record("a@example.com", Some("browser-a"), 0);
        store.put(rec.clone());
        store.put(rec.clone());

        assert_eq!(store.len(), 1);
        let found = store.get_by_browser_id("browser-a").unwrap();
        assert_eq!(found.email, rec.email);
        assert_eq!(found.timestamp, rec.timestamp);
    }

    #[test]
    fn empty_email_records_are_dropped() {
        let store = SessionStore::new(100);
        store.put(record("", Some("browser-a"), 0));
        assert_eq!(store.len(), 0);
        assert!(store.get_by_browser_id("browser-a").is_none());
    }

    #[test]
    fn capacity_bound_evicts_stalest_entry() {
        let store = SessionStore::new(2);
        store.put(record("stale@example.com", Some("browser-a"), 0));
        store.put(record("fresh@example.com", Some("browser-b"), 10));
        store.put(record("newer@example.com", Some("browser-c"), 20));

        assert_eq!(store.len(), 2);
        assert!(store.get_by_browser_id("browser-a").is_none());
        assert!(store.get_by_browser_id("browser-b").is_some());
        assert!(store.get_by_browser_id("browser-c").is_some());
    }

    #[test]
    fn concurrent_writes_leave_one_whole_record() {
        let store = SessionStore::new(100);
        let a = record("left@example.com", Some("shared-browser"), 0);
        let b = record("right@example.com", Some("shared-browser"), 1);

        let (store_a, rec_a) = (store.clone(), a.clone());
        let (store_b, rec_b) = (store.clone(), b.clone());
        let h1 = std::thread::spawn(move || store_a.put(rec_a));
        let h2 = std::thread::spawn(move || store_b.put(rec_b));
        h1.join().unwrap();
        h2.join().unwrap();

        // Whichever write landed last, the record must match one sync in
        // full, never a field-level blend of the two.
        let found = store.get_by_browser_id("shared-browser").unwrap();
        let matches_a = found.email == a.email && found.timestamp == a.timestamp;
        let matches_b = found.email == b.email && found.timestamp == b.timestamp;
        assert!(matches_a || matches_b);
    }
}
