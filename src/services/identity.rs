use serde::Serialize;

use crate::sessions::SessionStore;

/// Where a resolved email came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// The caller passed the email explicitly.
    Explicit,
    /// Matched a session by the caller's opaque browser identifier.
    BrowserSession,
    /// Read from the server-assigned session cookie.
    ServerSession,
    /// The newest session across all known emails.
    GlobalFallback,
    /// Nothing matched; the caller has no identity (not an error).
    None,
}

/// The outcome of identity resolution: a best-effort email plus provenance.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub email: Option<String>,
    pub source: IdentitySource,
}

impl ResolvedIdentity {
    fn found(email: &str, source: IdentitySource) -> Self {
        Self {
            email: Some(email.to_string()),
            source,
        }
    }
}

/// Resolves the operative email for a request from its available signals.
///
/// Priority chain, first match wins: explicit email parameter, then the
/// browser-id session index, then the server session cookie, then the newest
/// session across every known email. Resolution is read-only; the store is
/// only ever primed by `/auth-sync`.
///
/// The final fallback scans all sessions process-wide with no per-site
/// partitioning, so with several unauthenticated visitors in flight it can
/// pick the wrong one. Tolerated for a single-site deployment; callers see
/// `GlobalFallback` as the source and can discount it.
pub fn resolve(
    sessions: &SessionStore,
    explicit: Option<&str>,
    browser_id: Option<&str>,
    cookie_email: Option<&str>,
) -> ResolvedIdentity {
    if let Some(email) = explicit.filter(|e| !e.is_empty()) {
        return ResolvedIdentity::found(email, IdentitySource::Explicit);
    }

    if let Some(browser_id) = browser_id.filter(|b| !b.is_empty()) {
        if let Some(record) = sessions.get_by_browser_id(browser_id) {
            return ResolvedIdentity::found(&record.email, IdentitySource::BrowserSession);
        }
    }

    if let Some(email) = cookie_email.filter(|e| !e.is_empty()) {
        return ResolvedIdentity::found(email, IdentitySource::ServerSession);
    }

    if let Some(record) = sessions.latest_by_email_index() {
        tracing::debug!(
            "Identity resolved via global fallback to {} (best effort)",
            record.email
        );
        return ResolvedIdentity::found(&record.email, IdentitySource::GlobalFallback);
    }

    ResolvedIdentity {
        email: None,
        source: IdentitySource::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::SessionRecord;
    use chrono::{Duration, Utc};

    fn synced(store: &SessionStore, email: &str, browser_id: &str, offset_secs: i64) {
        let now = Utc::now() + Duration::seconds(offset_secs);
        store.put(SessionRecord {
            email: email.to_string(),
            action: "login".to_string(),
            browser_id: Some(browser_id.to_string()),
            timestamp: now,
            source: "tilda".to_string(),
            page: "/".to_string(),
            last_activity: now,
        });
    }

    #[test]
    fn explicit_email_beats_everything() {
        let store = SessionStore::new(100);
        synced(&store, "session@example.com", "browser-a", 0);

        let resolved = resolve(
            &store,
            Some("explicit@example.com"),
            Some("browser-a"),
            Some("cookie@example.com"),
        );
        assert_eq!(resolved.email.as_deref(), Some("explicit@example.com"));
        assert_eq!(resolved.source, IdentitySource::Explicit);
    }

    #[test]
    fn browser_session_beats_cookie_and_fallback() {
        let store = SessionStore::new(100);
        synced(&store, "session@example.com", "browser-a", 0);
        synced(&store, "other@example.com", "browser-b", 10);

        let resolved = resolve(&store, None, Some("browser-a"), Some("cookie@example.com"));
        assert_eq!(resolved.email.as_deref(), Some("session@example.com"));
        assert_eq!(resolved.source, IdentitySource::BrowserSession);
    }

    #[test]
    fn unknown_browser_id_falls_through_to_cookie() {
        let store = SessionStore::new(100);
        synced(&store, "session@example.com", "browser-a", 0);

        let resolved = resolve(&store, None, Some("browser-z"), Some("cookie@example.com"));
        assert_eq!(resolved.email.as_deref(), Some("cookie@example.com"));
        assert_eq!(resolved.source, IdentitySource::ServerSession);
    }

    #[test]
    fn global_fallback_returns_newest_session() {
        let store = SessionStore::new(100);
        synced(&store, "older@example.com", "browser-a", 0);
        synced(&store, "newest@example.com", "browser-b", 30);

        let resolved = resolve(&store, None, None, None);
        assert_eq!(resolved.email.as_deref(), Some("newest@example.com"));
        assert_eq!(resolved.source, IdentitySource::GlobalFallback);
    }

    #[test]
    fn no_signals_resolves_to_none() {
        let store = SessionStore::new(100);
        let resolved = resolve(&store, None, None, None);
        assert!(resolved.email.is_none());
        assert_eq!(resolved.source, IdentitySource::None);
    }

    #[test]
    fn identity_source_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&IdentitySource::GlobalFallback).unwrap(),
            "\"global_fallback\""
        );
        assert_eq!(
            serde_json::to_string(&IdentitySource::None).unwrap(),
            "\"none\""
        );
    }

    #[test]
    fn empty_strings_are_treated_as_absent() {
        let store = SessionStore::new(100);
        let resolved = resolve(&store, Some(""), Some(""), Some(""));
        assert!(resolved.email.is_none());
        assert_eq!(resolved.source, IdentitySource::None);
    }
}
