use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::roles::RoleCache;

/// Cache key holding the resolved role.
pub const ROLE_KEY: &str = "userRole";
/// Cache key holding the email the role was resolved for.
pub const EMAIL_KEY: &str = "currentUserEmail";

struct SessionEntry {
    values: HashMap<&'static str, String>,
    last_seen: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
            last_seen: Instant::now(),
        }
    }
}

/// Process-wide registry of login sessions, keyed by session id.
///
/// A session id is issued at login and embedded in the session's tokens.
/// Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, SessionEntry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new, empty session and return its id.
    pub fn open(&self) -> String {
        let sid = uuid::Uuid::new_v4().to_string();
        self.lock().insert(sid.clone(), SessionEntry::new());
        sid
    }

    /// Re-register a session id whose refresh token was just accepted, e.g.
    /// after a restart or an idle purge. Existing values are kept.
    pub fn resume(&self, sid: &str) {
        self.lock()
            .entry(sid.to_string())
            .or_insert_with(SessionEntry::new)
            .last_seen = Instant::now();
    }

    /// Cache handle for a session. Writes to a session that is not open
    /// (never opened, ended or purged) are dropped.
    pub fn cache(&self, sid: &str) -> SessionCache {
        SessionCache {
            store: self.clone(),
            sid: sid.to_string(),
        }
    }

    /// End a session, dropping its cached values. Returns whether it existed.
    pub fn end(&self, sid: &str) -> bool {
        self.lock().remove(sid).is_some()
    }

    /// Drop sessions not touched within `max_idle`. Returns how many were dropped.
    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() <= max_idle);
        before - sessions.len()
    }

    pub fn contains(&self, sid: &str) -> bool {
        self.lock().contains_key(sid)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Key/value storage of a single session. Implements [`RoleCache`] over
/// the `userRole` and `currentUserEmail` keys.
#[derive(Clone)]
pub struct SessionCache {
    store: SessionStore,
    sid: String,
}

impl SessionCache {
    pub fn session_id(&self) -> &str {
        &self.sid
    }

    /// Read a key, refreshing the session's idle timer if it exists.
    pub fn read(&self, key: &'static str) -> Option<String> {
        let mut sessions = self.store.lock();
        let entry = sessions.get_mut(&self.sid)?;
        entry.last_seen = Instant::now();
        entry.values.get(key).cloned()
    }

    /// Remove then insert, so a key never holds two generations of a value.
    /// Returns false when the session is not open.
    pub fn write(&self, key: &'static str, value: &str) -> bool {
        let mut sessions = self.store.lock();
        let Some(entry) = sessions.get_mut(&self.sid) else {
            tracing::debug!(sid = %self.sid, key, "Write to closed session dropped");
            return false;
        };
        entry.last_seen = Instant::now();
        entry.values.remove(key);
        entry.values.insert(key, value.to_string());
        true
    }

    pub fn remove(&self, key: &'static str) {
        if let Some(entry) = self.store.lock().get_mut(&self.sid) {
            entry.values.remove(key);
        }
    }
}

impl RoleCache for SessionCache {
    fn get(&self) -> Option<String> {
        self.read(ROLE_KEY)
    }

    fn set(&self, role: &str) {
        if role.is_empty() {
            return;
        }
        self.write(ROLE_KEY, role);
    }

    fn clear(&self) {
        self.remove(ROLE_KEY);
        self.remove(EMAIL_KEY);
    }

    fn email(&self) -> Option<String> {
        self.read(EMAIL_KEY)
    }

    fn set_email(&self, email: &str) {
        if email.is_empty() {
            return;
        }
        self.write(EMAIL_KEY, email);
    }
}
