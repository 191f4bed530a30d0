use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// A client session tracked by the HTTP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// In-memory session store with a fixed time to live.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn with_ttl_hours(hours: i64) -> Self {
        Self::new(Duration::hours(hours))
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self, user_id: Option<String>, metadata: Option<Map<String, Value>>) -> Session {
        let now = Utc::now();
        let session = Session {
            session_id: uuid::Uuid::new_v4().simple().to_string(),
            created_at: now,
            expires_at: now + self.ttl,
            user_id,
            metadata: metadata.unwrap_or_default(),
        };
        self.write()
            .insert(session.session_id.clone(), session.clone());
        debug!(session_id = %session.session_id, "Created session");
        session
    }

    /// Live session by id. Expired sessions are removed on access.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        let session = self.read().get(session_id).cloned()?;
        if session.is_expired() {
            self.delete(session_id);
            return None;
        }
        Some(session)
    }

    /// Replace the user and merge metadata into a live session.
    pub fn update(
        &self,
        session_id: &str,
        user_id: Option<String>,
        metadata: Option<Map<String, Value>>,
    ) -> Option<Session> {
        self.get(session_id)?;
        let mut sessions = self.write();
        let session = sessions.get_mut(session_id)?;
        if user_id.is_some() {
            session.user_id = user_id;
        }
        if let Some(metadata) = metadata {
            session.metadata.extend(metadata);
        }
        Some(session.clone())
    }

    pub fn delete(&self, session_id: &str) -> bool {
        self.write().remove(session_id).is_some()
    }

    /// Drop every expired session, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::with_ttl_hours(DEFAULT_SESSION_TTL_HOURS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_and_get() {
        let manager = SessionManager::default();
        let session = manager.create(Some("user-1".to_string()), None);

        assert_eq!(session.session_id.len(), 32);
        assert!(!session.session_id.contains('-'));
        assert_eq!(session.expires_at - session.created_at, Duration::hours(24));

        let fetched = manager.get(&session.session_id).unwrap();
        assert_eq!(fetched.user_id.as_deref(), Some("user-1"));
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_expired_session_is_removed_on_get() {
        let manager = SessionManager::new(Duration::seconds(-1));
        let session = manager.create(None, None);
        assert!(manager.get(&session.session_id).is_none());
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn test_update_merges_metadata() {
        let manager = SessionManager::default();
        let Value::Object(initial) = json!({"a": 1, "b": 2}) else { unreachable!() };
        let session = manager.create(None, Some(initial));

        let Value::Object(patch) = json!({"b": 3, "c": 4}) else { unreachable!() };
        let updated = manager
            .update(&session.session_id, Some("u".to_string()), Some(patch))
            .unwrap();
        assert_eq!(Value::Object(updated.metadata), json!({"a": 1, "b": 3, "c": 4}));
        assert_eq!(updated.user_id.as_deref(), Some("u"));
        assert!(manager.update("missing", None, None).is_none());
    }

    #[test]
    fn test_delete_and_cleanup() {
        let manager = SessionManager::new(Duration::seconds(-1));
        manager.create(None, None);
        manager.create(None, None);
        assert_eq!(manager.cleanup_expired(), 2);
        assert_eq!(manager.count(), 0);

        let live = SessionManager::default();
        let session = live.create(None, None);
        assert!(live.delete(&session.session_id));
        assert!(!live.delete(&session.session_id));
    }
}
