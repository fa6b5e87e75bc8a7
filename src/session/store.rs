use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{config::config::StoreConfig, quiz::models::GameSession};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session {0} does not exist")]
    NotFound(String),

    #[error("Session {0} already exists")]
    AlreadyExists(String),

    #[error("Timed out waiting for exclusive access to session {0}")]
    LockTimeout(String),
}

#[derive(Debug)]
struct StoredSession {
    session: GameSession,
    expires_at: DateTime<Utc>,
}

impl StoredSession {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Keyed session storage. Every `mutate` on a key runs under that key's
/// mutex, so read-modify-write cycles on one session never interleave.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Arc<Mutex<StoredSession>>>>,
    ttl: chrono::Duration,
    lock_timeout: Duration,
}

impl SessionStore {
    pub fn new(ttl: chrono::Duration, lock_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl,
            lock_timeout,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(
            chrono::Duration::seconds(config.ttl_secs),
            Duration::from_millis(config.lock_timeout_ms),
        )
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether an entry is held for `id`, expired or not.
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn create(&self, session: GameSession) -> Result<(), StoreError> {
        let id = session.session_id.clone();
        match self.sessions.entry(id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(id)),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(Mutex::new(StoredSession {
                    session,
                    expires_at: Utc::now() + self.ttl,
                })));
                debug!("Stored session {}", id);
                Ok(())
            }
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<GameSession>, StoreError> {
        let Some(entry) = self.entry(id) else {
            return Ok(None);
        };

        let guard = self.lock(id, &entry).await?;
        if guard.is_expired(Utc::now()) {
            return Ok(None);
        }

        Ok(Some(guard.session.clone()))
    }

    /// Runs `f` on a working copy of the session and persists the copy only
    /// when `f` succeeds. A failed `f` leaves the stored session untouched.
    pub async fn mutate<F, R, E>(&self, id: &str, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut GameSession) -> Result<R, E>,
        E: From<StoreError>,
    {
        let entry = self
            .entry(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut guard = self.lock(id, &entry).await?;
        if guard.is_expired(Utc::now()) {
            return Err(StoreError::NotFound(id.to_string()).into());
        }

        let mut working = guard.session.clone();
        let result = f(&mut working)?;

        guard.session = working;
        guard.expires_at = Utc::now() + self.ttl;

        Ok(result)
    }

    /// Drops expired sessions. Sessions currently locked are left for the
    /// next sweep.
    pub fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();

        self.sessions.retain(|_, entry| match entry.try_lock() {
            Ok(stored) => !stored.is_expired(now),
            Err(_) => true,
        });

        before.saturating_sub(self.sessions.len())
    }

    fn entry(&self, id: &str) -> Option<Arc<Mutex<StoredSession>>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    async fn lock<'a>(
        &self,
        id: &str,
        entry: &'a Arc<Mutex<StoredSession>>,
    ) -> Result<MutexGuard<'a, StoredSession>, StoreError> {
        tokio::time::timeout(self.lock_timeout, entry.lock())
            .await
            .map_err(|_| {
                warn!("Lock acquisition timed out for session {}", id);
                StoreError::LockTimeout(id.to_string())
            })
    }
}
