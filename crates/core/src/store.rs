//! Session Store
//!
//! Keyed storage of one `SessionState` per thread. `put` takes a `SessionUpdate` and
//! merges it with `SessionState::apply`, so callers never overwrite a whole session.

use crate::error::StoreError;
use crate::session::{SessionState, SessionUpdate};
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a new session. Fails with `AlreadyExists` if the key is taken.
    async fn create(&self, state: SessionState) -> Result<(), StoreError>;

    /// Reads a session; `None` when nothing is stored under `thread_id`.
    async fn get(&self, thread_id: &str) -> Result<Option<SessionState>, StoreError>;

    /// Merges `update` into the stored session and returns the result.
    async fn put(&self, thread_id: &str, update: SessionUpdate)
    -> Result<SessionState, StoreError>;
}

/// Process-local store, used by tests and single-process deployments.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, state: SessionState) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&state.thread_id) {
            return Err(StoreError::AlreadyExists(state.thread_id));
        }
        sessions.insert(state.thread_id.clone(), state);
        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<SessionState>, StoreError> {
        Ok(self.sessions.read().await.get(thread_id).cloned())
    }

    async fn put(
        &self,
        thread_id: &str,
        update: SessionUpdate,
    ) -> Result<SessionState, StoreError> {
        let mut sessions = self.sessions.write().await;
        let state = sessions
            .get_mut(thread_id)
            .ok_or_else(|| StoreError::NotFound(thread_id.to_string()))?;
        state.apply(update);
        Ok(state.clone())
    }
}

/// One pretty-printed JSON file per session under a directory.
///
/// Writes go to a temporary file that is renamed over the previous version, so a
/// crash mid-write leaves the last complete state on disk.
pub struct JsonFileSessionStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileSessionStore {
    /// Opens (and creates if needed) the store directory.
    pub async fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create session directory {}", dir.display()))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, thread_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !thread_id.is_empty()
            && thread_id.len() <= 128
            && thread_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(thread_id.to_string()));
        }
        Ok(self.dir.join(format!("{thread_id}.json")))
    }

    async fn read(&self, path: &Path) -> Result<Option<SessionState>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let state = serde_json::from_slice(&bytes)
                    .with_context(|| format!("Corrupt session file {}", path.display()))?;
                Ok(Some(state))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Failed to read {}", path.display()))
                .into()),
        }
    }

    async fn write(&self, path: &Path, state: &SessionState) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(state).context("Failed to serialize session")?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        debug!(path = %path.display(), "Session written");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn create(&self, state: SessionState) -> Result<(), StoreError> {
        let path = self.path_for(&state.thread_id)?;
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(&path).await.context("Failed to check for session file")? {
            return Err(StoreError::AlreadyExists(state.thread_id));
        }
        self.write(&path, &state).await
    }

    async fn get(&self, thread_id: &str) -> Result<Option<SessionState>, StoreError> {
        let path = self.path_for(thread_id)?;
        self.read(&path).await
    }

    async fn put(
        &self,
        thread_id: &str,
        update: SessionUpdate,
    ) -> Result<SessionState, StoreError> {
        let path = self.path_for(thread_id)?;
        let _guard = self.write_lock.lock().await;
        let mut state = self
            .read(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound(thread_id.to_string()))?;
        state.apply(update);
        self.write(&path, &state).await?;
        Ok(state)
    }
}
