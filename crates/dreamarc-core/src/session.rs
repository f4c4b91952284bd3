//! Signed-in student session, shared by the backend client and the UI.
//!
//! The store keeps the current `AuthSession` in memory and mirrors it to a
//! `SessionPersistence` backend so the next run starts signed in.

use dreamarc_protocol::{AuthSession, StudentId};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by session persistence.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt session: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Raw string storage for the serialized session.
pub trait SessionPersistence: Send + Sync {
    /// Load the stored value, if any.
    fn load(&self) -> Result<Option<String>, SessionError>;
    /// Replace the stored value.
    fn save(&self, contents: &str) -> Result<(), SessionError>;
    /// Forget the stored value. Removing a missing value is not an error.
    fn remove(&self) -> Result<(), SessionError>;
}

/// Session persisted as a JSON file.
#[derive(Debug)]
pub struct JsonFileSessionPersistence {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileSessionPersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for JsonFileSessionPersistence {
    fn load(&self) -> Result<Option<String>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, contents: &str) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        debug!("session written (path={})", self.path.display());
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Session kept only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionPersistence {
    contents: Mutex<Option<String>>,
}

impl MemorySessionPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with raw contents, as if written by an earlier run.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl SessionPersistence for MemorySessionPersistence {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self.contents.lock().clone())
    }

    fn save(&self, contents: &str) -> Result<(), SessionError> {
        *self.contents.lock() = Some(contents.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        self.contents.lock().take();
        Ok(())
    }
}

/// Process-wide session state with optional persistence.
#[derive(Clone)]
pub struct SessionStore {
    current: Arc<RwLock<Option<AuthSession>>>,
    persistence: Option<Arc<dyn SessionPersistence>>,
}

impl SessionStore {
    pub fn new(persistence: Option<Arc<dyn SessionPersistence>>) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            persistence,
        }
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Load the persisted session at startup.
    ///
    /// A stored session without an access token is ignored. Unreadable JSON
    /// is logged and the stored copy removed. Never fails.
    pub fn hydrate(&self) -> Option<AuthSession> {
        let persistence = self.persistence.as_ref()?;
        let contents = match persistence.load() {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                debug!("no persisted session");
                return None;
            }
            Err(err) => {
                warn!("failed to read persisted session: {}", err);
                return None;
            }
        };

        match parse_session(&contents) {
            Ok(Some(session)) => {
                info!("session restored (student_id={:?})", session.id);
                *self.current.write() = Some(session.clone());
                Some(session)
            }
            Ok(None) => {
                debug!("persisted session has no access token; ignoring");
                None
            }
            Err(err) => {
                warn!("auth hydration failed, discarding stored session: {}", err);
                if let Err(err) = persistence.remove() {
                    warn!("failed to remove corrupt session: {}", err);
                }
                None
            }
        }
    }

    /// Make `session` current and persist it.
    pub fn set(&self, session: AuthSession) -> Result<(), SessionError> {
        if let Some(persistence) = &self.persistence {
            let contents = serde_json::to_string(&session)?;
            persistence.save(&contents)?;
        }
        info!("session set (student_id={:?}, name={})", session.id, session.name);
        *self.current.write() = Some(session);
        Ok(())
    }

    /// Forget the current session and its persisted copy.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.current.write().take();
        if let Some(persistence) = &self.persistence {
            persistence.remove()?;
        }
        info!("session cleared");
        Ok(())
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.current.read().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.current
            .read()
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    pub fn student_id(&self) -> Option<StudentId> {
        self.current.read().as_ref().and_then(|session| session.id)
    }
}

/// `Ok(None)` when the JSON is well formed but carries no usable token.
fn parse_session(contents: &str) -> Result<Option<AuthSession>, SessionError> {
    let value: Value = serde_json::from_str(contents)?;
    let has_token = value
        .get("access_token")
        .and_then(Value::as_str)
        .is_some_and(|token| !token.is_empty());
    if !has_token {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn session() -> AuthSession {
        AuthSession {
            access_token: "token".to_string(),
            token_type: "bearer".to_string(),
            id: Some(3),
            name: "ada".to_string(),
            email: "ada".to_string(),
            role: Some("student".to_string()),
        }
    }

    #[test]
    fn set_persists_and_hydrate_restores() {
        let root = tempdir().expect("root");
        let path = root.path().join("nested").join("session.json");
        let store = SessionStore::new(Some(Arc::new(JsonFileSessionPersistence::new(&path))));
        store.set(session()).expect("set");
        assert!(path.exists());

        let restored =
            SessionStore::new(Some(Arc::new(JsonFileSessionPersistence::new(&path))));
        assert_eq!(restored.hydrate(), Some(session()));
        assert_eq!(restored.student_id(), Some(3));
        assert_eq!(restored.access_token(), Some("token".to_string()));
    }

    #[test]
    fn clear_removes_file() {
        let root = tempdir().expect("root");
        let path = root.path().join("session.json");
        let store = SessionStore::new(Some(Arc::new(JsonFileSessionPersistence::new(&path))));
        store.set(session()).expect("set");
        store.clear().expect("clear");
        assert!(!path.exists());
        assert!(!store.is_signed_in());
        store.clear().expect("clear twice");
    }

    #[test]
    fn corrupt_file_is_removed() {
        let root = tempdir().expect("root");
        let path = root.path().join("session.json");
        fs::write(&path, "{not json").expect("write");
        let store = SessionStore::new(Some(Arc::new(JsonFileSessionPersistence::new(&path))));
        assert_eq!(store.hydrate(), None);
        assert!(!path.exists());
    }

    #[test]
    fn session_without_token_is_ignored_but_kept() {
        let persistence = Arc::new(MemorySessionPersistence::with_contents(
            r#"{"name": "ada", "id": 4}"#,
        ));
        let store = SessionStore::new(Some(persistence.clone()));
        assert_eq!(store.hydrate(), None);
        assert!(!store.is_signed_in());
        assert!(persistence.contents().is_some());
    }

    #[test]
    fn in_memory_store_has_no_persistence() {
        let store = SessionStore::in_memory();
        assert_eq!(store.hydrate(), None);
        store.set(session()).expect("set");
        assert_eq!(store.current(), Some(session()));
    }
}
