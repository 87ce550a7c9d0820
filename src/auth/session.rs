//! Session persistence and the credential provider shared by every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::errors::ClientError;
use crate::models::User;

/// Tokens and user issued at login.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    pub saved_at: DateTime<Utc>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>, user: Option<User>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            user,
            saved_at: Utc::now(),
        }
    }
}

/// Where a session lives between runs.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, ClientError>;
    fn save(&self, session: &Session) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

/// JSON file store, `$HOME/.orderflow/session.json` by default.
#[derive(Clone, Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, ClientError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&self.path).map_err(|e| {
            ClientError::Storage(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        match serde_json::from_str::<Session>(&data) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // A corrupt file is treated like a missing session.
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Storage(format!("failed creating directory {}: {}", parent.display(), e))
            })?;
        }

        let payload = serde_json::to_vec_pretty(session)?;
        fs::write(&self.path, payload).map_err(|e| {
            ClientError::Storage(format!("failed writing {}: {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                ClientError::Storage(format!("failed to remove {}: {}", self.path.display(), e))
            })?;
        }
        Ok(())
    }
}

/// Process-local store, used by tests and one-shot invocations.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, ClientError> {
        Ok(self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &Session) -> Result<(), ClientError> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Single owner of the bearer token.
///
/// The HTTP client reads the token from here on every request, and both
/// refresh and forced logout go through it, so no other code touches the
/// store directly.
pub struct CredentialProvider {
    store: Arc<dyn SessionStore>,
    current: RwLock<Option<Session>>,
}

impl std::fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialProvider")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl CredentialProvider {
    /// Builds a provider primed with whatever the store currently holds.
    pub fn load(store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        let current = store.load()?;
        if current.is_some() {
            debug!("Restored saved session");
        }
        Ok(Self {
            store,
            current: RwLock::new(current),
        })
    }

    /// Provider with an empty in-memory store.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemorySessionStore::new()),
            current: RwLock::new(None),
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().as_ref().and_then(|s| s.refresh_token.clone())
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().as_ref().and_then(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Replaces the session, persisting it first.
    pub fn install(&self, session: Session) -> Result<(), ClientError> {
        self.store.save(&session)?;
        *self.write() = Some(session);
        info!("Session installed");
        Ok(())
    }

    /// Swaps in a refreshed access token, keeping the user.
    pub fn update_access_token(
        &self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Result<(), ClientError> {
        let updated = {
            let guard = self.read();
            let mut session = guard.clone().ok_or(ClientError::NotAuthenticated)?;
            session.access_token = access_token;
            if refresh_token.is_some() {
                session.refresh_token = refresh_token;
            }
            session.saved_at = Utc::now();
            session
        };
        self.install(updated)
    }

    /// Forced logout: drops the cached session and clears the store.
    pub fn invalidate(&self) {
        *self.write() = None;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
        info!("Session invalidated");
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use tempfile::TempDir;

    fn manager() -> User {
        User {
            id: 9,
            username: "mgr".into(),
            first_name: "Marie".into(),
            last_name: "Leroy".into(),
            email: "mgr@example.com".into(),
            role: Role::Manager,
        }
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));
        assert!(store.load().unwrap().is_none());

        let session = Session::new("access-1", Some("refresh-1".into()), Some(manager()));
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_file_reads_as_logged_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        assert!(FileSessionStore::new(path).load().unwrap().is_none());
    }

    #[test]
    fn refresh_keeps_user_and_refresh_token() {
        let provider = CredentialProvider::in_memory();
        provider
            .install(Session::new("old", Some("r1".into()), Some(manager())))
            .unwrap();

        provider.update_access_token("new".into(), None).unwrap();
        assert_eq!(provider.access_token().as_deref(), Some("new"));
        assert_eq!(provider.refresh_token().as_deref(), Some("r1"));
        assert_eq!(provider.current_user().map(|u| u.id), Some(9));
    }

    #[test]
    fn refresh_without_session_is_rejected() {
        let provider = CredentialProvider::in_memory();
        let err = provider.update_access_token("x".into(), None).unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[test]
    fn invalidate_clears_the_store_too() {
        let store = Arc::new(MemorySessionStore::new());
        let provider = CredentialProvider::load(store.clone()).unwrap();
        provider.install(Session::new("tok", None, None)).unwrap();
        assert!(store.load().unwrap().is_some());

        provider.invalidate();
        assert!(!provider.is_authenticated());
        assert!(store.load().unwrap().is_none());
    }
}
