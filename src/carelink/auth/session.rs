//! Session credential storage and the immutable session context.
//!
//! The credential is written under two keys, `token` and `user`, always
//! together. It is considered valid until the backend rejects it; there is no
//! local expiry. Handlers receive a `SessionContext` value and get a new one
//! back from `login`, `logout` and `refresh` instead of mutating shared state.

use super::{dispatcher::Route, types::UserProfile};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session storage unavailable: {0}")]
    Io(#[from] io::Error),
    #[error("session storage is corrupted: {0}")]
    Format(#[from] serde_json::Error),
    #[error("session storage lock poisoned")]
    Poisoned,
}

/// An authenticated actor: bearer token plus the profile returned at login.
#[derive(Clone, Debug)]
pub struct Session {
    token: SecretString,
    user: UserProfile,
}

impl Session {
    #[must_use]
    pub fn new(token: SecretString, user: UserProfile) -> Self {
        Self { token, user }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    #[must_use]
    pub const fn user(&self) -> &UserProfile {
        &self.user
    }
}

/// On-disk layout, mirroring the two storage keys.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<Value>,
}

impl StoredSession {
    fn from_session(session: &Session) -> Self {
        Self {
            token: Some(session.token().to_string()),
            user: Some(Value::Object(session.user.as_map().clone())),
        }
    }

    fn into_session(self) -> Option<Session> {
        let token = self.token.filter(|token| !token.trim().is_empty())?;
        let user = match self.user? {
            Value::Object(fields) => UserProfile::new(fields),
            // older clients stored the profile as a JSON string
            Value::String(serialized) => serde_json::from_str(&serialized).ok()?,
            _ => return None,
        };
        Some(Session::new(SecretString::from(token), user))
    }
}

/// Durable storage for the session credential.
pub trait SessionStore: Send + Sync {
    /// Reads the stored session; `None` when either key is missing.
    ///
    /// # Errors
    /// Returns `StoreError` when the storage cannot be read or decoded.
    fn load(&self) -> Result<Option<Session>, StoreError>;

    /// Writes both keys together.
    ///
    /// # Errors
    /// Returns `StoreError` when the storage cannot be written.
    fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// Removes both keys.
    ///
    /// # Errors
    /// Returns `StoreError` when the storage cannot be cleared.
    fn clear(&self) -> Result<(), StoreError>;
}

/// JSON file holding `{ "token": ..., "user": {...} }`.
#[derive(Clone, Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/carelink/session.json`, falling back to the working directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(env!("CARGO_PKG_NAME"))
            .join("session.json")
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Option<Session>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        let stored: StoredSession = serde_json::from_str(&contents)?;
        let session = stored.into_session();
        if session.is_none() {
            warn!("incomplete session in storage, ignoring");
        }
        Ok(session)
    }

    #[instrument(skip(self, session), fields(path = %self.path.display()))]
    fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let payload = serde_json::to_vec_pretty(&StoredSession::from_session(session))?;

        // write-then-rename so both keys land together
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            restrict_permissions(&file)?;
            file.write_all(&payload)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!("session saved");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("session cleared");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

/// In-process store, used by tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.slot.lock().map_err(|_| StoreError::Poisoned)?.clone())
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        *self.slot.lock().map_err(|_| StoreError::Poisoned)? = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().map_err(|_| StoreError::Poisoned)? = None;
        Ok(())
    }
}

/// Who the current actor is, if anyone. Cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    session: Option<Arc<Session>>,
}

impl SessionContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Hydrates the context from storage.
    ///
    /// # Errors
    /// Returns `StoreError` when the storage cannot be read.
    pub fn load<S: SessionStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        Ok(Self {
            session: store.load()?.map(Arc::new),
        })
    }

    /// Persists `session` and returns the authenticated context.
    ///
    /// # Errors
    /// Returns `StoreError` when the session cannot be written.
    pub fn login<S: SessionStore + ?Sized>(
        &self,
        store: &S,
        session: Session,
    ) -> Result<Self, StoreError> {
        store.save(&session)?;
        Ok(Self {
            session: Some(Arc::new(session)),
        })
    }

    /// Clears storage and returns an anonymous context.
    ///
    /// # Errors
    /// Returns `StoreError` when the storage cannot be cleared.
    pub fn logout<S: SessionStore + ?Sized>(&self, store: &S) -> Result<Self, StoreError> {
        store.clear()?;
        Ok(Self::anonymous())
    }

    /// Re-reads storage, picking up logins or logouts from elsewhere.
    ///
    /// # Errors
    /// Returns `StoreError` when the storage cannot be read.
    pub fn refresh<S: SessionStore + ?Sized>(&self, store: &S) -> Result<Self, StoreError> {
        Self::load(store)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_deref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.session().map(Session::token)
    }

    /// Landing route for the stored role, `None` when anonymous or unknown.
    #[must_use]
    pub fn route(&self) -> Option<Route> {
        self.session()
            .and_then(|session| session.user().role())
            .and_then(|role| Route::for_role(role).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn profile(role: &str) -> UserProfile {
        serde_json::from_value(json!({ "role": role, "email": "user@example.com" })).unwrap()
    }

    fn session(token: &str, role: &str) -> Session {
        Session::new(SecretString::from(token.to_string()), profile(role))
    }

    #[test]
    fn file_store_round_trips_both_keys() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.load().unwrap().is_none());
        store.save(&session("abc", "user")).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw[TOKEN_KEY], "abc");
        assert_eq!(raw[USER_KEY]["role"], "user");

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.token(), "abc");
        assert_eq!(loaded.user().role(), Some("user"));
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&session("abc", "user")).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn file_store_ignores_partial_sessions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileSessionStore::new(&path);

        fs::write(&path, r#"{ "token": "abc" }"#).unwrap();
        assert!(store.load().unwrap().is_none());

        fs::write(&path, r#"{ "token": "", "user": { "role": "user" } }"#).unwrap();
        assert!(store.load().unwrap().is_none());

        fs::write(&path, r#"{ "user": { "role": "user" } }"#).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_accepts_stringified_profile() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{ "token": "abc", "user": "{\"role\":\"admin\"}" }"#).unwrap();

        let loaded = FileSessionStore::new(&path).load().unwrap().unwrap();
        assert_eq!(loaded.user().role(), Some("admin"));
    }

    #[test]
    fn file_store_reports_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            FileSessionStore::new(&path).load(),
            Err(StoreError::Format(_))
        ));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&session("abc", "user")).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn context_transitions_return_new_values() {
        let store = MemorySessionStore::default();
        let anonymous = SessionContext::load(&store).unwrap();
        assert!(!anonymous.is_authenticated());

        let signed_in = anonymous.login(&store, session("abc", "admin")).unwrap();
        assert!(signed_in.is_authenticated());
        assert!(!anonymous.is_authenticated());
        assert_eq!(signed_in.token(), Some("abc"));
        assert_eq!(signed_in.route(), Some(Route::Admin));

        let refreshed = anonymous.refresh(&store).unwrap();
        assert_eq!(refreshed.token(), Some("abc"));

        let signed_out = signed_in.logout(&store).unwrap();
        assert!(!signed_out.is_authenticated());
        assert!(store.load().unwrap().is_none());
        assert_eq!(signed_in.token(), Some("abc"));
    }

    #[test]
    fn unknown_role_has_no_route() {
        let store = MemorySessionStore::default();
        let context = SessionContext::anonymous()
            .login(&store, session("abc", "patient"))
            .unwrap();
        assert_eq!(context.route(), None);
    }

    #[test]
    fn debug_redacts_token() {
        let session = session("super-secret-token", "user");
        assert!(!format!("{session:?}").contains("super-secret-token"));
    }
}
