use crate::types::{AuthSession, User, UserRole};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;
use std::{
    fs, io,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tokio::sync::watch::{self, Sender};
use tokio_stream::wrappers::WatchStream;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Authenticated,
    Unauthenticated,
}

/// Where the session survives between runs. `load` failures are treated as
/// "no session", never as fatal.
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load(&self) -> Option<AuthSession>;
    fn save(&self, session: &AuthSession) -> Result<(), String>;
    fn clear(&self);
}

/// JSON file persistence, one session per file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionPersistence for FileSessionStore {
    fn load(&self) -> Option<AuthSession> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(?err, "Failed to read session file");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(?err, "Failed to parse session file");
                None
            }
        }
    }

    fn save(&self, session: &AuthSession) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| format!("Failed to create session directory: {err}"))?;
        }
        let raw = serde_json::to_string_pretty(session)
            .map_err(|err| format!("Failed to serialize session: {err}"))?;
        fs::write(&self.path, raw).map_err(|err| format!("Failed to write session file: {err}"))
    }

    fn clear(&self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(?err, "Failed to remove session file");
            }
        }
    }
}

/// The current session, readable from anywhere the store is handed to and
/// persisted through the adapter on every mutation. Status changes are
/// broadcast over a watch channel.
#[derive(Debug, Clone)]
pub struct SessionStore<P: SessionPersistence> {
    persistence: P,
    session: Arc<Mutex<Option<AuthSession>>>,
    sender: Arc<Sender<AuthStatus>>,
}

impl<P: SessionPersistence> SessionStore<P> {
    pub fn new(persistence: P) -> Self {
        let session = persistence.load().map(|mut session| {
            session.user = merge_user_with_token(session.user, &session.token);
            session
        });
        let status = match session {
            Some(_) => AuthStatus::Authenticated,
            None => AuthStatus::Unauthenticated,
        };
        let (sender, _) = watch::channel(status);
        Self {
            persistence,
            session: Arc::new(Mutex::new(session)),
            sender: Arc::new(sender),
        }
    }

    pub fn status_stream(&self) -> WatchStream<AuthStatus> {
        WatchStream::new(self.sender.subscribe())
    }

    pub fn status(&self) -> AuthStatus {
        *self.sender.borrow()
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.session.lock().unwrap().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|session| session.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|session| session.user.clone())
    }

    /// Stores a fresh token/user pair, merging identity fields from the
    /// token claims over the profile the server returned.
    pub fn set_session(&self, token: String, user: User) -> Result<(), String> {
        let session = AuthSession {
            user: merge_user_with_token(user, &token),
            token,
        };
        self.persistence.save(&session)?;
        *self.session.lock().unwrap() = Some(session);
        self.sender.send_replace(AuthStatus::Authenticated);
        Ok(())
    }

    pub fn clear(&self) {
        self.persistence.clear();
        *self.session.lock().unwrap() = None;
        self.sender.send_replace(AuthStatus::Unauthenticated);
    }
}

#[derive(Debug, Default, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<UserRole>,
}

fn decode_token_claims(token: &str) -> Option<TokenClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD.decode(payload))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Claim merge is best-effort: an opaque or malformed token leaves the
/// stored profile untouched.
fn merge_user_with_token(mut user: User, token: &str) -> User {
    let Some(claims) = decode_token_claims(token) else {
        warn!("Failed to decode token claims");
        return user;
    };
    if claims.id.is_some() {
        user.id = claims.id;
    }
    if let Some(email) = claims.email {
        user.email = email;
    }
    if let Some(role) = claims.role {
        user.role = role;
    }
    user
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutils::sample_user;
    use futures::StreamExt;
    use tempfile::TempDir;

    fn token_with_claims(claims: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims);
        format!("{header}.{payload}.signature")
    }

    fn store_at(dir: &TempDir) -> SessionStore<FileSessionStore> {
        SessionStore::new(FileSessionStore::new(dir.path().join("session.json")))
    }

    #[test]
    fn test_session_round_trip_and_reload() {
        let dir = TempDir::new().unwrap();
        let store = store_at(&dir);
        assert_eq!(store.status(), AuthStatus::Unauthenticated);
        assert!(store.session().is_none());

        let user = sample_user();
        store
            .set_session("opaque-token".into(), user.clone())
            .unwrap();
        assert_eq!(store.status(), AuthStatus::Authenticated);
        assert_eq!(store.token().unwrap(), "opaque-token");
        assert_eq!(store.user().unwrap().email, user.email);

        // A second store over the same file picks the session up again.
        let reloaded = store_at(&dir);
        assert_eq!(reloaded.status(), AuthStatus::Authenticated);
        assert_eq!(reloaded.token().unwrap(), "opaque-token");
    }

    #[test]
    fn test_clear_removes_file_and_session() {
        let dir = TempDir::new().unwrap();
        let store = store_at(&dir);
        store.set_session("token".into(), sample_user()).unwrap();

        store.clear();
        assert_eq!(store.status(), AuthStatus::Unauthenticated);
        assert!(store.session().is_none());
        assert!(!dir.path().join("session.json").exists());

        let reloaded = store_at(&dir);
        assert!(reloaded.session().is_none());
    }

    #[test]
    fn test_token_claims_override_profile_fields() {
        let dir = TempDir::new().unwrap();
        let store = store_at(&dir);

        let id = Uuid::new_v4();
        let token = token_with_claims(&format!(
            r#"{{"id":"{id}","email":"claimed@example.com","role":"BUSINESS_OWNER"}}"#
        ));
        store.set_session(token, sample_user()).unwrap();

        let user = store.user().unwrap();
        assert_eq!(user.id, Some(id));
        assert_eq!(user.email, "claimed@example.com");
        assert_eq!(user.role, UserRole::BusinessOwner);
    }

    #[test]
    fn test_opaque_token_keeps_profile() {
        let dir = TempDir::new().unwrap();
        let store = store_at(&dir);

        let user = sample_user();
        store.set_session("not-a-jwt".into(), user.clone()).unwrap();
        assert_eq!(store.user().unwrap(), user);
    }

    #[test]
    fn test_corrupt_session_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("session.json"), "{ not json").unwrap();

        let store = store_at(&dir);
        assert!(store.session().is_none());
        assert_eq!(store.status(), AuthStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_status_stream_reports_changes() {
        let dir = TempDir::new().unwrap();
        let store = store_at(&dir);
        let mut stream = store.status_stream();

        assert_eq!(stream.next().await, Some(AuthStatus::Unauthenticated));

        store.set_session("token".into(), sample_user()).unwrap();
        assert_eq!(stream.next().await, Some(AuthStatus::Authenticated));

        store.clear();
        assert_eq!(stream.next().await, Some(AuthStatus::Unauthenticated));
    }
}
