//! Session context shared by the transport, the session store and the
//! navigation guard
//!
//! The context is an explicit, cloneable handle rather than a process-wide
//! singleton: every clone sees the same state, and separate contexts are
//! fully isolated from each other.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, warn};

use common::error::{ClientError, ClientResult};
use common::storage::{AUTH_TOKEN_KEY, AUTH_USER_KEY, KeyValueStore, MemoryStore};

use crate::models::User;

/// Path of the login surface
pub const LOGIN_PATH: &str = "/login";

/// Current session values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub current_user: Option<User>,
    pub auth_token: Option<String>,
    pub is_loading: bool,
}

impl SessionState {
    /// Authenticated only when both the token and the user are present
    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some() && self.current_user.is_some()
    }
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    remember: bool,
    location: String,
    pending_redirect: Option<String>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            state: SessionState::default(),
            remember: true,
            location: "/".to_string(),
            pending_redirect: None,
        }
    }
}

/// Shared, injectable session handle
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<RwLock<Inner>>,
    storage: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("SessionContext")
            .field("authenticated", &inner.state.is_authenticated())
            .field("is_loading", &inner.state.is_loading)
            .field("location", &inner.location)
            .finish()
    }
}

impl SessionContext {
    /// Create an empty session backed by the given durable storage
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            storage,
        }
    }

    /// Create an empty session backed by in-memory storage
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Durable storage behind this session
    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SessionState {
        self.inner.read().state.clone()
    }

    /// Current auth token
    pub fn token(&self) -> Option<String> {
        self.inner.read().state.auth_token.clone()
    }

    /// Current user
    pub fn current_user(&self) -> Option<User> {
        self.inner.read().state.current_user.clone()
    }

    /// Whether both token and user are present
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().state.is_authenticated()
    }

    /// Whether a login is in flight
    pub fn is_loading(&self) -> bool {
        self.inner.read().state.is_loading
    }

    /// Set the loading flag
    pub fn set_loading(&self, loading: bool) {
        self.inner.write().state.is_loading = loading;
    }

    /// Install a token and user together
    pub fn set_session(&self, token: String, user: User) {
        let mut inner = self.inner.write();
        inner.state.auth_token = Some(token);
        inner.state.current_user = Some(user);
    }

    /// Replace the current user, keeping the token
    pub fn set_user(&self, user: User) {
        self.inner.write().state.current_user = Some(user);
    }

    /// Drop token and user from memory
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.state.auth_token = None;
        inner.state.current_user = None;
    }

    /// Whether the session was last saved with `remember` enabled
    pub fn remember(&self) -> bool {
        self.inner.read().remember
    }

    /// Persist token and user. With `remember == false` nothing is kept on
    /// disk and any previously saved pair is removed.
    pub fn save_to_storage(&self, remember: bool) -> ClientResult<()> {
        let (token, user) = {
            let mut inner = self.inner.write();
            inner.remember = remember;
            (
                inner.state.auth_token.clone(),
                inner.state.current_user.clone(),
            )
        };

        if !remember {
            return self.clear_storage();
        }

        if let (Some(token), Some(user)) = (token, user) {
            let user_json = serde_json::to_string(&user).map_err(|e| {
                ClientError::InvalidRequest(format!("Failed to serialize user: {}", e))
            })?;
            self.storage.set(AUTH_TOKEN_KEY, &token)?;
            self.storage.set(AUTH_USER_KEY, &user_json)?;
        }
        Ok(())
    }

    /// Restore the persisted pair. Corrupted or partial entries are removed
    /// and leave the session anonymous; this never fails.
    pub fn load_from_storage(&self) -> SessionState {
        let token = self.read_entry(AUTH_TOKEN_KEY);
        let user_json = self.read_entry(AUTH_USER_KEY);

        match (token, user_json) {
            (Some(token), Some(user_json)) => match serde_json::from_str::<User>(&user_json) {
                Ok(user) => {
                    info!("Restored session for user: {}", user.id);
                    let mut inner = self.inner.write();
                    inner.state.auth_token = Some(token);
                    inner.state.current_user = Some(user);
                    inner.remember = true;
                }
                Err(e) => {
                    error!("Failed to parse stored user data: {}", e);
                    self.discard_storage();
                }
            },
            (Some(_), None) | (None, Some(_)) => {
                warn!("Discarding incomplete stored session");
                self.discard_storage();
            }
            (None, None) => {}
        }

        self.snapshot()
    }

    /// Remove the persisted pair
    pub fn clear_storage(&self) -> ClientResult<()> {
        self.storage.remove(AUTH_TOKEN_KEY)?;
        self.storage.remove(AUTH_USER_KEY)?;
        Ok(())
    }

    /// Local teardown after the server rejected the session: clears memory
    /// and storage, then redirects to the login surface
    pub fn force_logout(&self) {
        warn!("Session rejected by server, logging out");
        self.clear();
        if let Err(e) = self.clear_storage() {
            error!("Failed to clear stored session: {}", e);
        }
        let mut inner = self.inner.write();
        inner.location = LOGIN_PATH.to_string();
        inner.pending_redirect = Some(LOGIN_PATH.to_string());
    }

    /// Record the path currently displayed
    pub fn set_location(&self, path: &str) {
        self.inner.write().location = path.to_string();
    }

    /// Path currently displayed
    pub fn location(&self) -> String {
        self.inner.read().location.clone()
    }

    /// Whether the login surface is displayed
    pub fn is_on_login_surface(&self) -> bool {
        let inner = self.inner.read();
        let path = inner
            .location
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        path.trim_end_matches('/') == LOGIN_PATH
    }

    /// Take the redirect requested by a forced logout, if any
    pub fn take_redirect(&self) -> Option<String> {
        self.inner.write().pending_redirect.take()
    }

    fn read_entry(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to read stored {}: {}", key, e);
                None
            }
        }
    }

    fn discard_storage(&self) {
        self.clear();
        if let Err(e) = self.clear_storage() {
            error!("Failed to clear stored session: {}", e);
        }
    }
}
