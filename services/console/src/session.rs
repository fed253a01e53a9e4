//! Session store: the Anonymous/Authenticated state machine
//!
//! Login and logout never fail from the caller's point of view. A failed
//! login resolves to a user-facing message, and a failed remote logout
//! still tears the local session down.

use tracing::{debug, error, info};

use api::models::{LoginCredentials, User, UserPatch};
use api::repositories::AuthRepository;
use api::session::{SessionContext, SessionState};
use api::transport::field_errors;
use api::ApiClient;
use common::error::{ClientError, ClientResult};
use serde_json::Value;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid login or password";
pub const VALIDATION_MESSAGE: &str = "Validation error. Please check your input.";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
pub const CONNECTIVITY_MESSAGE: &str = "Unable to connect to server. Please check your connection.";
pub const GENERIC_LOGIN_MESSAGE: &str = "Login failed. Please try again.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Outcome of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResult {
    Success,
    Failure(String),
}

impl LoginResult {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginResult::Success)
    }

    /// Failure message, if the login failed
    pub fn message(&self) -> Option<&str> {
        match self {
            LoginResult::Success => None,
            LoginResult::Failure(message) => Some(message),
        }
    }
}

/// Session store on top of the shared session context
#[derive(Clone, Debug)]
pub struct SessionStore {
    context: SessionContext,
    auth: AuthRepository,
}

impl SessionStore {
    /// Create a new session store
    pub fn new(context: SessionContext, auth: AuthRepository) -> Self {
        Self { context, auth }
    }

    /// Session store bound to an API client's session
    pub fn from_client(client: &ApiClient) -> Self {
        Self::new(client.session().clone(), client.auth.clone())
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn state(&self) -> SessionState {
        self.context.snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.context.is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.context.current_user()
    }

    /// Sign in. On success the token and user are installed and persisted
    /// according to `credentials.remember`.
    pub async fn login(&self, credentials: &LoginCredentials) -> LoginResult {
        self.context.set_loading(true);

        let result = match self.auth.login(credentials).await {
            Ok(response) => {
                info!("User {} logged in", response.user.id);
                self.context.set_session(response.token, response.user);
                if let Err(e) = self.context.save_to_storage(credentials.remember) {
                    error!("Failed to persist session: {}", e);
                }
                LoginResult::Success
            }
            Err(e) => {
                error!("Login error: {}", e);
                LoginResult::Failure(login_failure_message(&e))
            }
        };

        self.context.set_loading(false);
        result
    }

    /// Sign out. The remote call is best effort; local state and storage
    /// are always cleared.
    pub async fn logout(&self) {
        if let Err(e) = self.auth.logout().await {
            error!("Logout API error: {}", e);
        }

        self.context.clear();
        if let Err(e) = self.context.clear_storage() {
            error!("Failed to clear stored session: {}", e);
        }
        info!("Logged out");
    }

    /// Restore a persisted session
    pub fn load_from_storage(&self) -> SessionState {
        self.context.load_from_storage()
    }

    /// Persist the current session
    pub fn save_to_storage(&self, remember: bool) -> ClientResult<()> {
        self.context.save_to_storage(remember)
    }

    /// Merge partial fields into the current user and re-persist. Does
    /// nothing while anonymous.
    pub fn update_user(&self, patch: UserPatch) -> ClientResult<()> {
        if !self.context.is_authenticated() {
            debug!("Ignoring user update without an active session");
            return Ok(());
        }
        let Some(mut user) = self.context.current_user() else {
            return Ok(());
        };

        patch.apply(&mut user);
        self.context.set_user(user);
        self.context.save_to_storage(self.context.remember())
    }

    /// Re-fetch the signed-in user from the server
    pub async fn refresh_current_user(&self) -> ClientResult<Option<User>> {
        if !self.context.is_authenticated() {
            return Ok(None);
        }

        let user = self.auth.current_user().await?;
        self.update_user(UserPatch::from(&user))?;
        Ok(self.context.current_user())
    }
}

/// User-facing message for a failed login, by priority: first field error,
/// body message, status message, connectivity, generic fallback
pub fn login_failure_message(error: &ClientError) -> String {
    match error {
        ClientError::Validation { message, errors } | ClientError::Rejected { message, errors } => {
            first_field_error(errors)
                .or_else(|| non_empty(message))
                .unwrap_or_else(|| VALIDATION_MESSAGE.to_string())
        }
        ClientError::Http { status, body } => first_field_error(&field_errors(body))
            .or_else(|| body.get("message").and_then(Value::as_str).and_then(non_empty))
            .unwrap_or_else(|| status_message(*status).to_string()),
        ClientError::Connectivity(_) => CONNECTIVITY_MESSAGE.to_string(),
        ClientError::MalformedResponse(message) | ClientError::InvalidRequest(message) => {
            non_empty(message).unwrap_or_else(|| UNEXPECTED_ERROR_MESSAGE.to_string())
        }
        other => other.to_string(),
    }
}

fn first_field_error(errors: &[(String, Vec<String>)]) -> Option<String> {
    errors
        .first()
        .and_then(|(_, messages)| messages.first())
        .cloned()
}

fn non_empty(message: &str) -> Option<String> {
    (!message.is_empty()).then(|| message.to_string())
}

fn status_message(status: u16) -> &'static str {
    match status {
        401 => INVALID_CREDENTIALS_MESSAGE,
        422 => VALIDATION_MESSAGE,
        500 => SERVER_ERROR_MESSAGE,
        _ => GENERIC_LOGIN_MESSAGE,
    }
}
