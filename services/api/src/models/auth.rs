//! Authentication payloads and their normalization

use serde::Serialize;
use serde_json::Value;

use common::error::{ClientError, ClientResult};

use super::payload::{envelope, first_present, is_truthy};
use super::user::User;

/// User login credentials
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    /// Email or username
    pub login: String,
    pub password: String,
    /// Persist the session across restarts
    pub remember: bool,
}

impl LoginCredentials {
    /// Credentials with `remember` enabled
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            remember: true,
        }
    }

    /// Set the remember flag
    pub fn remember(mut self, remember: bool) -> Self {
        self.remember = remember;
        self
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("remember", &self.remember)
            .finish()
    }
}

/// Normalized login response
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

impl LoginResponse {
    /// Normalize the login response. Accepted shapes:
    /// - `{ data: { user: {...}, token } }`
    /// - `{ data: { ...user, token } }`
    /// - `{ user: {...}, token }` or `{ user: {...}, access_token }`
    pub fn from_value(raw: &Value) -> ClientResult<Self> {
        let (user, token) = match envelope(raw) {
            Some(inner) => (
                inner.get("user").filter(|user| is_truthy(user)).unwrap_or(inner),
                token_of(inner),
            ),
            None => (
                raw.get("user")
                    .filter(|user| is_truthy(user))
                    .ok_or_else(|| {
                        ClientError::MalformedResponse(
                            "Login response carries no user".to_string(),
                        )
                    })?,
                token_of(raw),
            ),
        };

        let token = token.ok_or_else(|| {
            ClientError::MalformedResponse("Login response carries no token".to_string())
        })?;

        Ok(LoginResponse {
            user: User::from_value(user)?,
            token,
        })
    }
}

/// Normalize the current-user response: `{data}`, `{user}` or the user itself
pub fn current_user_from_value(raw: &Value) -> ClientResult<User> {
    let user = envelope(raw)
        .or_else(|| raw.get("user").filter(|user| is_truthy(user)))
        .unwrap_or(raw);
    User::from_value(user)
}

/// Normalize the token refresh response
pub fn refreshed_token_from_value(raw: &Value) -> ClientResult<String> {
    let body = envelope(raw).unwrap_or(raw);
    token_of(body).ok_or_else(|| {
        ClientError::MalformedResponse("Refresh response carries no token".to_string())
    })
}

fn token_of(raw: &Value) -> Option<String> {
    first_present(raw, &["token", "access_token"])
        .and_then(Value::as_str)
        .map(str::to_string)
}
