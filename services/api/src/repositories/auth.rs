//! Authentication endpoints

use common::error::ClientResult;

use crate::models::auth::{current_user_from_value, refreshed_token_from_value};
use crate::models::{LoginCredentials, LoginResponse, User};
use crate::transport::{HttpClient, RequestBody};

/// Auth repository for login, logout and token refresh
#[derive(Clone, Debug)]
pub struct AuthRepository {
    http: HttpClient,
}

impl AuthRepository {
    /// Create a new auth repository
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Exchange credentials for a token and the signed-in user
    pub async fn login(&self, credentials: &LoginCredentials) -> ClientResult<LoginResponse> {
        let raw = self
            .http
            .post("/login", RequestBody::json(credentials)?)
            .await?;
        LoginResponse::from_value(&raw)
    }

    /// Invalidate the current token on the server
    pub async fn logout(&self) -> ClientResult<()> {
        self.http.post("/logout", RequestBody::Empty).await?;
        Ok(())
    }

    /// Fetch the authenticated user
    pub async fn current_user(&self) -> ClientResult<User> {
        let raw = self.http.get("/user", &[]).await?;
        current_user_from_value(&raw)
    }

    /// Obtain a fresh token
    pub async fn refresh_token(&self) -> ClientResult<String> {
        let raw = self.http.post("/refresh", RequestBody::Empty).await?;
        refreshed_token_from_value(&raw)
    }
}
