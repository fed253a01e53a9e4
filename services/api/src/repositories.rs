//! Repositories for the admin API resources
//!
//! Each repository wraps a clone of the [`HttpClient`] and maps raw
//! responses through the model normalizers.

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use common::error::{ClientError, ClientResult};

use crate::models::auth::current_user_from_value;
use crate::models::payload::unwrap_envelope;
use crate::models::{
    FileUpload, NewUser, PageRequest, Paginated, User, UserQuery, UserUpdate,
};
use crate::transport::{FormPayload, HttpClient, RequestBody};
use crate::validation::{validate_new_user, validate_user_update};

pub mod auth;
pub mod course_types;
pub mod courses;

pub use auth::AuthRepository;
pub use course_types::CourseTypeRepository;
pub use courses::CourseRepository;

const USERS_PATH: &str = "/admin/users";
const PROFILE_PATH: &str = "/profile/update";
const IMPORT_PATH: &str = "/admin/users/import";

/// User repository for the admin user endpoints
#[derive(Clone, Debug)]
pub struct UserRepository {
    http: HttpClient,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// List users matching the query
    pub async fn list(&self, query: &UserQuery) -> ClientResult<Paginated<User>> {
        let raw = self.http.get(USERS_PATH, &query.to_query()).await?;
        let request = PageRequest {
            page: query.page,
            per_page: query.show,
        };
        Paginated::from_value(&raw, request, User::from_value)
    }

    /// Get a user by ID
    pub async fn get(&self, id: i64) -> ClientResult<User> {
        let raw = self.http.get(&user_path(id), &[]).await?;
        User::from_value(unwrap_envelope(&raw))
    }

    /// Create a new user; an attached image switches the request to multipart
    pub async fn create(&self, user: &NewUser) -> ClientResult<User> {
        validate_new_user(user)?;

        let body = match &user.image {
            Some(image) => RequestBody::Multipart(
                FormPayload::from_serializable(user)?.file("image", image.clone()),
            ),
            None => RequestBody::json(user)?,
        };

        let raw = self.http.post(USERS_PATH, body).await?;
        let created = User::from_value(unwrap_envelope(&raw))?;
        info!("Created user: {}", created.id);
        Ok(created)
    }

    /// Update a user
    pub async fn update(&self, id: i64, update: &UserUpdate) -> ClientResult<User> {
        let raw = self.send_update(id, update).await?;
        User::from_value(unwrap_envelope(&raw))
    }

    /// Mark a user as deleted without removing it
    pub async fn soft_delete(&self, id: i64) -> ClientResult<()> {
        let update = UserUpdate {
            deleted_at: Some(Some(Utc::now().to_rfc3339())),
            ..UserUpdate::default()
        };
        self.send_update(id, &update).await?;
        info!("Soft-deleted user: {}", id);
        Ok(())
    }

    /// Clear a user's soft-delete marker
    pub async fn restore(&self, id: i64) -> ClientResult<()> {
        let update = UserUpdate {
            deleted_at: Some(None),
            ..UserUpdate::default()
        };
        self.send_update(id, &update).await?;
        info!("Restored user: {}", id);
        Ok(())
    }

    /// Update the authenticated user's own profile
    pub async fn update_profile(&self, update: &UserUpdate) -> ClientResult<User> {
        validate_user_update(update)?;
        let raw = self.http.post(PROFILE_PATH, RequestBody::json(update)?).await?;
        current_user_from_value(&raw)
    }

    /// Bulk-create users from a spreadsheet or CSV file. Returns the
    /// server's report, unwrapped from its `data` envelope when present.
    pub async fn import(&self, file: FileUpload) -> ClientResult<Value> {
        if file.bytes.is_empty() {
            return Err(ClientError::field("file", "The import file is empty"));
        }
        let file_name = file.file_name.clone();
        let form = FormPayload::new().file("file", file);
        let raw = self
            .http
            .post(IMPORT_PATH, RequestBody::Multipart(form))
            .await?;
        info!("Imported users from {}", file_name);
        Ok(unwrap_envelope(&raw).clone())
    }

    /// Delete a user
    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.http.delete(&user_path(id)).await?;
        info!("Deleted user: {}", id);
        Ok(())
    }

    /// JSON `PUT`, or multipart `POST` with a method override when an image
    /// is attached
    async fn send_update(&self, id: i64, update: &UserUpdate) -> ClientResult<Value> {
        validate_user_update(update)?;
        let path = user_path(id);

        match &update.image {
            Some(image) => {
                let form = FormPayload::from_serializable(update)?
                    .file("image", image.clone())
                    .with_method_override("PUT");
                self.http.post(&path, RequestBody::Multipart(form)).await
            }
            None => self.http.put(&path, RequestBody::json(update)?).await,
        }
    }
}

fn user_path(id: i64) -> String {
    format!("{}/{}", USERS_PATH, id)
}
