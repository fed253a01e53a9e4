//! User model and normalization
//!
//! Backend user payloads nest most fields under an `attribute` wrapper, encode
//! `role`/`gender` as numbers or strings and mark soft deletes with
//! `deleted_at`. [`User::from_value`] always emits the same shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use common::error::{ClientError, ClientResult};

use super::payload::{NumberOrString, decode};
use super::upload::FileUpload;

/// Reference to a user's image: a media id or a path/URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Id(i64),
    Path(String),
}

impl From<NumberOrString> for ImageRef {
    fn from(value: NumberOrString) -> Self {
        match value.as_i64() {
            Some(id) if matches!(value, NumberOrString::Number(_)) => ImageRef::Id(id),
            _ => ImageRef::Path(value.into_string()),
        }
    }
}

/// User entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Display name some endpoints send instead of first/last names
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub role: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub listening_from: Option<String>,
    pub image: Option<ImageRef>,
    pub sitting_id: Option<i64>,
    /// Soft-delete marker; `None` for active users
    pub soft_deleted_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Fields a backend user object may carry, at the top level or under
/// `attribute`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUserFields {
    id: Option<NumberOrString>,
    first_name: Option<String>,
    last_name: Option<String>,
    name: Option<String>,
    email: Option<String>,
    phone_num: Option<NumberOrString>,
    gender: Option<NumberOrString>,
    date_of_birth: Option<String>,
    birthday: Option<String>,
    role: Option<NumberOrString>,
    city: Option<String>,
    address: Option<String>,
    listening_from: Option<String>,
    listen_from: Option<String>,
    image: Option<NumberOrString>,
    sitting_id: Option<NumberOrString>,
    deleted_at: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl User {
    /// Normalize a backend user object (wrapped in `attribute` or flat)
    pub fn from_value(raw: &Value) -> ClientResult<Self> {
        if !raw.is_object() {
            return Err(ClientError::MalformedResponse(
                "Expected a user object".to_string(),
            ));
        }

        let outer: RawUserFields = decode(raw, "user")?;
        let attribute: Option<RawUserFields> = match raw.get("attribute") {
            Some(value) if value.is_object() => Some(decode(value, "user attribute")?),
            _ => None,
        };

        let id = outer
            .id
            .as_ref()
            .or(attribute.as_ref().and_then(|attr| attr.id.as_ref()))
            .and_then(NumberOrString::as_i64)
            .ok_or_else(|| {
                ClientError::MalformedResponse("User payload has no id".to_string())
            })?;

        let (fields, outer_created_at, outer_updated_at) = match attribute {
            Some(attr) => (attr, outer.created_at, outer.updated_at),
            None => (outer, None, None),
        };

        Ok(User {
            id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            name: fields.name,
            email: fields.email,
            phone: fields.phone_num.map(NumberOrString::into_string),
            gender: fields.gender.map(NumberOrString::into_string),
            date_of_birth: fields.date_of_birth.or(fields.birthday),
            role: fields.role.map(NumberOrString::into_string),
            city: fields.city,
            address: fields.address,
            listening_from: fields.listening_from.or(fields.listen_from),
            image: fields.image.map(ImageRef::from),
            sitting_id: fields.sitting_id.as_ref().and_then(NumberOrString::as_i64),
            soft_deleted_at: fields.deleted_at,
            created_at: fields.created_at.or(outer_created_at),
            updated_at: fields.updated_at.or(outer_updated_at),
        })
    }

    /// Name to show for the user
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|name| !name.is_empty()) {
            return name.to_string();
        }
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        self.email
            .clone()
            .unwrap_or_else(|| format!("User #{}", self.id))
    }

    /// Whether the user is soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.soft_deleted_at.is_some()
    }
}

/// Partial user fields merged into the session's current user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub role: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub listening_from: Option<String>,
    pub image: Option<ImageRef>,
}

impl UserPatch {
    /// Overwrite the fields this patch sets
    pub fn apply(self, user: &mut User) {
        fn set<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut user.first_name, self.first_name);
        set(&mut user.last_name, self.last_name);
        set(&mut user.name, self.name);
        set(&mut user.email, self.email);
        set(&mut user.phone, self.phone);
        set(&mut user.gender, self.gender);
        set(&mut user.date_of_birth, self.date_of_birth);
        set(&mut user.role, self.role);
        set(&mut user.city, self.city);
        set(&mut user.address, self.address);
        set(&mut user.listening_from, self.listening_from);
        set(&mut user.image, self.image);
    }
}

impl From<&User> for UserPatch {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            gender: user.gender.clone(),
            date_of_birth: user.date_of_birth.clone(),
            role: user.role.clone(),
            city: user.city.clone(),
            address: user.address.clone(),
            listening_from: user.listening_from.clone(),
            image: user.image.clone(),
        }
    }
}

/// New user creation payload
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_num: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listening_from: Option<String>,
    /// Profile image; switches the request to multipart
    #[serde(skip)]
    pub image: Option<FileUpload>,
}

/// User update payload
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_num: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listening_from: Option<String>,
    /// `Some(None)` restores a soft-deleted user, `Some(Some(ts))` soft-deletes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Option<String>>,
    /// New profile image; switches the request to multipart
    #[serde(skip)]
    pub image: Option<FileUpload>,
}

/// Query parameters for user listing
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub page: Option<u64>,
    /// Page size
    pub show: Option<u64>,
    pub search: Option<String>,
    pub role: Option<String>,
    /// "1" for male, "2" for female
    pub gender: Option<String>,
    pub city: Option<String>,
    /// "active" or "deleted"
    pub deleted_at: Option<String>,
}

impl UserQuery {
    /// Query string pairs for the set fields
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(show) = self.show {
            query.push(("show", show.to_string()));
        }
        let text = [
            ("search", &self.search),
            ("role", &self.role),
            ("gender", &self.gender),
            ("city", &self.city),
            ("deleted_at", &self.deleted_at),
        ];
        for (key, value) in text {
            if let Some(value) = value {
                query.push((key, value.clone()));
            }
        }
        query
    }
}
