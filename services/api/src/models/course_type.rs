//! Course type model and normalization

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use common::error::{ClientError, ClientResult};

use super::payload::{NumberOrString, Shape, decode};
use super::upload::FileUpload;

/// Course type entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseType {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCourseType {
    id: Option<NumberOrString>,
    name: Option<String>,
    icon: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl CourseType {
    /// Normalize one element of a course-type listing
    pub fn from_value(raw: &Value) -> ClientResult<Self> {
        let item: RawCourseType = decode(raw, "course type")?;
        let id = item
            .id
            .as_ref()
            .and_then(NumberOrString::as_i64)
            .ok_or_else(|| {
                ClientError::MalformedResponse("Course type payload has no id".to_string())
            })?;
        Ok(Self::from_raw(item, id))
    }

    /// Normalize a single course-type lookup, whatever shape the backend
    /// wrapped it in. `requested_id` fills in a missing id.
    pub fn from_lookup(raw: &Value, requested_id: i64) -> ClientResult<Self> {
        let candidate = Shape::sniff(raw, "id").into_inner();

        let identified = candidate.is_object()
            && ["id", "name"]
                .iter()
                .any(|key| candidate.get(key).is_some());
        if !identified {
            error!("Invalid course type response structure: {}", raw);
            return Err(ClientError::MalformedResponse(
                "Invalid response structure from server".to_string(),
            ));
        }

        let item: RawCourseType = decode(candidate, "course type")?;
        let id = item
            .id
            .as_ref()
            .and_then(NumberOrString::as_i64)
            .unwrap_or(requested_id);
        Ok(Self::from_raw(item, id))
    }

    fn from_raw(item: RawCourseType, id: i64) -> Self {
        CourseType {
            id,
            name: item.name.unwrap_or_default(),
            icon: item.icon,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// New course type creation payload
#[derive(Debug, Clone, Default)]
pub struct NewCourseType {
    pub name: String,
    pub icon: Option<FileUpload>,
}

/// Course type update payload; the backend requires the name on every update
#[derive(Debug, Clone, Default)]
pub struct CourseTypeUpdate {
    pub name: Option<String>,
    /// Only sent when a new icon was chosen
    pub icon: Option<FileUpload>,
}

/// Query parameters for course type listing
#[derive(Debug, Clone, Default)]
pub struct CourseTypeQuery {
    pub page: Option<u64>,
    pub show: Option<u64>,
    pub search: Option<String>,
}

impl CourseTypeQuery {
    /// Query string pairs for the set fields
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(show) = self.show {
            query.push(("show", show.to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        query
    }
}
