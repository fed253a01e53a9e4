//! Course type endpoints
//!
//! Course types carry an icon upload, so create and update always go out as
//! multipart forms.

use tracing::{debug, info};

use common::error::{ClientError, ClientResult};

use crate::models::payload::unwrap_envelope;
use crate::models::{
    CourseType, CourseTypeQuery, CourseTypeUpdate, NewCourseType, PageRequest, Paginated,
};
use crate::transport::{FormPayload, HttpClient, RequestBody};
use crate::validation::validate_course_type_name;

const COURSE_TYPES_PATH: &str = "/admin/type-courses";

/// Course type repository
#[derive(Clone, Debug)]
pub struct CourseTypeRepository {
    http: HttpClient,
}

impl CourseTypeRepository {
    /// Create a new course type repository
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// List course types matching the query
    pub async fn list(&self, query: &CourseTypeQuery) -> ClientResult<Paginated<CourseType>> {
        let raw = self.http.get(COURSE_TYPES_PATH, &query.to_query()).await?;
        let request = PageRequest {
            page: query.page,
            per_page: query.show,
        };
        Paginated::from_value(&raw, request, CourseType::from_value)
    }

    /// Get a course type by ID, whatever shape the backend answers with
    pub async fn get(&self, id: i64) -> ClientResult<CourseType> {
        let raw = self.http.get(&course_type_path(id), &[]).await?;
        CourseType::from_lookup(&raw, id)
    }

    /// Create a course type
    pub async fn create(&self, course_type: &NewCourseType) -> ClientResult<CourseType> {
        validate_course_type_name(&course_type.name)?;

        let mut form = FormPayload::new().text("name", course_type.name.as_str());
        if let Some(icon) = &course_type.icon {
            form = form.file("icon", icon.clone());
        }

        let raw = self
            .http
            .post(COURSE_TYPES_PATH, RequestBody::Multipart(form))
            .await?;
        let created = CourseType::from_value(unwrap_envelope(&raw))?;
        info!("Created course type: {}", created.id);
        Ok(created)
    }

    /// Update a course type. The name is required on every update; the icon
    /// is only sent when a new one was chosen.
    pub async fn update(&self, id: i64, update: &CourseTypeUpdate) -> ClientResult<CourseType> {
        let name = update.name.as_deref().ok_or_else(|| {
            ClientError::InvalidRequest("Name is required for update".to_string())
        })?;
        validate_course_type_name(name)?;

        let mut form = FormPayload::new().text("name", name);
        if let Some(icon) = &update.icon {
            form = form.file("icon", icon.clone());
        }
        let form = form.with_method_override("PUT");
        debug!(
            "Updating course type {} with fields {:?} and {} file(s)",
            id,
            form.fields(),
            form.files().len()
        );

        let raw = self
            .http
            .post(&course_type_path(id), RequestBody::Multipart(form))
            .await?;
        CourseType::from_lookup(&raw, id)
    }

    /// Delete a course type
    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.http.delete(&course_type_path(id)).await?;
        info!("Deleted course type: {}", id);
        Ok(())
    }
}

fn course_type_path(id: i64) -> String {
    format!("{}/{}", COURSE_TYPES_PATH, id)
}
