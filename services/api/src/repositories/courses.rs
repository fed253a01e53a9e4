//! Course endpoints

use tracing::info;

use common::error::ClientResult;

use crate::models::payload::unwrap_envelope;
use crate::models::{Course, CourseQuery, CourseUpdate, NewCourse, PageRequest, Paginated};
use crate::transport::{HttpClient, RequestBody};
use crate::validation::{validate_course_update, validate_new_course};

const COURSES_PATH: &str = "/courses";

/// Course repository
#[derive(Clone, Debug)]
pub struct CourseRepository {
    http: HttpClient,
}

impl CourseRepository {
    /// Create a new course repository
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// List courses matching the query
    pub async fn list(&self, query: &CourseQuery) -> ClientResult<Paginated<Course>> {
        let raw = self.http.get(COURSES_PATH, &query.to_query()).await?;
        let request = PageRequest {
            page: query.page,
            per_page: query.per_page,
        };
        Paginated::from_value(&raw, request, Course::from_value)
    }

    /// Get a course by ID
    pub async fn get(&self, id: i64) -> ClientResult<Course> {
        let raw = self.http.get(&course_path(id), &[]).await?;
        Course::from_value(unwrap_envelope(&raw))
    }

    /// Create a new course
    pub async fn create(&self, course: &NewCourse) -> ClientResult<Course> {
        validate_new_course(course)?;
        let raw = self
            .http
            .post(COURSES_PATH, RequestBody::json(course)?)
            .await?;
        let created = Course::from_value(unwrap_envelope(&raw))?;
        info!("Created course: {}", created.id);
        Ok(created)
    }

    /// Update a course
    pub async fn update(&self, id: i64, update: &CourseUpdate) -> ClientResult<Course> {
        validate_course_update(update)?;
        let raw = self
            .http
            .put(&course_path(id), RequestBody::json(update)?)
            .await?;
        Course::from_value(unwrap_envelope(&raw))
    }

    /// Delete a course
    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.http.delete(&course_path(id)).await?;
        info!("Deleted course: {}", id);
        Ok(())
    }
}

fn course_path(id: i64) -> String {
    format!("{}/{}", COURSES_PATH, id)
}
