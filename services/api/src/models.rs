//! Domain models and the normalizers that build them from raw backend
//! payloads

pub mod auth;
pub mod course;
pub mod course_type;
pub mod pagination;
pub mod payload;
pub mod upload;
pub mod user;

// Re-export for convenience
pub use auth::{LoginCredentials, LoginResponse};
pub use course::{Course, CourseOwner, CourseQuery, CourseUpdate, NewCourse};
pub use course_type::{CourseType, CourseTypeQuery, CourseTypeUpdate, NewCourseType};
pub use pagination::{PageRequest, Paginated};
pub use payload::Shape;
pub use upload::FileUpload;
pub use user::{ImageRef, NewUser, User, UserPatch, UserQuery, UserUpdate};
