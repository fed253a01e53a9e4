//! API client bundle shared by callers

use common::config::ClientConfig;
use common::error::ClientResult;

use crate::repositories::{
    AuthRepository, CourseRepository, CourseTypeRepository, UserRepository,
};
use crate::session::SessionContext;
use crate::transport::HttpClient;

/// All repositories, bound to one transport and session
#[derive(Clone, Debug)]
pub struct ApiClient {
    pub http: HttpClient,
    pub auth: AuthRepository,
    pub users: UserRepository,
    pub courses: CourseRepository,
    pub course_types: CourseTypeRepository,
}

impl ApiClient {
    /// Create the transport and every repository for a session
    pub fn new(config: &ClientConfig, session: SessionContext) -> ClientResult<Self> {
        let http = HttpClient::new(config, session)?;
        Ok(Self {
            auth: AuthRepository::new(http.clone()),
            users: UserRepository::new(http.clone()),
            courses: CourseRepository::new(http.clone()),
            course_types: CourseTypeRepository::new(http.clone()),
            http,
        })
    }

    /// Session the transport reads its token from
    pub fn session(&self) -> &SessionContext {
        self.http.session()
    }
}
