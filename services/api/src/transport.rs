//! HTTP transport for the admin API
//!
//! Every request carries the session's bearer token when one is held. Error
//! responses are classified once for side effects (forced logout on 401,
//! logging for 403/500 and connectivity failures) and then returned to the
//! caller unchanged.

use std::fmt;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use common::config::ClientConfig;
use common::error::{ClientError, ClientResult, FieldErrors};

use crate::models::FileUpload;
use crate::session::SessionContext;

const APPLICATION_JSON: &str = "application/json";

/// Form field the backend reads to route a POST as another method
pub const METHOD_OVERRIDE_FIELD: &str = "_method";

/// Body of an outgoing request
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(FormPayload),
}

impl RequestBody {
    /// JSON body from any serializable payload
    pub fn json<T: Serialize>(payload: &T) -> ClientResult<Self> {
        serde_json::to_value(payload)
            .map(RequestBody::Json)
            .map_err(|e| ClientError::InvalidRequest(format!("Failed to encode body: {}", e)))
    }

    /// Whether the body is sent as multipart form data
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

/// Multipart form: text fields plus file parts, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
    files: Vec<(String, FileUpload)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form holding the top-level fields of a serializable payload.
    /// Strings are sent as is, null as an empty string and everything else
    /// in its JSON form.
    pub fn from_serializable<T: Serialize>(payload: &T) -> ClientResult<Self> {
        let value = serde_json::to_value(payload)
            .map_err(|e| ClientError::InvalidRequest(format!("Failed to encode form: {}", e)))?;
        let Value::Object(map) = value else {
            return Err(ClientError::InvalidRequest(
                "Form payload must be an object".to_string(),
            ));
        };

        let mut form = Self::new();
        for (name, value) in map {
            let text = match value {
                Value::String(text) => text,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            form = form.text(name, text);
        }
        Ok(form)
    }

    /// Append a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Append a file part
    pub fn file(mut self, name: impl Into<String>, upload: FileUpload) -> Self {
        self.files.push((name.into(), upload));
        self
    }

    /// Ask the backend to treat this POST as `method`
    pub fn with_method_override(self, method: &str) -> Self {
        self.text(METHOD_OVERRIDE_FIELD, method)
    }

    /// Value of the first text field named `name`
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self) -> &[(String, FileUpload)] {
        &self.files
    }

    fn into_form(self) -> ClientResult<Form> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        for (name, upload) in self.files {
            let part = Part::bytes(upload.bytes)
                .file_name(upload.file_name)
                .mime_str(&upload.mime)
                .map_err(|e| ClientError::InvalidRequest(format!("Invalid MIME type: {}", e)))?;
            form = form.part(name, part);
        }
        Ok(form)
    }
}

/// Headers for an outgoing request: `Accept`, the bearer token when
/// present, and a JSON content type unless the body is multipart (the
/// transport then sets its own boundary)
pub fn prepare_headers(token: Option<&str>, body: &RequestBody) -> ClientResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid auth token: {}", e)))?;
        headers.insert(AUTHORIZATION, value);
    }

    if !body.is_multipart() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    }

    Ok(headers)
}

/// Parse a response body: empty is null, non-JSON text is kept as a string
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Field messages from an `errors` object, in server order
pub fn field_errors(body: &Value) -> FieldErrors {
    let Some(errors) = body.get("errors").and_then(Value::as_object) else {
        return Vec::new();
    };

    errors
        .iter()
        .map(|(field, messages)| {
            let messages = match messages {
                Value::Array(items) => items.iter().map(message_text).collect(),
                other => vec![message_text(other)],
            };
            (field.clone(), messages)
        })
        .collect()
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Map an error status and its parsed body to a client error
pub fn error_from_status(status: u16, body: Value) -> ClientError {
    if status == StatusCode::UNPROCESSABLE_ENTITY.as_u16() {
        return ClientError::Validation {
            message: body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            errors: field_errors(&body),
        };
    }
    ClientError::Http { status, body }
}

/// How the transport reacts to a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// 401: the session is no longer accepted
    Unauthorized,
    /// 403
    Forbidden,
    /// 500
    ServerError,
    /// No response at all
    Connectivity,
    /// Anything else, passed through silently
    Other,
}

impl FailureClass {
    pub fn of(error: &ClientError) -> Self {
        if error.is_connectivity() {
            return FailureClass::Connectivity;
        }
        match error.status() {
            Some(401) => FailureClass::Unauthorized,
            Some(403) => FailureClass::Forbidden,
            Some(500) => FailureClass::ServerError,
            _ => FailureClass::Other,
        }
    }
}

/// HTTP client bound to a session context
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}

impl HttpClient {
    /// Create a client for the configured API
    pub fn new(config: &ClientConfig, session: SessionContext) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                ClientError::InvalidRequest(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            session,
        })
    }

    /// Session this client reads its token from
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Send a request and return the parsed response body
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        query: &[(&str, String)],
    ) -> ClientResult<Value> {
        let result = self.send(method.clone(), path, body, query).await;
        if let Err(e) = &result {
            self.observe_failure(&method, path, e);
        }
        result
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> ClientResult<Value> {
        self.request(Method::GET, path, RequestBody::Empty, query).await
    }

    pub async fn post(&self, path: &str, body: RequestBody) -> ClientResult<Value> {
        self.request(Method::POST, path, body, &[]).await
    }

    pub async fn put(&self, path: &str, body: RequestBody) -> ClientResult<Value> {
        self.request(Method::PUT, path, body, &[]).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.request(Method::DELETE, path, RequestBody::Empty, &[]).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        query: &[(&str, String)],
    ) -> ClientResult<Value> {
        let token = self.session.token();
        let headers = prepare_headers(token.as_deref(), &body)?;

        let mut builder = self
            .client
            .request(method.clone(), self.url(path))
            .headers(headers);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(&value).map_err(|e| {
                    ClientError::InvalidRequest(format!("Failed to encode body: {}", e))
                })?;
                builder.body(bytes)
            }
            RequestBody::Multipart(form) => builder.multipart(form.into_form()?),
        };

        debug!("{} {}", method, path);
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        let body = parse_body(&text);

        if status.is_success() {
            Ok(body)
        } else {
            debug!("{} {} failed with status {}", method, path, status);
            Err(error_from_status(status.as_u16(), body))
        }
    }

    /// React once to a failed request
    fn observe_failure(&self, method: &Method, path: &str, error: &ClientError) {
        match FailureClass::of(error) {
            FailureClass::Unauthorized => {
                if self.session.token().is_some() && !self.session.is_on_login_surface() {
                    warn!("{} {} returned 401, ending session", method, path);
                    self.session.force_logout();
                } else {
                    debug!("{} {} returned 401 without an active session", method, path);
                }
            }
            FailureClass::Forbidden => {
                error!("Access forbidden: {} {}: {}", method, path, body_of(error));
            }
            FailureClass::ServerError => {
                error!("Server error: {} {}: {}", method, path, body_of(error));
            }
            FailureClass::Connectivity => {
                error!(
                    "Network error - check that the API server is running: {}",
                    error
                );
            }
            FailureClass::Other => {}
        }
    }
}

fn body_of(error: &ClientError) -> String {
    match error {
        ClientError::Http { body, .. } => body.to_string(),
        other => other.to_string(),
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    if e.is_builder() {
        return ClientError::InvalidRequest(e.to_string());
    }
    if e.is_timeout() {
        return ClientError::Connectivity(format!("Request timed out: {}", e));
    }
    ClientError::Connectivity(e.to_string())
}
