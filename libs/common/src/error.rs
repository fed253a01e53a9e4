//! Custom error types for the common library
//!
//! This module defines the failure taxonomy shared by the transport, the
//! response normalizers and the session layer, plus storage and
//! configuration errors.

use serde_json::Value;
use thiserror::Error;

/// Field-level validation messages, in the order the server reported them
pub type FieldErrors = Vec<(String, Vec<String>)>;

/// Custom error type for API client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// No response was received (connection refused, timeout, DNS, ...)
    #[error("Connectivity failure: {0}")]
    Connectivity(String),

    /// The server responded with an error status
    #[error("HTTP error {status}")]
    Http {
        /// Response status code
        status: u16,
        /// Response body, parsed as JSON when possible
        body: Value,
    },

    /// 422-class failure carrying field-level messages
    #[error("Validation failure: {message}")]
    Validation {
        /// Summary message, possibly empty
        message: String,
        /// Field messages
        errors: FieldErrors,
    },

    /// Client-side checks failed; nothing was sent
    #[error("Rejected before sending: {message}")]
    Rejected {
        /// First field message
        message: String,
        /// Field messages
        errors: FieldErrors,
    },

    /// A response shape no normalizer recognizes
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The request was rejected before it was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Durable storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// Status code of the response that caused this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Validation { .. } => Some(422),
            _ => None,
        }
    }

    /// Whether the failure happened without any response from the server
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ClientError::Connectivity(_))
    }

    /// Field messages of a server 422 or of a local rejection
    pub fn field_errors(&self) -> &[(String, Vec<String>)] {
        match self {
            ClientError::Validation { errors, .. } | ClientError::Rejected { errors, .. } => {
                errors.as_slice()
            }
            _ => &[],
        }
    }

    /// Build a local rejection from a single field message
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        ClientError::Rejected {
            message: message.clone(),
            errors: vec![(field.to_string(), vec![message])],
        }
    }
}

/// Custom error type for durable storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error reading or writing the backing file
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file does not hold a JSON object of strings
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Custom error type for configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error raised by the configuration loader
    #[error("Configuration load error: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Type alias for Result with ClientError
pub type ClientResult<T> = Result<T, ClientError>;

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for Result with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_local_rejection_has_no_status() {
        let rejected = ClientError::field("email", "Email is required");
        assert_eq!(rejected.status(), None);
        assert_eq!(
            rejected.field_errors(),
            &[("email".to_string(), vec!["Email is required".to_string()])]
        );

        let server = ClientError::Validation {
            message: "Taken".to_string(),
            errors: vec![("email".to_string(), vec!["Taken".to_string()])],
        };
        assert_eq!(server.status(), Some(422));
        assert_eq!(server.field_errors().len(), 1);

        let http = ClientError::Http {
            status: 500,
            body: json!({}),
        };
        assert!(http.field_errors().is_empty());
    }
}
