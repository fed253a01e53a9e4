//! Client configuration
//!
//! Settings are layered from built-in defaults, an optional configuration file
//! and `ADMIN_CONSOLE_*` environment variables, in that order.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Default API base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Default request timeout in milliseconds (30 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default location of the durable session storage file
pub const DEFAULT_STORAGE_PATH: &str = ".admin-console/storage.json";

/// Configuration for the API client
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// API base URL (e.g., "http://localhost:8000/api")
    pub api_url: String,
    /// Optional API version segment appended to the base URL
    #[serde(default)]
    pub api_version: Option<String>,
    /// Overall request timeout in milliseconds
    pub timeout_ms: u64,
    /// Path of the durable storage file
    pub storage_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_version: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

impl ClientConfig {
    /// Create a new ClientConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ADMIN_CONSOLE_API_URL`: API base URL (default: "http://localhost:8000/api")
    /// - `ADMIN_CONSOLE_API_VERSION`: version segment, e.g. "v1" (default: none)
    /// - `ADMIN_CONSOLE_TIMEOUT_MS`: request timeout (default: 30000)
    /// - `ADMIN_CONSOLE_STORAGE_PATH`: storage file (default: ".admin-console/storage.json")
    pub fn from_env() -> ConfigResult<Self> {
        Self::load(None)
    }

    /// Load configuration from an optional file, then the environment
    pub fn load(file: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("timeout_ms", DEFAULT_TIMEOUT_MS as i64)?
            .set_default("storage_path", DEFAULT_STORAGE_PATH)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config: ClientConfig = builder
            .add_source(Environment::with_prefix("ADMIN_CONSOLE"))
            .build()?
            .try_deserialize()?;

        config.validate()
    }

    fn validate(mut self) -> ConfigResult<Self> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_url must not be empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self
            .api_version
            .as_deref()
            .is_some_and(|version| version.trim().is_empty())
        {
            self.api_version = None;
        }
        Ok(self)
    }

    /// Full API URL: base URL plus the version segment when one is set
    pub fn base_url(&self) -> String {
        let base = self.api_url.trim_end_matches('/');
        match self.api_version.as_deref() {
            Some(version) => format!("{}/{}", base, version.trim_matches('/')),
            None => base.to_string(),
        }
    }

    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
