//! Admin API client
//!
//! Transport, session context, response normalizers and resource
//! repositories for the admin console backend.
//!
//! ```rust,no_run
//! use api::ApiClient;
//! use api::models::LoginCredentials;
//! use api::session::SessionContext;
//! use common::config::ClientConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let client = ApiClient::new(&config, SessionContext::in_memory())?;
//! let login = client
//!     .auth
//!     .login(&LoginCredentials::new("admin@example.com", "secret"))
//!     .await?;
//! println!("Signed in as {}", login.user.display_name());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod models;
pub mod repositories;
pub mod session;
pub mod transport;
pub mod validation;

pub use client::ApiClient;
pub use session::{SessionContext, SessionState};
pub use transport::{FormPayload, HttpClient, RequestBody};
