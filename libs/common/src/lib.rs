//! Common library for the admin console client
//!
//! This crate provides shared functionality used across the client crates,
//! including the error taxonomy, configuration loading and durable
//! key-value storage.
//!
//! ```rust,no_run
//! use common::config::ClientConfig;
//! use common::storage::{FileStore, KeyValueStore, THEME_KEY};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()?;
//!     let store = FileStore::new(&config.storage_path);
//!     store.set(THEME_KEY, "dark")?;
//!     println!("Theme: {:?}", store.get(THEME_KEY)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod storage;
