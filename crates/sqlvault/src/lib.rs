//! # sqlvault
//!
//! Write-through SQL-backed key-value vault with an in-memory mirror:
//! - [`SqlVault`] — load a three-column table into memory once, read from
//!   memory, write every mutation through to the database
//! - [`Connector`] — connection-opening capability, one fresh connection
//!   per database operation
//! - [`VaultConfig`] / [`Dialect`] — table shape and backend family
//! - [`LoadState`] — the load-once lifecycle gating reads and writes
//!
//! ```no_run
//! use std::sync::Arc;
//! use sqlvault::{Dialect, InitOptions, SqlVault, UrlConnector, VaultConfig};
//!
//! # async fn demo() -> Result<(), sqlvault::VaultError> {
//! let config = VaultConfig::new(Dialect::Sqlite, "sql_vault")?;
//! let vault = SqlVault::new(Arc::new(UrlConnector::new("sqlite://vault.db?mode=rwc")), config);
//! vault.initialize(InitOptions::default()).await?;
//! vault.save_value(7, 3, "hello").await?;
//! assert_eq!(vault.try_get_value(7, 3).as_deref(), Some("hello"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connector;
pub mod dialect;
pub mod error;
mod gateway;
pub mod mirror;
pub mod options;
pub mod state;
pub mod vault;

pub use config::VaultConfig;
pub use connector::{Connector, UrlConnector};
pub use dialect::Dialect;
pub use error::VaultError;
pub use mirror::ContextRecord;
pub use options::InitOptions;
pub use state::LoadState;
pub use vault::{ReadOnlyVault, SqlVault};
