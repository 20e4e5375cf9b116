//! The vault facade

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{info, warn};

use crate::config::VaultConfig;
use crate::connector::Connector;
use crate::error::VaultError;
use crate::gateway::SqlGateway;
use crate::mirror::{ContextRecord, Mirror};
use crate::options::InitOptions;
use crate::state::{LoadState, LoadStateCell};

/// Read-only view of a vault, for consumers that must not write.
pub trait ReadOnlyVault {
    /// The value for the key pair, or [`VaultError::NotFound`] if either
    /// level of the key is absent.
    fn get_value(&self, context_key: i64, element_key: i64) -> Result<String, VaultError>;

    /// Non-erroring form of [`ReadOnlyVault::get_value`].
    fn try_get_value(&self, context_key: i64, element_key: i64) -> Option<String>;

    /// Independent copy of one context's element map, or `None` for an
    /// unknown context key.
    fn context_elements(&self, context_key: i64) -> Option<HashMap<i64, String>>;
}

/// In-process cache of a three-column key-value table.
///
/// The whole table is pulled into an in-memory mirror exactly once by
/// [`load`](SqlVault::load); reads are served from the mirror, and every
/// save writes to the database before updating the mirror, so mirror and
/// table stay consistent.
///
/// Each instance owns its own mirror and lifecycle state; hand the instance
/// (or a `&dyn ReadOnlyVault`) to whoever needs it.
pub struct SqlVault {
    gateway: SqlGateway,
    mirror: Mirror,
    state: LoadStateCell,
}

impl SqlVault {
    pub fn new(connector: Arc<dyn Connector>, config: VaultConfig) -> Self {
        Self {
            gateway: SqlGateway::new(connector, config),
            mirror: Mirror::new(),
            state: LoadStateCell::new(),
        }
    }

    pub fn config(&self) -> &VaultConfig {
        self.gateway.config()
    }

    /// Current lifecycle state. Reads through its own guard, so it is never
    /// blocked by an in-flight load's I/O.
    pub fn load_state(&self) -> LoadState {
        self.state.get()
    }

    /// Run the requested setup steps in fixed order: drop table, create
    /// table, load data. A failing step aborts the remaining ones.
    pub async fn initialize(&self, options: InitOptions) -> Result<(), VaultError> {
        if options.contains(InitOptions::DROP_TABLE_IF_EXISTS) {
            self.gateway.drop_table_if_exists().await?;
        }
        if options.contains(InitOptions::CREATE_TABLE_IF_NOT_EXISTS) {
            self.gateway.create_table_if_not_exists().await?;
        }
        if options.contains(InitOptions::LOAD_DATA) {
            self.load().await?;
        }
        Ok(())
    }

    /// Populate the mirror from the table, once.
    ///
    /// Valid only from `NotLoaded`; any other state errors immediately with
    /// no I/O. The cursor is drained row by row with no upper bound; the
    /// entire table ends up in memory. On a database failure the state
    /// becomes the terminal `DbError`, the mirror keeps whatever partial
    /// state the drain reached, and the error is re-raised; construct a
    /// fresh vault to retry.
    pub async fn load(&self) -> Result<(), VaultError> {
        self.state.begin_load()?;
        let drained = self
            .gateway
            .select_all(|context_key, element_key, value| {
                self.mirror.upsert(context_key, element_key, value);
            })
            .await;
        match drained {
            Ok(rows) => {
                self.state.complete_load();
                info!(rows, table = %self.config().table_name(), "vault loaded");
                Ok(())
            }
            Err(err) => {
                self.state.fail_load();
                warn!(table = %self.config().table_name(), error = %err, "vault load failed");
                Err(err)
            }
        }
    }

    /// Write one value through to the table, then mirror it.
    ///
    /// Requires the `Loaded` state. The existence check and the insert or
    /// update are two separate statements with no spanning transaction:
    /// two concurrent savers of the same new key pair can race into a
    /// duplicate-key insert error, and concurrent updates of one pair can
    /// lose. The vault's locks protect only the mirror and the state, not
    /// the table; the table's own primary key is the only write serializer.
    pub async fn save_value(
        &self,
        context_key: i64,
        element_key: i64,
        value: &str,
    ) -> Result<(), VaultError> {
        self.state.require_loaded()?;
        if self.gateway.row_exists(context_key, element_key).await? {
            self.gateway.update(context_key, element_key, value).await?;
        } else {
            self.gateway.insert(context_key, element_key, value).await?;
        }
        self.mirror.upsert(context_key, element_key, value.to_owned());
        Ok(())
    }

    /// Read `reader` to completion into a string, then save it.
    /// The whole content is materialized in memory; no size limit.
    pub async fn save_from_reader<R>(
        &self,
        context_key: i64,
        element_key: i64,
        mut reader: R,
    ) -> Result<(), VaultError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut value = String::new();
        reader.read_to_string(&mut value).await?;
        self.save_value(context_key, element_key, &value).await
    }

    /// Save the entire UTF-8 content of a file.
    pub async fn save_from_file(
        &self,
        context_key: i64,
        element_key: i64,
        path: impl AsRef<Path>,
    ) -> Result<(), VaultError> {
        let file = tokio::fs::File::open(path).await?;
        self.save_from_reader(context_key, element_key, file).await
    }

    pub fn get_value(&self, context_key: i64, element_key: i64) -> Result<String, VaultError> {
        self.mirror
            .get(context_key, element_key)
            .ok_or(VaultError::NotFound {
                context_key,
                element_key,
            })
    }

    pub fn try_get_value(&self, context_key: i64, element_key: i64) -> Option<String> {
        self.mirror.get(context_key, element_key)
    }

    pub fn context_elements(&self, context_key: i64) -> Option<HashMap<i64, String>> {
        self.mirror.context_elements(context_key)
    }

    /// Independent copy of the whole mirror.
    pub fn snapshot(&self) -> HashMap<i64, ContextRecord> {
        self.mirror.snapshot()
    }
}

impl ReadOnlyVault for SqlVault {
    fn get_value(&self, context_key: i64, element_key: i64) -> Result<String, VaultError> {
        SqlVault::get_value(self, context_key, element_key)
    }

    fn try_get_value(&self, context_key: i64, element_key: i64) -> Option<String> {
        SqlVault::try_get_value(self, context_key, element_key)
    }

    fn context_elements(&self, context_key: i64) -> Option<HashMap<i64, String>> {
        SqlVault::context_elements(self, context_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use async_trait::async_trait;
    use sqlx::AnyConnection;

    /// Connector whose every connect attempt fails, for exercising the
    /// state machine without a database.
    struct BrokenConnector;

    #[async_trait]
    impl Connector for BrokenConnector {
        async fn connect(&self) -> Result<AnyConnection, sqlx::Error> {
            Err(sqlx::Error::PoolClosed)
        }
    }

    /// Connector that panics if touched, proving an operation performed no
    /// I/O before failing.
    struct UnreachableConnector;

    #[async_trait]
    impl Connector for UnreachableConnector {
        async fn connect(&self) -> Result<AnyConnection, sqlx::Error> {
            panic!("operation was expected to fail before any I/O");
        }
    }

    fn vault(connector: Arc<dyn Connector>) -> SqlVault {
        SqlVault::new(
            connector,
            VaultConfig::new(Dialect::Sqlite, "sql_vault").unwrap(),
        )
    }

    #[tokio::test]
    async fn save_before_load_performs_no_io() {
        let vault = vault(Arc::new(UnreachableConnector));
        let err = vault.save_value(1, 1, "v").await.unwrap_err();
        assert!(matches!(
            err,
            VaultError::InvalidState {
                expected: LoadState::Loaded,
                actual: LoadState::NotLoaded,
            }
        ));
        assert_eq!(vault.try_get_value(1, 1), None);
    }

    #[tokio::test]
    async fn failed_load_is_terminal_and_gates_saves() {
        let vault = vault(Arc::new(BrokenConnector));
        let err = vault.load().await.unwrap_err();
        assert!(matches!(err, VaultError::Database(_)));
        assert_eq!(vault.load_state(), LoadState::DbError);

        // The state gate takes precedence over any would-be database error.
        let err = vault.save_value(1, 1, "v").await.unwrap_err();
        assert!(matches!(
            err,
            VaultError::InvalidState {
                actual: LoadState::DbError,
                ..
            }
        ));

        // And the vault cannot be loaded again.
        assert!(matches!(
            vault.load().await.unwrap_err(),
            VaultError::InvalidState { .. }
        ));
    }

    #[tokio::test]
    async fn reads_on_an_unloaded_vault_miss_without_erroring() {
        let vault = vault(Arc::new(UnreachableConnector));
        assert_eq!(vault.try_get_value(7, 99), None);
        assert!(matches!(
            vault.get_value(7, 99),
            Err(VaultError::NotFound {
                context_key: 7,
                element_key: 99,
            })
        ));
        assert!(vault.context_elements(7).is_none());
        assert!(vault.snapshot().is_empty());
    }
}
