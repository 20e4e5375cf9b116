//! SQL operations against the backing table
//!
//! Stateless: every operation opens a fresh connection through the
//! [`Connector`], runs a single statement (or drains a single cursor), and
//! releases the connection on every exit path (explicitly closed on
//! success, dropped on error). No pooling, no retries, no transactions
//! spanning operations.

use std::sync::Arc;

use futures::TryStreamExt;
use sqlx::{Connection, Row};
use tracing::{debug, info};

use crate::config::VaultConfig;
use crate::connector::Connector;
use crate::error::VaultError;

pub(crate) struct SqlGateway {
    connector: Arc<dyn Connector>,
    config: VaultConfig,
}

impl SqlGateway {
    pub(crate) fn new(connector: Arc<dyn Connector>, config: VaultConfig) -> Self {
        Self { connector, config }
    }

    pub(crate) fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub(crate) async fn create_table_if_not_exists(&self) -> Result<(), VaultError> {
        let mut conn = self.connector.connect().await?;
        sqlx::query(&self.create_table_sql())
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        info!(table = %self.config.table_name(), "created table if missing");
        Ok(())
    }

    /// Idempotent: dropping an absent table is not an error.
    pub(crate) async fn drop_table_if_exists(&self) -> Result<(), VaultError> {
        let mut conn = self.connector.connect().await?;
        sqlx::query(&self.drop_table_sql())
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        info!(table = %self.config.table_name(), "dropped table if present");
        Ok(())
    }

    /// Drain every row as a forward-only cursor, handing each
    /// `(context_key, element_key, value)` triple to `per_row`. Row order is
    /// whatever the table yields. Returns the number of rows seen.
    pub(crate) async fn select_all<F>(&self, mut per_row: F) -> Result<u64, VaultError>
    where
        F: FnMut(i64, i64, String),
    {
        let sql = self.select_all_sql();
        let mut conn = self.connector.connect().await?;
        let mut count = 0u64;
        {
            let mut rows = sqlx::query(&sql).fetch(&mut conn);
            while let Some(row) = rows.try_next().await? {
                let context_key: i64 = row.try_get(self.config.context_key_column())?;
                let element_key: i64 = row.try_get(self.config.element_key_column())?;
                let value: String = row.try_get(self.config.value_column())?;
                per_row(context_key, element_key, value);
                count += 1;
            }
        }
        conn.close().await?;
        Ok(count)
    }

    /// Equality probe on the key pair. The row itself is not consumed for
    /// data, only its presence.
    pub(crate) async fn row_exists(
        &self,
        context_key: i64,
        element_key: i64,
    ) -> Result<bool, VaultError> {
        let mut conn = self.connector.connect().await?;
        let found = sqlx::query(&self.select_one_sql())
            .bind(context_key)
            .bind(element_key)
            .fetch_optional(&mut conn)
            .await?;
        conn.close().await?;
        Ok(found.is_some())
    }

    pub(crate) async fn insert(
        &self,
        context_key: i64,
        element_key: i64,
        value: &str,
    ) -> Result<(), VaultError> {
        debug!(context_key, element_key, "inserting row");
        let mut conn = self.connector.connect().await?;
        sqlx::query(&self.insert_sql())
            .bind(context_key)
            .bind(element_key)
            .bind(value)
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        Ok(())
    }

    /// Matches the full key pair in the WHERE clause and re-sets all three
    /// columns.
    pub(crate) async fn update(
        &self,
        context_key: i64,
        element_key: i64,
        value: &str,
    ) -> Result<(), VaultError> {
        debug!(context_key, element_key, "updating row");
        let mut conn = self.connector.connect().await?;
        sqlx::query(&self.update_sql())
            .bind(context_key)
            .bind(element_key)
            .bind(value)
            .bind(context_key)
            .bind(element_key)
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        Ok(())
    }

    fn create_table_sql(&self) -> String {
        let c = &self.config;
        format!(
            "CREATE TABLE IF NOT EXISTS {table}({ck} INTEGER, {ek} INTEGER, {v} {v_type}, PRIMARY KEY({ck}, {ek}))",
            table = c.table_name(),
            ck = c.context_key_column(),
            ek = c.element_key_column(),
            v = c.value_column(),
            v_type = c.dialect().value_column_type(),
        )
    }

    fn drop_table_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.config.table_name())
    }

    fn select_all_sql(&self) -> String {
        let c = &self.config;
        format!(
            "SELECT {ck}, {ek}, {v} FROM {table}",
            ck = c.context_key_column(),
            ek = c.element_key_column(),
            v = c.value_column(),
            table = c.table_name(),
        )
    }

    fn select_one_sql(&self) -> String {
        let c = &self.config;
        let d = c.dialect();
        format!(
            "SELECT 1 FROM {table} WHERE {ck} = {p1} AND {ek} = {p2}",
            table = c.table_name(),
            ck = c.context_key_column(),
            ek = c.element_key_column(),
            p1 = d.placeholder(1),
            p2 = d.placeholder(2),
        )
    }

    fn insert_sql(&self) -> String {
        let c = &self.config;
        let d = c.dialect();
        format!(
            "INSERT INTO {table}({ck}, {ek}, {v}) VALUES({p1}, {p2}, {p3})",
            table = c.table_name(),
            ck = c.context_key_column(),
            ek = c.element_key_column(),
            v = c.value_column(),
            p1 = d.placeholder(1),
            p2 = d.placeholder(2),
            p3 = d.placeholder(3),
        )
    }

    fn update_sql(&self) -> String {
        let c = &self.config;
        let d = c.dialect();
        format!(
            "UPDATE {table} SET {ck} = {p1}, {ek} = {p2}, {v} = {p3} WHERE {ck} = {p4} AND {ek} = {p5}",
            table = c.table_name(),
            ck = c.context_key_column(),
            ek = c.element_key_column(),
            v = c.value_column(),
            p1 = d.placeholder(1),
            p2 = d.placeholder(2),
            p3 = d.placeholder(3),
            p4 = d.placeholder(4),
            p5 = d.placeholder(5),
        )
    }
}
