//! Vault configuration

use crate::dialect::Dialect;
use crate::error::VaultError;

const DEFAULT_CONTEXT_KEY_COLUMN: &str = "context_key";
const DEFAULT_ELEMENT_KEY_COLUMN: &str = "element_key";
const DEFAULT_VALUE_COLUMN: &str = "value";

/// Immutable description of the backing table: dialect, table name, and the
/// three column names. Validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    dialect: Dialect,
    table_name: String,
    context_key_column: String,
    element_key_column: String,
    value_column: String,
}

impl VaultConfig {
    /// Configuration with the conventional column names
    /// (`context_key`, `element_key`, `value`).
    pub fn new(dialect: Dialect, table_name: impl Into<String>) -> Result<Self, VaultError> {
        Self::with_columns(
            dialect,
            table_name,
            DEFAULT_CONTEXT_KEY_COLUMN,
            DEFAULT_ELEMENT_KEY_COLUMN,
            DEFAULT_VALUE_COLUMN,
        )
    }

    /// Configuration with explicit column names. Every name must be
    /// non-empty; an empty one is a [`VaultError::Configuration`] right here,
    /// not a deferred failure on first use.
    pub fn with_columns(
        dialect: Dialect,
        table_name: impl Into<String>,
        context_key_column: impl Into<String>,
        element_key_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Result<Self, VaultError> {
        Ok(Self {
            dialect,
            table_name: non_empty("table_name", table_name.into())?,
            context_key_column: non_empty("context_key_column", context_key_column.into())?,
            element_key_column: non_empty("element_key_column", element_key_column.into())?,
            value_column: non_empty("value_column", value_column.into())?,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn context_key_column(&self) -> &str {
        &self.context_key_column
    }

    pub fn element_key_column(&self) -> &str {
        &self.element_key_column
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }
}

fn non_empty(field: &str, value: String) -> Result<String, VaultError> {
    if value.is_empty() {
        return Err(VaultError::Configuration(format!(
            "{field} must not be empty"
        )));
    }
    Ok(value)
}
