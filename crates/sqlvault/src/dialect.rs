//! SQL dialect selection

use serde::{Deserialize, Serialize};

/// The family of database server a vault talks to.
///
/// The dialect decides only two things: the column type used for the value
/// column in the generated DDL, and the bind-placeholder style of the
/// parameterized statements. All other SQL is backend-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Postgres,
    SqlServer,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Column type for the value column in `CREATE TABLE`.
    pub fn value_column_type(self) -> &'static str {
        match self {
            Dialect::SqlServer => "NVARCHAR(MAX)",
            Dialect::Postgres | Dialect::MySql | Dialect::Sqlite => "TEXT",
        }
    }

    /// Bind placeholder for the 1-based `position`.
    ///
    /// The Any driver hands statements to the underlying backend verbatim,
    /// so Postgres needs `$n` while the others take `?`.
    pub fn placeholder(self, position: usize) -> String {
        match self {
            Dialect::Postgres => format!("${position}"),
            Dialect::SqlServer | Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_column_type_is_wide_text_only_for_sql_server() {
        assert_eq!(Dialect::SqlServer.value_column_type(), "NVARCHAR(MAX)");
        assert_eq!(Dialect::Postgres.value_column_type(), "TEXT");
        assert_eq!(Dialect::MySql.value_column_type(), "TEXT");
        assert_eq!(Dialect::Sqlite.value_column_type(), "TEXT");
    }

    #[test]
    fn postgres_uses_numbered_placeholders() {
        assert_eq!(Dialect::Postgres.placeholder(1), "$1");
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
        assert_eq!(Dialect::Sqlite.placeholder(1), "?");
        assert_eq!(Dialect::MySql.placeholder(2), "?");
    }
}
