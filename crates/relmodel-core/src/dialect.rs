//! Dialect-specific type mappings and identifier quoting.
//!
//! The metadata pipeline is dialect-agnostic except where a synthesized
//! column has no user-declared type. Those logical mappings (currently the
//! tree-level counter of closure junctions) are queried from the active
//! dialect at synthesis time, never cached across builds.

use crate::types::ColumnType;

/// Target database dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// PostgreSQL.
    #[default]
    Postgres,
    /// MySQL / MariaDB.
    Mysql,
    /// SQLite.
    Sqlite,
}

impl Dialect {
    /// Short lowercase name of the dialect.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Concrete column type for the depth counter of a closure junction.
    #[must_use]
    pub const fn tree_level_type(&self) -> ColumnType {
        match self {
            Dialect::Postgres | Dialect::Mysql => ColumnType::Integer,
            // SQLite has a single integer affinity.
            Dialect::Sqlite => ColumnType::BigInt,
        }
    }

    /// Quote an identifier for this dialect.
    #[must_use]
    pub fn quote_identifier(&self, ident: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
            Dialect::Mysql => format!("`{}`", ident.replace('`', "``")),
        }
    }
}
