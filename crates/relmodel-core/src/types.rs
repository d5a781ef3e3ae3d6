//! Semantic column types.
//!
//! `ColumnType` is the logical type attached to every resolved column. It is
//! deliberately database-agnostic: dialect-specific spellings are produced by
//! `sql_name()` and, where a logical type has no fixed spelling, by the
//! `Dialect` mapping.

use serde::{Deserialize, Serialize};

/// Logical SQL type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Boolean value.
    Boolean,
    /// 16-bit integer.
    SmallInt,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInt,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// Fixed-point decimal with precision (total digits) and scale.
    Decimal { precision: u8, scale: u8 },
    /// Variable-length text without a declared limit.
    Text,
    /// Variable-length text with a length limit.
    Varchar,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    Timestamp,
    /// UUID value.
    Uuid,
    /// JSON document.
    Json,
    /// Raw bytes.
    Blob,
    /// Enumerated value stored as text.
    Enum,
}

impl ColumnType {
    /// Base SQL spelling of this type, without any length applied.
    ///
    /// Callers that carry a length (`Varchar`) append it themselves; the
    /// resolved column, not the type, owns the length.
    #[must_use]
    pub fn sql_name(&self) -> String {
        match self {
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Decimal { precision, scale } => {
                format!("DECIMAL({}, {})", precision, scale)
            }
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Varchar => "VARCHAR".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Blob => "BLOB".to_string(),
            ColumnType::Enum => "TEXT".to_string(),
        }
    }

    /// Whether this type carries a user-declared length.
    #[must_use]
    pub const fn has_length(&self) -> bool {
        matches!(self, ColumnType::Varchar)
    }
}

/// Value generation strategy for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Generated {
    /// No generation; values are supplied by the application.
    #[default]
    None,
    /// Database-assigned incrementing integer.
    Increment,
    /// Generated UUID.
    Uuid,
}

impl Generated {
    /// Whether any generation strategy is active.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        !matches!(self, Generated::None)
    }
}

/// Referential action for foreign key constraints (ON DELETE / ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferentialAction {
    /// No action - raise error if any references exist.
    #[default]
    NoAction,
    /// Restrict - same as NO ACTION (alias for compatibility).
    Restrict,
    /// Cascade - automatically delete/update referencing rows.
    Cascade,
    /// Set null - set referencing columns to NULL.
    SetNull,
    /// Set default - set referencing columns to their default values.
    SetDefault,
}

impl ReferentialAction {
    /// Get the SQL representation of this action.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}
