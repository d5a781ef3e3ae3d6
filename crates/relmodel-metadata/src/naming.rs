//! Deterministic naming of physical schema objects.
//!
//! Every synthesized name is a pure function of the declarations, so
//! repeated builds over the same input produce byte-identical names. The
//! validator rejects collisions; nothing here truncates silently.

use convert_case::{Case, Casing};

use crate::graph::ClosureSide;

/// Physical table name derived from a logical entity name.
#[must_use]
pub fn table_name(logical: &str) -> String {
    logical.to_case(Case::Snake)
}

/// Physical column name derived from a property name.
#[must_use]
pub fn column_name(property: &str) -> String {
    property.to_case(Case::Snake)
}

/// Name of a synthesized join column of an owning relation.
#[must_use]
pub fn join_column_name(relation_property: &str, referenced_column: &str) -> String {
    format!("{}_{}", column_name(relation_property), referenced_column)
}

/// Name of a synthesized many-to-many junction table.
#[must_use]
pub fn junction_table_name(owner_table: &str, relation_property: &str, target_table: &str) -> String {
    format!(
        "{}_{}_{}",
        owner_table,
        column_name(relation_property),
        target_table
    )
}

/// Name of a junction-side column mirroring a referenced primary key.
#[must_use]
pub fn junction_column_name(side_table: &str, referenced_column: &str) -> String {
    format!("{}_{}", side_table, referenced_column)
}

/// Name of the closure junction table of a tree entity.
#[must_use]
pub fn closure_table_name(source_table: &str) -> String {
    format!("{}_closure", source_table)
}

/// Property name of a closure junction column.
#[must_use]
pub fn closure_column_name(pk_property: &str, side: ClosureSide) -> String {
    match side {
        ClosureSide::Ancestor => format!("{}_ancestor", pk_property),
        ClosureSide::Descendant => format!("{}_descendant", pk_property),
    }
}

/// Name of a foreign-key constraint.
#[must_use]
pub fn foreign_key_name(table: &str, local_columns: &[&str]) -> String {
    format!("fk_{}_{}", table, local_columns.join("_"))
}

/// Name of an index.
#[must_use]
pub fn index_name(table: &str, columns: &[&str], unique: bool) -> String {
    let prefix = if unique { "uk" } else { "ix" };
    format!("{}_{}_{}", prefix, table, columns.join("_"))
}
