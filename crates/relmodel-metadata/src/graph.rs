//! The resolved schema graph.
//!
//! Everything in this module is produced by the builder pipeline and is
//! immutable once the build completes. Cross-entity references are handles
//! (`EntityId`, `ColumnRef`, `RelationRef`) into the graph rather than owned
//! duplicates, so a virtual column stays structurally linked to the column it
//! mirrors instead of carrying an independent copy of its type.

use std::collections::HashMap;
use std::sync::Arc;

use relmodel_core::{ColumnType, Generated, ReferentialAction, Result};
use relmodel_core::MetadataError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::declaration::RelationKind;

/// Handle of an entity within a [`SchemaGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(usize);

impl EntityId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the entity in the graph.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// Handle of a column: entity plus position in its column list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Owning entity.
    pub entity: EntityId,
    /// Index into the entity's column list.
    pub index: usize,
}

/// Handle of a relation: entity plus position in its relation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationRef {
    /// Owning entity.
    pub entity: EntityId,
    /// Index into the entity's relation list.
    pub index: usize,
}

/// What kind of table an entity resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TableKind {
    /// A regular declared table.
    #[default]
    Ordinary,
    /// A synthesized many-to-many junction table.
    Junction,
    /// A synthesized closure junction table of a tree entity.
    ClosureJunction,
    /// A single-table inheritance child sharing the root's table.
    SingleTableChild,
    /// A class-table inheritance child joined to its parent by primary key.
    ClassTableChild,
}

impl TableKind {
    /// Junction tables have no primary key of their own; the composite of
    /// their foreign-key columns serves as one.
    #[must_use]
    pub const fn is_junction(&self) -> bool {
        matches!(self, TableKind::Junction | TableKind::ClosureJunction)
    }
}

/// Which side of a closure pair a virtual column encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosureSide {
    /// The ancestor end of a reachability pair.
    Ancestor,
    /// The descendant end of a reachability pair.
    Descendant,
}

/// Resolved description of one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Property name on the mapped structure (or the synthesized name for
    /// virtual columns).
    pub property_name: String,
    /// Physical column name.
    pub column_name: String,
    /// Semantic type.
    pub ty: ColumnType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Length for length-carrying types.
    pub length: Option<u32>,
    /// Default value.
    pub default: Option<JsonValue>,
    /// Generation strategy.
    pub generated: Generated,
    /// Whether this column is part of the primary key.
    pub primary: bool,
    /// Whether this column carries a unique constraint.
    pub unique: bool,
    /// Path prefix when flattened out of an embedded structure.
    pub embedded_prefix: Option<String>,
    /// Whether the pipeline synthesized this column.
    pub is_virtual: bool,
    /// Whether this is an inheritance discriminator column.
    pub is_discriminator: bool,
    /// The column this virtual column mirrors, kept as a handle so type and
    /// length stay structurally linked.
    pub referenced_column: Option<ColumnRef>,
    /// Closure tag when part of a closure junction.
    pub closure_side: Option<ClosureSide>,
}

impl ColumnMetadata {
    /// SQL type spelling including the length, when one applies.
    #[must_use]
    pub fn sql_type(&self) -> String {
        match (self.ty.has_length(), self.length) {
            (true, Some(len)) => format!("{}({})", self.ty.sql_name(), len),
            _ => self.ty.sql_name(),
        }
    }
}

/// Resolved description of one association.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationMetadata {
    /// Property name on the declaring entity.
    pub property_name: String,
    /// Kind of association.
    pub kind: RelationKind,
    /// Resolved target entity.
    pub target: EntityId,
    /// Whether this side physically holds the foreign key.
    pub owning: bool,
    /// Whether the association is optional.
    pub nullable: bool,
    /// The matching relation on the target entity, when bidirectional.
    /// A weak back-reference; never owned.
    pub inverse: Option<RelationRef>,
    /// Indices of the join columns on the owning entity. Filled by
    /// foreign-key synthesis for owning relations.
    pub join_columns: Vec<usize>,
    /// The junction entity of a many-to-many relation.
    pub junction: Option<EntityId>,
    /// Index of the synthesized foreign key on the owning entity.
    pub foreign_key: Option<usize>,
}

/// Resolved description of one foreign-key constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyMetadata {
    /// Deterministic constraint name.
    pub name: String,
    /// Referenced entity.
    pub referenced_entity: EntityId,
    /// Indices of the local columns on the owning entity, in pairing order.
    pub columns: Vec<usize>,
    /// Referenced columns, positionally paired with `columns`.
    pub referenced_columns: Vec<ColumnRef>,
    /// ON DELETE action.
    pub on_delete: Option<ReferentialAction>,
    /// ON UPDATE action.
    pub on_update: Option<ReferentialAction>,
}

/// Resolved description of one index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Index name.
    pub name: String,
    /// Indices of the indexed columns.
    pub columns: Vec<usize>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

/// Resolved description of one physical table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Handle of this entity in the graph.
    pub id: EntityId,
    /// Logical name.
    pub name: String,
    /// Physical table name.
    pub table_name: String,
    /// Handle of the structural type this entity maps to; absent on
    /// synthesized tables.
    pub target: Option<String>,
    /// Table kind.
    pub kind: TableKind,
    /// Columns in declaration order. The order is stable: it fixes the
    /// positional pairing of primary keys with foreign keys.
    pub columns: Vec<ColumnMetadata>,
    /// Relations in declaration order.
    pub relations: Vec<RelationMetadata>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKeyMetadata>,
    /// Indices.
    pub indices: Vec<IndexMetadata>,
    /// Indices of the primary-key columns, in declaration order.
    pub primary_columns: Vec<usize>,
    /// Inheritance parent.
    pub parent: Option<EntityId>,
    /// For closure junctions: the tree entity this junction encodes.
    pub closure_parent: Option<EntityId>,
    /// For tree entities: the synthesized closure junction.
    pub closure_junction: Option<EntityId>,
    /// Discriminator value for single-table inheritance rows.
    pub discriminator_value: Option<String>,
}

impl EntityMetadata {
    /// Find an own column by property name.
    #[must_use]
    pub fn column(&self, property: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.property_name == property)
    }

    /// Find an own column by physical column name.
    #[must_use]
    pub fn column_by_name(&self, column_name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.column_name == column_name)
    }

    /// Find a relation by property name.
    #[must_use]
    pub fn relation(&self, property: &str) -> Option<&RelationMetadata> {
        self.relations.iter().find(|r| r.property_name == property)
    }

    /// The primary-key columns, in declaration order.
    pub fn primary_column_metadata(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.primary_columns.iter().map(|&i| &self.columns[i])
    }

    /// Whether this entity is a synthesized junction table.
    #[must_use]
    pub const fn is_junction(&self) -> bool {
        self.kind.is_junction()
    }
}

/// The fully resolved, immutable schema graph.
///
/// Built once at startup and shared read-only for the lifetime of the schema
/// session; concurrent readers need no locking.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    entities: Vec<Arc<EntityMetadata>>,
    by_name: HashMap<String, EntityId>,
    by_target: HashMap<String, EntityId>,
}

impl SchemaGraph {
    pub(crate) fn freeze(
        entities: Vec<EntityMetadata>,
        by_name: HashMap<String, EntityId>,
        by_target: HashMap<String, EntityId>,
    ) -> Self {
        Self {
            entities: entities.into_iter().map(Arc::new).collect(),
            by_name,
            by_target,
        }
    }

    /// Entity by handle.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> &Arc<EntityMetadata> {
        &self.entities[id.index()]
    }

    /// Entity by logical name.
    #[must_use]
    pub fn entity_by_name(&self, name: &str) -> Option<&Arc<EntityMetadata>> {
        self.by_name.get(name).map(|&id| self.entity(id))
    }

    /// Entity by structural target handle.
    #[must_use]
    pub fn entity_by_target(&self, target: &str) -> Option<&Arc<EntityMetadata>> {
        self.by_target.get(target).map(|&id| self.entity(id))
    }

    /// All entities, in build order.
    pub fn entities(&self) -> impl Iterator<Item = &Arc<EntityMetadata>> {
        self.entities.iter()
    }

    /// Column behind a handle.
    #[must_use]
    pub fn column(&self, col: ColumnRef) -> &ColumnMetadata {
        &self.entity(col.entity).columns[col.index]
    }

    /// Relation behind a handle.
    #[must_use]
    pub fn relation(&self, rel: RelationRef) -> &RelationMetadata {
        &self.entity(rel.entity).relations[rel.index]
    }

    /// Number of entities in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when the graph holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Deterministic structural snapshot of the graph.
    ///
    /// Two builds over identical declarations serialize to equal values, so
    /// snapshots double as a structural-equality probe.
    pub fn snapshot(&self) -> Result<JsonValue> {
        let entities: Vec<&EntityMetadata> = self.entities.iter().map(|e| &**e).collect();
        serde_json::to_value(&entities).map_err(|e| MetadataError::Declaration {
            entity: String::new(),
            property: None,
            message: format!("cannot serialize schema snapshot: {e}"),
        })
    }
}
