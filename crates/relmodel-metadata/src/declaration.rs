//! Raw entity declarations.
//!
//! Declarations are the untyped input of the builder pipeline: plain records
//! describing tables, columns, relations, embedded structures, indices, and
//! inheritance links as stated by the host application. How the host produces
//! them (derive macro, config file, hand-written) is irrelevant here; only
//! the declared data matters.
//!
//! Relation targets are *handles* (entity names), never resolved values: two
//! entities may reference each other, so dereferencing is deferred to the
//! second builder pass once every entity skeleton is registered.

use relmodel_core::{ColumnType, Generated, ReferentialAction};
use serde_json::Value as JsonValue;

/// The kind of association a relation declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RelationKind {
    /// One row on each side.
    OneToOne,
    /// Many local rows point at one target row.
    ManyToOne,
    /// One local row is pointed at by many target rows.
    OneToMany,
    /// Many rows on both sides, joined through a junction table.
    ManyToMany,
    /// Tree edge to the parent row of the same entity.
    TreeParent,
    /// Tree edge to the child rows of the same entity.
    TreeChildren,
}

impl RelationKind {
    /// Whether this kind points at the declaring entity itself.
    #[must_use]
    pub const fn is_tree(&self) -> bool {
        matches!(self, RelationKind::TreeParent | RelationKind::TreeChildren)
    }

    /// The kind expected on the inverse side of a bidirectional pair.
    #[must_use]
    pub const fn inverse_kind(&self) -> RelationKind {
        match self {
            RelationKind::OneToOne => RelationKind::OneToOne,
            RelationKind::ManyToOne => RelationKind::OneToMany,
            RelationKind::OneToMany => RelationKind::ManyToOne,
            RelationKind::ManyToMany => RelationKind::ManyToMany,
            RelationKind::TreeParent => RelationKind::TreeChildren,
            RelationKind::TreeChildren => RelationKind::TreeParent,
        }
    }
}

/// Declaration of a single mapped column.
#[derive(Debug, Clone)]
pub struct ColumnDeclaration {
    /// Property name on the declaring structure.
    pub property: String,
    /// Physical column name; derived from the property when absent.
    pub column_name: Option<String>,
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
}

impl ColumnDeclaration {
    /// Create a column declaration with the minimal required data.
    pub fn new(property: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            property: property.into(),
            column_name: None,
            ty,
            nullable: false,
            length: None,
            default: None,
            generated: Generated::None,
            primary: false,
            unique: false,
        }
    }

    /// Set an explicit physical column name.
    pub fn column_name(mut self, name: impl Into<String>) -> Self {
        self.column_name = Some(name.into());
        self
    }

    /// Mark as nullable.
    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Set the length for length-carrying types.
    pub fn length(mut self, value: u32) -> Self {
        self.length = Some(value);
        self
    }

    /// Set the default value.
    pub fn default_value(mut self, value: JsonValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Set the generation strategy.
    pub fn generated(mut self, value: Generated) -> Self {
        self.generated = value;
        self
    }

    /// Mark as primary key.
    pub fn primary(mut self, value: bool) -> Self {
        self.primary = value;
        self
    }

    /// Mark as unique.
    pub fn unique(mut self, value: bool) -> Self {
        self.unique = value;
        self
    }
}

/// Prefix policy for flattening an embedded structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EmbeddedPrefix {
    /// Prefix columns with the embedded property name and an underscore.
    #[default]
    Property,
    /// Prefix columns with a custom string.
    Custom(String),
    /// No prefix; columns keep their own names.
    None,
}

/// Declaration of an embedded sub-structure.
///
/// Embedding never creates a table: the nested columns are flattened onto
/// the declaring entity, prefixed per the policy.
#[derive(Debug, Clone)]
pub struct EmbeddedDeclaration {
    /// Property holding the embedded structure.
    pub property: String,
    /// Prefix policy for the flattened columns.
    pub prefix: EmbeddedPrefix,
    /// Columns of the embedded structure.
    pub columns: Vec<ColumnDeclaration>,
    /// Nested embedded structures.
    pub embeddeds: Vec<EmbeddedDeclaration>,
}

impl EmbeddedDeclaration {
    /// Create an embedded declaration with the default prefix policy.
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            prefix: EmbeddedPrefix::Property,
            columns: Vec::new(),
            embeddeds: Vec::new(),
        }
    }

    /// Override the prefix policy.
    pub fn prefix(mut self, prefix: EmbeddedPrefix) -> Self {
        self.prefix = prefix;
        self
    }

    /// Add a column.
    pub fn column(mut self, column: ColumnDeclaration) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a nested embedded structure.
    pub fn embedded(mut self, embedded: EmbeddedDeclaration) -> Self {
        self.embeddeds.push(embedded);
        self
    }
}

/// How a relation names its inverse side on the target entity.
#[derive(Debug, Clone, Copy)]
pub enum InverseSide {
    /// Literal property name on the target entity.
    Property(&'static str),
    /// Selector evaluated against the target's relation property set.
    ///
    /// Receives the property names of the target's relations and returns the
    /// chosen one, or `None` when nothing matches.
    Selector(fn(&[&str]) -> Option<String>),
}

/// Declaration of one join column of an owning relation.
#[derive(Debug, Clone, Default)]
pub struct JoinColumnDeclaration {
    /// Local column name; synthesized from the relation and referenced
    /// column when absent.
    pub name: Option<String>,
    /// Referenced primary-key property on the target; positional pairing
    /// when absent.
    pub referenced_property: Option<String>,
}

impl JoinColumnDeclaration {
    /// Join column with default name and positional referenced column.
    #[must_use]
    pub fn synthesized() -> Self {
        Self::default()
    }

    /// Join column with an explicit local name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            referenced_property: None,
        }
    }

    /// Set the referenced primary-key property on the target entity.
    pub fn references(mut self, property: impl Into<String>) -> Self {
        self.referenced_property = Some(property.into());
        self
    }
}

/// Declaration of the junction table of a many-to-many relation.
///
/// Declaring a join table marks this side as the one the junction is built
/// from; the name is synthesized deterministically when absent.
#[derive(Debug, Clone, Default)]
pub struct JoinTableDeclaration {
    /// Explicit junction table name.
    pub name: Option<String>,
}

impl JoinTableDeclaration {
    /// Join table with a synthesized name.
    #[must_use]
    pub fn synthesized() -> Self {
        Self::default()
    }

    /// Join table with an explicit name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// Declaration of an association to another entity.
#[derive(Debug, Clone)]
pub struct RelationDeclaration {
    /// Property name on the declaring entity.
    pub property: String,
    /// Kind of association.
    pub kind: RelationKind,
    /// Handle of the target entity (logical name or target name).
    ///
    /// Empty for tree relations, which are self-referential by construction.
    pub target: String,
    /// Inverse side on the target entity, when bidirectional.
    pub inverse: Option<InverseSide>,
    /// Whether the association is optional.
    pub nullable: bool,
    /// Declared join columns. `Some` marks the owning side of a one-to-one;
    /// an empty list requests synthesized names.
    pub join_columns: Option<Vec<JoinColumnDeclaration>>,
    /// Declared junction table for many-to-many relations.
    pub join_table: Option<JoinTableDeclaration>,
    /// ON DELETE action for the synthesized foreign key.
    pub on_delete: Option<ReferentialAction>,
    /// ON UPDATE action for the synthesized foreign key.
    pub on_update: Option<ReferentialAction>,
}

impl RelationDeclaration {
    fn new(property: impl Into<String>, kind: RelationKind, target: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            kind,
            target: target.into(),
            inverse: None,
            nullable: true,
            join_columns: None,
            join_table: None,
            on_delete: None,
            on_update: None,
        }
    }

    /// Declare a one-to-one relation. Non-owning until a join column is
    /// declared via [`Self::join_column`] or [`Self::join_columns`].
    pub fn one_to_one(property: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(property, RelationKind::OneToOne, target)
    }

    /// Declare a many-to-one relation. Always owning.
    pub fn many_to_one(property: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(property, RelationKind::ManyToOne, target)
    }

    /// Declare a one-to-many relation. Never owning.
    pub fn one_to_many(property: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(property, RelationKind::OneToMany, target)
    }

    /// Declare a many-to-many relation. Never owning; the junction table
    /// carries both foreign keys.
    pub fn many_to_many(property: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(property, RelationKind::ManyToMany, target)
    }

    /// Declare the tree-parent edge of a tree entity.
    pub fn tree_parent(property: impl Into<String>) -> Self {
        Self::new(property, RelationKind::TreeParent, "")
    }

    /// Declare the tree-children edge of a tree entity.
    pub fn tree_children(property: impl Into<String>) -> Self {
        Self::new(property, RelationKind::TreeChildren, "")
    }

    /// Name the inverse-side property on the target entity.
    pub fn inverse(mut self, property: &'static str) -> Self {
        self.inverse = Some(InverseSide::Property(property));
        self
    }

    /// Select the inverse side from the target's relation property set.
    pub fn inverse_selector(mut self, selector: fn(&[&str]) -> Option<String>) -> Self {
        self.inverse = Some(InverseSide::Selector(selector));
        self
    }

    /// Set whether the association is optional.
    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Declare a join column with synthesized name, marking this side as
    /// owning for one-to-one relations.
    #[must_use]
    pub fn join_column(mut self) -> Self {
        self.join_columns = Some(vec![JoinColumnDeclaration::synthesized()]);
        self
    }

    /// Declare explicit join columns.
    pub fn join_columns(mut self, columns: Vec<JoinColumnDeclaration>) -> Self {
        self.join_columns = Some(columns);
        self
    }

    /// Declare the junction table, marking this side as the one it is
    /// built from.
    pub fn join_table(mut self, table: JoinTableDeclaration) -> Self {
        self.join_table = Some(table);
        self
    }

    /// Set the ON DELETE action.
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Set the ON UPDATE action.
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// Declaration of an index over entity columns.
#[derive(Debug, Clone)]
pub struct IndexDeclaration {
    /// Index name; derived from the table and columns when absent.
    pub name: Option<String>,
    /// Properties of the indexed columns.
    pub properties: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl IndexDeclaration {
    /// Create an index over the given properties.
    pub fn new(properties: Vec<String>) -> Self {
        Self {
            name: None,
            properties,
            unique: false,
        }
    }

    /// Set an explicit index name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the index as unique.
    pub fn unique(mut self, value: bool) -> Self {
        self.unique = value;
        self
    }
}

/// Table inheritance strategy declared on the root of a hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InheritanceStrategy {
    /// All entities of the hierarchy share one physical table; a
    /// discriminator column selects the effective type.
    SingleTable,
    /// Each child has its own table joined to the parent's by a shared
    /// primary key.
    ClassTable,
}

/// Tree (closure) behavior declared on an entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeDeclaration {
    /// Whether the closure junction materializes a depth column.
    pub with_level: bool,
}

/// Declaration of one entity.
#[derive(Debug, Clone)]
pub struct EntityDeclaration {
    /// Logical entity name.
    pub name: String,
    /// Handle of the structural type this entity maps to.
    pub target: Option<String>,
    /// Physical table name; derived from the logical name when absent.
    pub table_name: Option<String>,
    /// Declared columns, in declaration order.
    pub columns: Vec<ColumnDeclaration>,
    /// Embedded structures to flatten.
    pub embeddeds: Vec<EmbeddedDeclaration>,
    /// Declared relations.
    pub relations: Vec<RelationDeclaration>,
    /// Declared indices.
    pub indices: Vec<IndexDeclaration>,
    /// Inheritance strategy, declared on the hierarchy root.
    pub strategy: Option<InheritanceStrategy>,
    /// Discriminator column name for single-table roots.
    pub discriminator_column: Option<String>,
    /// Parent entity handle for inheritance children.
    pub parent: Option<String>,
    /// Discriminator value for single-table entities.
    pub discriminator_value: Option<String>,
    /// Tree behavior, for closure entities.
    pub tree: Option<TreeDeclaration>,
}

impl EntityDeclaration {
    /// Create an entity declaration.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            target: Some(name.clone()),
            name,
            table_name: None,
            columns: Vec::new(),
            embeddeds: Vec::new(),
            relations: Vec::new(),
            indices: Vec::new(),
            strategy: None,
            discriminator_column: None,
            parent: None,
            discriminator_value: None,
            tree: None,
        }
    }

    /// Set the structural target handle.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set an explicit physical table name.
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    /// Add a column.
    pub fn column(mut self, column: ColumnDeclaration) -> Self {
        self.columns.push(column);
        self
    }

    /// Add an embedded structure.
    pub fn embedded(mut self, embedded: EmbeddedDeclaration) -> Self {
        self.embeddeds.push(embedded);
        self
    }

    /// Add a relation.
    pub fn relation(mut self, relation: RelationDeclaration) -> Self {
        self.relations.push(relation);
        self
    }

    /// Add an index.
    pub fn index(mut self, index: IndexDeclaration) -> Self {
        self.indices.push(index);
        self
    }

    /// Declare this entity as a single-table inheritance root.
    pub fn single_table(mut self, discriminator_column: Option<&str>) -> Self {
        self.strategy = Some(InheritanceStrategy::SingleTable);
        self.discriminator_column = discriminator_column.map(str::to_string);
        self
    }

    /// Declare this entity as a class-table inheritance root.
    #[must_use]
    pub fn class_table(mut self) -> Self {
        self.strategy = Some(InheritanceStrategy::ClassTable);
        self
    }

    /// Declare this entity as a child of `parent` in an inheritance chain.
    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the discriminator value stored for rows of this entity.
    pub fn discriminator_value(mut self, value: impl Into<String>) -> Self {
        self.discriminator_value = Some(value.into());
        self
    }

    /// Declare closure-tree behavior.
    pub fn tree(mut self, tree: TreeDeclaration) -> Self {
        self.tree = Some(tree);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_declaration_builder_chain() {
        let col = ColumnDeclaration::new("title", ColumnType::Varchar)
            .length(255)
            .nullable(true)
            .unique(true);
        assert_eq!(col.property, "title");
        assert_eq!(col.length, Some(255));
        assert!(col.nullable);
        assert!(col.unique);
        assert!(!col.primary);
    }

    #[test]
    fn test_relation_kinds_inverse() {
        assert_eq!(
            RelationKind::ManyToOne.inverse_kind(),
            RelationKind::OneToMany
        );
        assert_eq!(
            RelationKind::TreeParent.inverse_kind(),
            RelationKind::TreeChildren
        );
        assert_eq!(
            RelationKind::ManyToMany.inverse_kind(),
            RelationKind::ManyToMany
        );
    }

    #[test]
    fn test_tree_relations_have_empty_target() {
        let rel = RelationDeclaration::tree_parent("parent");
        assert!(rel.target.is_empty());
        assert!(rel.kind.is_tree());
    }

    #[test]
    fn test_join_column_marks_one_to_one_owning_intent() {
        let rel = RelationDeclaration::one_to_one("profile", "Profile").join_column();
        assert!(rel.join_columns.is_some());
        assert_eq!(rel.join_columns.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_entity_declaration_defaults() {
        let decl = EntityDeclaration::new("Post");
        assert_eq!(decl.name, "Post");
        assert_eq!(decl.target.as_deref(), Some("Post"));
        assert!(decl.table_name.is_none());
        assert!(decl.strategy.is_none());
    }

    #[test]
    fn test_single_table_declaration() {
        let decl = EntityDeclaration::new("Employee").single_table(Some("kind"));
        assert_eq!(decl.strategy, Some(InheritanceStrategy::SingleTable));
        assert_eq!(decl.discriminator_column.as_deref(), Some("kind"));
    }
}
