//! relmodel: entity metadata resolution for relational mapping.
//!
//! Applications declare entities (tables, columns, relations, inheritance,
//! embedded structures, trees); relmodel resolves those declarations into a
//! complete, internally consistent schema graph - including derived objects
//! the application never declared, such as junction tables for many-to-many
//! relations, closure tables for trees, and discriminator columns for
//! single-table inheritance. The finished graph is immutable and is the
//! single input the SQL-generation and hydration layers consume.
//!
//! # Crates
//!
//! - [`relmodel_core`]: semantic types, dialect mappings, errors.
//! - [`relmodel_metadata`]: declarations, registry, and the builder
//!   pipeline producing [`SchemaGraph`].
//! - [`relmodel_query`]: per-query alias bindings over a finished graph.
//!
//! # Example
//!
//! ```
//! use relmodel::prelude::*;
//!
//! let registry = DeclarationRegistry::new()
//!     .with(
//!         EntityDeclaration::new("Category")
//!             .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true)),
//!     )
//!     .with(
//!         EntityDeclaration::new("Post")
//!             .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
//!             .relation(RelationDeclaration::many_to_many("categories", "Category")),
//!     );
//!
//! let graph = MetadataBuilder::new(registry).build().unwrap();
//! assert_eq!(graph.len(), 3); // Category, Post, and the junction
//! ```

pub use relmodel_core::{
    ColumnType, Dialect, Generated, MetadataError, ReferentialAction, Result, Violation,
};
pub use relmodel_metadata::{
    ClosureSide, ColumnDeclaration, ColumnMetadata, ColumnRef, DeclarationRegistry,
    EmbeddedDeclaration, EmbeddedPrefix, EntityDeclaration, EntityId, EntityMetadata,
    ForeignKeyMetadata, IndexDeclaration, IndexMetadata, InheritanceStrategy, InverseSide,
    JoinColumnDeclaration, JoinTableDeclaration, MetadataBuilder, RelationDeclaration,
    RelationKind, RelationMetadata, RelationRef, SchemaGraph, TableKind, TreeDeclaration,
};
pub use relmodel_query::{Alias, AliasKind, QueryScope};

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use relmodel_core::{ColumnType, Dialect, Generated, MetadataError, ReferentialAction};
    pub use relmodel_metadata::{
        ColumnDeclaration, DeclarationRegistry, EmbeddedDeclaration, EmbeddedPrefix,
        EntityDeclaration, IndexDeclaration, JoinColumnDeclaration, JoinTableDeclaration,
        MetadataBuilder, RelationDeclaration, RelationKind, TableKind, TreeDeclaration,
    };
    pub use relmodel_query::{Alias, AliasKind, QueryScope};
}
