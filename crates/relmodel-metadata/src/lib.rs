//! Entity declarations and the schema-graph builder pipeline.
//!
//! This crate is the heart of relmodel: it takes raw entity declarations
//! (tables, columns, relations, embedded structures, inheritance links,
//! tree behavior) and resolves them into a fully linked [`SchemaGraph`] of
//! [`EntityMetadata`] that downstream consumers use to generate SQL and
//! hydrate objects from rows.
//!
//! # Resolution model
//!
//! Resolution is effectively a small compiler over the declaration set:
//!
//! 1. every entity skeleton is registered so lazy, possibly circular
//!    relation targets can be dereferenced later;
//! 2. columns are resolved and embedded structures flattened;
//! 3. inheritance chains are merged (single-table and class-table);
//! 4. relations are resolved to their targets and inverse sides;
//! 5. foreign keys are synthesized for every owning relation;
//! 6. junction tables are synthesized for many-to-many relations and
//!    closure trees;
//! 7. the assembled graph is validated as a whole, aggregating every
//!    violation before failing.
//!
//! The pipeline runs single-threaded per build and either completes or
//! fails atomically; the finished graph is immutable and safely shared by
//! concurrent readers.
//!
//! # Example
//!
//! ```
//! use relmodel_core::ColumnType;
//! use relmodel_metadata::{
//!     ColumnDeclaration, DeclarationRegistry, EntityDeclaration, MetadataBuilder,
//!     RelationDeclaration,
//! };
//!
//! let registry = DeclarationRegistry::new()
//!     .with(
//!         EntityDeclaration::new("Post")
//!             .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
//!             .relation(RelationDeclaration::many_to_many("categories", "Category")),
//!     )
//!     .with(
//!         EntityDeclaration::new("Category")
//!             .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true)),
//!     );
//!
//! let graph = MetadataBuilder::new(registry).build().unwrap();
//! assert!(graph.entity_by_name("post_categories_category").is_some());
//! ```

pub mod build;
pub mod declaration;
pub mod graph;
pub mod naming;
pub mod registry;

pub use build::MetadataBuilder;
pub use declaration::{
    ColumnDeclaration, EmbeddedDeclaration, EmbeddedPrefix, EntityDeclaration, IndexDeclaration,
    InheritanceStrategy, InverseSide, JoinColumnDeclaration, JoinTableDeclaration,
    RelationDeclaration, RelationKind, TreeDeclaration,
};
pub use graph::{
    ClosureSide, ColumnMetadata, ColumnRef, EntityId, EntityMetadata, ForeignKeyMetadata,
    IndexMetadata, RelationMetadata, RelationRef, SchemaGraph, TableKind,
};
pub use registry::DeclarationRegistry;
