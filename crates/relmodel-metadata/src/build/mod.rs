//! The metadata builder pipeline.
//!
//! Resolution is a fixed sequence of passes over an in-memory declaration
//! set. The order is load-bearing: columns must exist before inheritance can
//! merge them, every entity skeleton must exist before relation targets are
//! dereferenced (two-pass protocol for mutually-referencing entities),
//! foreign keys need resolved relations, junction tables need foreign-key
//! machinery, and validation needs the finished graph.
//!
//! A build either completes or fails atomically; no partially-resolved graph
//! is ever returned.

mod columns;
mod closure;
mod foreign_keys;
mod inheritance;
mod junction;
mod relations;
mod validate;

use std::collections::HashMap;

use relmodel_core::{ColumnType, Dialect, MetadataError, Result};

use crate::declaration::EntityDeclaration;
use crate::graph::{ColumnRef, EntityId, EntityMetadata, SchemaGraph, TableKind};
use crate::naming;
use crate::registry::DeclarationRegistry;

/// Where a resolved relation came from.
///
/// Foreign-key synthesis needs the original declaration (explicit join
/// columns, referential actions); relations synthesized by the inheritance
/// resolver have none and join on the child's primary key instead.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RelationSource {
    /// Declared by the host application; indices into the registry.
    Declared {
        decl_entity: usize,
        decl_relation: usize,
    },
    /// Synthesized parent link of a class-table inheritance child.
    ParentLink,
}

/// Cloned spec of a primary-key column, detached from the graph so
/// synthesizers can read a referenced entity while mutating another.
#[derive(Debug, Clone)]
pub(crate) struct PkSpec {
    pub property: String,
    pub column_name: String,
    pub ty: ColumnType,
    pub length: Option<u32>,
    pub column: ColumnRef,
}

/// Mutable working state threaded through the passes.
#[derive(Debug)]
pub(crate) struct BuildState {
    pub entities: Vec<EntityMetadata>,
    pub by_name: HashMap<String, EntityId>,
    pub by_target: HashMap<String, EntityId>,
    /// Entity index -> registry declaration index; `None` for synthesized
    /// entities.
    pub decl_of: Vec<Option<usize>>,
    /// Per (entity index, relation index): provenance of the relation.
    pub relation_sources: HashMap<(usize, usize), RelationSource>,
    /// Class-table children awaiting their parent-link relation.
    pub pending_parent_links: Vec<(EntityId, EntityId)>,
}

impl BuildState {
    /// Pass 1 of the two-pass protocol: register a skeleton per declared
    /// entity so later passes can dereference lazy targets.
    fn register(registry: &DeclarationRegistry) -> Result<Self> {
        let mut state = Self {
            entities: Vec::with_capacity(registry.len()),
            by_name: HashMap::new(),
            by_target: HashMap::new(),
            decl_of: Vec::with_capacity(registry.len()),
            relation_sources: HashMap::new(),
            pending_parent_links: Vec::new(),
        };

        for (decl_index, decl) in registry.entities().iter().enumerate() {
            let id = EntityId::new(state.entities.len());
            if state.by_name.insert(decl.name.clone(), id).is_some() {
                return Err(MetadataError::declaration(
                    &decl.name,
                    "duplicate entity name",
                ));
            }
            if let Some(target) = &decl.target {
                // Two entities may share a target only by error; first wins
                // here and the validator reports the duplicate table if any.
                state.by_target.entry(target.clone()).or_insert(id);
            }
            state.entities.push(skeleton(id, decl));
            state.decl_of.push(Some(decl_index));
        }

        tracing::debug!(entities = state.entities.len(), "registered entity skeletons");
        Ok(state)
    }

    /// Append a synthesized entity and return its handle.
    pub(crate) fn push_synthesized(&mut self, mut entity: EntityMetadata) -> EntityId {
        let id = EntityId::new(self.entities.len());
        entity.id = id;
        self.by_name.entry(entity.name.clone()).or_insert(id);
        self.entities.push(entity);
        self.decl_of.push(None);
        id
    }

    /// Resolve a lazy target handle against the pre-registered index.
    pub(crate) fn lookup_handle(&self, handle: &str) -> Option<EntityId> {
        self.by_name
            .get(handle)
            .or_else(|| self.by_target.get(handle))
            .copied()
    }

    /// Clone out the primary-key column specs of an entity.
    pub(crate) fn pk_specs(&self, id: EntityId) -> Vec<PkSpec> {
        let entity = &self.entities[id.index()];
        entity
            .primary_columns
            .iter()
            .map(|&index| {
                let col = &entity.columns[index];
                PkSpec {
                    property: col.property_name.clone(),
                    column_name: col.column_name.clone(),
                    ty: col.ty,
                    length: col.length,
                    column: ColumnRef { entity: id, index },
                }
            })
            .collect()
    }

    /// Freeze the working state into an immutable graph.
    fn freeze(self) -> SchemaGraph {
        SchemaGraph::freeze(self.entities, self.by_name, self.by_target)
    }
}

fn skeleton(id: EntityId, decl: &EntityDeclaration) -> EntityMetadata {
    EntityMetadata {
        id,
        name: decl.name.clone(),
        table_name: decl
            .table_name
            .clone()
            .unwrap_or_else(|| naming::table_name(&decl.name)),
        target: decl.target.clone(),
        kind: TableKind::Ordinary,
        columns: Vec::new(),
        relations: Vec::new(),
        foreign_keys: Vec::new(),
        indices: Vec::new(),
        primary_columns: Vec::new(),
        parent: None,
        closure_parent: None,
        closure_junction: None,
        discriminator_value: None,
    }
}

/// Resolves a declaration registry into a [`SchemaGraph`].
///
/// # Example
///
/// ```ignore
/// let graph = MetadataBuilder::new(registry)
///     .dialect(Dialect::Postgres)
///     .build()?;
/// ```
#[derive(Debug)]
pub struct MetadataBuilder {
    registry: DeclarationRegistry,
    dialect: Dialect,
}

impl MetadataBuilder {
    /// Create a builder over the given declarations with the default
    /// dialect.
    #[must_use]
    pub fn new(registry: DeclarationRegistry) -> Self {
        Self {
            registry,
            dialect: Dialect::default(),
        }
    }

    /// Set the target dialect, queried for logical type mappings during
    /// synthesis.
    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Run the full pipeline.
    ///
    /// Fails atomically: any declaration, resolution, arity, or validation
    /// error aborts the build and no graph escapes.
    pub fn build(self) -> Result<SchemaGraph> {
        tracing::debug!(
            entities = self.registry.len(),
            dialect = self.dialect.name(),
            "starting metadata build"
        );

        let mut state = BuildState::register(&self.registry)?;
        columns::resolve(&mut state, &self.registry)?;
        inheritance::resolve(&mut state, &self.registry)?;
        columns::resolve_indices(&mut state, &self.registry)?;
        relations::resolve(&mut state, &self.registry)?;
        foreign_keys::synthesize(&mut state, &self.registry)?;
        junction::synthesize(&mut state, &self.registry)?;
        closure::synthesize(&mut state, &self.registry, self.dialect)?;
        validate::run(&state)?;

        tracing::debug!(entities = state.entities.len(), "metadata build complete");
        Ok(state.freeze())
    }
}
