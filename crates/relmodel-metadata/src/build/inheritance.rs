//! Inheritance resolution.
//!
//! Two strategies, both declared on the hierarchy root:
//!
//! - *single-table*: every entity of the hierarchy maps to the root's
//!   physical table; ancestor columns are unioned into each child's
//!   effective column set (a redeclared property overrides the ancestor's
//!   definition for that branch only) and a discriminator column selects the
//!   effective type per row.
//! - *class-table*: each child keeps its own table, joined to the parent by
//!   a shared primary key. The child mirrors the parent's primary columns
//!   when it declares none, and a parent link is recorded for the relation
//!   pass to realize as an owning one-to-one plus foreign key.
//!
//! Chains resolve transitively: children are processed parents-first, so a
//! multi-level child unions the already-merged effective set of its parent.

use relmodel_core::{ColumnType, MetadataError, Result};

use crate::declaration::InheritanceStrategy;
use crate::graph::{ColumnMetadata, EntityId, TableKind};
use crate::registry::DeclarationRegistry;

use super::BuildState;

/// Discriminator column name used when the root declares none.
const DEFAULT_DISCRIMINATOR: &str = "discriminator";

pub(crate) fn resolve(state: &mut BuildState, registry: &DeclarationRegistry) -> Result<()> {
    link_parents(state, registry)?;
    let ordered = children_by_depth(state)?;

    // Roots first: a single-table root must carry its discriminator before
    // any child unions the root's columns.
    for entity_index in 0..state.entities.len() {
        let Some(decl_index) = state.decl_of[entity_index] else {
            continue;
        };
        let decl = &registry.entities()[decl_index];
        if decl.strategy == Some(InheritanceStrategy::SingleTable) {
            let column_name = decl
                .discriminator_column
                .clone()
                .unwrap_or_else(|| DEFAULT_DISCRIMINATOR.to_string());
            inject_discriminator(state, entity_index, column_name);
            let value = decl
                .discriminator_value
                .clone()
                .unwrap_or_else(|| decl.name.clone());
            state.entities[entity_index].discriminator_value = Some(value);
        }
    }

    for child_index in ordered {
        let parent_id = state.entities[child_index]
            .parent
            .ok_or_else(|| MetadataError::declaration(&state.entities[child_index].name, "missing parent"))?;
        let strategy = root_strategy(state, registry, child_index)?;
        match strategy {
            InheritanceStrategy::SingleTable => resolve_single_table(state, registry, child_index, parent_id),
            InheritanceStrategy::ClassTable => resolve_class_table(state, child_index, parent_id),
        }
    }
    Ok(())
}

fn link_parents(state: &mut BuildState, registry: &DeclarationRegistry) -> Result<()> {
    for entity_index in 0..state.entities.len() {
        let Some(decl_index) = state.decl_of[entity_index] else {
            continue;
        };
        let decl = &registry.entities()[decl_index];
        if let Some(parent_handle) = &decl.parent {
            let parent_id = state.lookup_handle(parent_handle).ok_or_else(|| {
                MetadataError::declaration(
                    &decl.name,
                    format!("parent entity \"{}\" is not registered", parent_handle),
                )
            })?;
            if parent_id.index() == entity_index {
                return Err(MetadataError::declaration(&decl.name, "entity cannot inherit from itself"));
            }
            state.entities[entity_index].parent = Some(parent_id);
        }
    }
    Ok(())
}

/// Children ordered parents-first; errors on inheritance cycles.
fn children_by_depth(state: &BuildState) -> Result<Vec<usize>> {
    let mut with_depth = Vec::new();
    for (index, entity) in state.entities.iter().enumerate() {
        if entity.parent.is_none() {
            continue;
        }
        let mut depth = 0usize;
        let mut cursor = entity.parent;
        while let Some(parent) = cursor {
            depth += 1;
            if depth > state.entities.len() {
                return Err(MetadataError::declaration(&entity.name, "inheritance cycle detected"));
            }
            cursor = state.entities[parent.index()].parent;
        }
        with_depth.push((depth, index));
    }
    with_depth.sort_unstable();
    Ok(with_depth.into_iter().map(|(_, index)| index).collect())
}

/// The strategy declared on the root of this entity's chain.
fn root_strategy(
    state: &BuildState,
    registry: &DeclarationRegistry,
    entity_index: usize,
) -> Result<InheritanceStrategy> {
    let mut cursor = entity_index;
    loop {
        match state.entities[cursor].parent {
            Some(parent) => cursor = parent.index(),
            None => break,
        }
    }
    let root_decl = state.decl_of[cursor]
        .map(|i| &registry.entities()[i])
        .ok_or_else(|| MetadataError::declaration(&state.entities[cursor].name, "root entity has no declaration"))?;
    root_decl.strategy.ok_or_else(|| {
        MetadataError::declaration(
            &state.entities[entity_index].name,
            format!(
                "parent chain root \"{}\" declares no inheritance strategy",
                root_decl.name
            ),
        )
    })
}

fn inject_discriminator(state: &mut BuildState, root_index: usize, column_name: String) {
    let entity = &mut state.entities[root_index];
    if let Some(existing) = entity
        .columns
        .iter_mut()
        .find(|c| c.column_name == column_name)
    {
        existing.is_discriminator = true;
        return;
    }
    entity.columns.push(ColumnMetadata {
        property_name: column_name.clone(),
        column_name,
        ty: ColumnType::Text,
        nullable: false,
        length: None,
        default: None,
        generated: relmodel_core::Generated::None,
        primary: false,
        unique: false,
        embedded_prefix: None,
        is_virtual: true,
        is_discriminator: true,
        referenced_column: None,
        closure_side: None,
    });
    tracing::debug!(entity = %entity.name, "injected discriminator column");
}

fn resolve_single_table(
    state: &mut BuildState,
    registry: &DeclarationRegistry,
    child_index: usize,
    parent_id: EntityId,
) {
    // Union the parent's effective set with the child's own columns. The
    // parent is already merged (parents-first order), so one step covers
    // the whole ancestor chain. A property redeclared by the child replaces
    // the ancestor's definition in place, keeping positional stability.
    let parent = state.entities[parent_id.index()].clone();
    let child = &mut state.entities[child_index];
    child.kind = TableKind::SingleTableChild;
    child.table_name = parent.table_name.clone();

    let own = std::mem::take(&mut child.columns);
    let mut merged: Vec<ColumnMetadata> = Vec::with_capacity(parent.columns.len() + own.len());
    for inherited in &parent.columns {
        match own.iter().find(|c| c.property_name == inherited.property_name) {
            Some(redeclared) => merged.push(redeclared.clone()),
            None => merged.push(inherited.clone()),
        }
    }
    for column in own {
        if !merged.iter().any(|c| c.property_name == column.property_name) {
            merged.push(column);
        }
    }
    child.primary_columns = merged
        .iter()
        .enumerate()
        .filter(|(_, c)| c.primary)
        .map(|(i, _)| i)
        .collect();
    child.columns = merged;

    let decl = state.decl_of[child_index].map(|i| &registry.entities()[i]);
    child.discriminator_value = decl
        .and_then(|d| d.discriminator_value.clone())
        .or_else(|| Some(child.name.clone()));
}

fn resolve_class_table(state: &mut BuildState, child_index: usize, parent_id: EntityId) {
    let parent_pks = state.pk_specs(parent_id);
    let child = &mut state.entities[child_index];
    child.kind = TableKind::ClassTableChild;

    if child.primary_columns.is_empty() {
        // Mirror the parent's primary key as virtual columns; the handle
        // back to the parent column keeps type and length linked.
        for spec in &parent_pks {
            child.columns.push(ColumnMetadata {
                property_name: spec.property.clone(),
                column_name: spec.column_name.clone(),
                ty: spec.ty,
                nullable: false,
                length: spec.length,
                default: None,
                generated: relmodel_core::Generated::None,
                primary: true,
                unique: false,
                embedded_prefix: None,
                is_virtual: true,
                is_discriminator: false,
                referenced_column: Some(spec.column),
                closure_side: None,
            });
            child.primary_columns.push(child.columns.len() - 1);
        }
        tracing::debug!(
            entity = %child.name,
            mirrored = parent_pks.len(),
            "mirrored parent primary key onto class-table child"
        );
    }

    let child_id = child.id;
    state.pending_parent_links.push((child_id, parent_id));
}

#[cfg(test)]
mod tests {
    use relmodel_core::ColumnType;

    use crate::declaration::{ColumnDeclaration, EntityDeclaration};
    use crate::graph::TableKind;
    use crate::registry::DeclarationRegistry;

    use super::super::{BuildState, columns};

    fn resolve(registry: &DeclarationRegistry) -> BuildState {
        let mut state = BuildState::register(registry).unwrap();
        columns::resolve(&mut state, registry).unwrap();
        super::resolve(&mut state, registry).unwrap();
        state
    }

    fn employee_hierarchy(single_table: bool) -> DeclarationRegistry {
        let root = EntityDeclaration::new("Employee")
            .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
            .column(ColumnDeclaration::new("name", ColumnType::Text));
        let root = if single_table {
            root.single_table(Some("kind"))
        } else {
            root.class_table()
        };
        DeclarationRegistry::new()
            .with(root)
            .with(
                EntityDeclaration::new("Manager")
                    .child_of("Employee")
                    .column(ColumnDeclaration::new("department", ColumnType::Text)),
            )
    }

    #[test]
    fn test_single_table_child_shares_root_table() {
        let state = resolve(&employee_hierarchy(true));
        let child = &state.entities[1];
        assert_eq!(child.kind, TableKind::SingleTableChild);
        assert_eq!(child.table_name, "employee");
        assert!(child.column("id").is_some());
        assert!(child.column("name").is_some());
        assert!(child.column("department").is_some());
        assert_eq!(child.primary_columns.len(), 1);
    }

    #[test]
    fn test_single_table_discriminator_injected_and_valued() {
        let state = resolve(&employee_hierarchy(true));
        let root = &state.entities[0];
        let disc = root.column_by_name("kind").unwrap();
        assert!(disc.is_discriminator);
        assert_eq!(root.discriminator_value.as_deref(), Some("Employee"));
        let child = &state.entities[1];
        assert!(child.column_by_name("kind").is_some());
        assert_eq!(child.discriminator_value.as_deref(), Some("Manager"));
    }

    #[test]
    fn test_single_table_child_overrides_ancestor_column() {
        let registry = DeclarationRegistry::new()
            .with(
                EntityDeclaration::new("Employee")
                    .single_table(None)
                    .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
                    .column(ColumnDeclaration::new("name", ColumnType::Varchar).length(64)),
            )
            .with(
                EntityDeclaration::new("Manager")
                    .child_of("Employee")
                    .column(ColumnDeclaration::new("name", ColumnType::Varchar).length(255)),
            );
        let state = resolve(&registry);
        let child = &state.entities[1];
        // Override replaces the ancestor definition in place.
        assert_eq!(child.column("name").unwrap().length, Some(255));
        assert_eq!(
            child.columns.iter().filter(|c| c.property_name == "name").count(),
            1
        );
        // Root keeps its own definition.
        assert_eq!(state.entities[0].column("name").unwrap().length, Some(64));
    }

    #[test]
    fn test_class_table_child_mirrors_parent_pk() {
        let state = resolve(&employee_hierarchy(false));
        let child = &state.entities[1];
        assert_eq!(child.kind, TableKind::ClassTableChild);
        assert_eq!(child.table_name, "manager");
        let pk = child.column("id").unwrap();
        assert!(pk.primary);
        assert!(pk.is_virtual);
        assert!(pk.referenced_column.is_some());
        assert_eq!(state.pending_parent_links.len(), 1);
    }

    #[test]
    fn test_class_table_child_keeps_declared_pk() {
        let registry = DeclarationRegistry::new()
            .with(
                EntityDeclaration::new("Person")
                    .class_table()
                    .column(ColumnDeclaration::new("id", ColumnType::BigInt).primary(true)),
            )
            .with(
                EntityDeclaration::new("Student")
                    .child_of("Person")
                    .column(ColumnDeclaration::new("id", ColumnType::BigInt).primary(true))
                    .column(ColumnDeclaration::new("grade", ColumnType::Text)),
            );
        let state = resolve(&registry);
        let child = &state.entities[1];
        assert_eq!(child.primary_columns.len(), 1);
        assert!(!child.column("id").unwrap().is_virtual);
    }

    #[test]
    fn test_multi_level_chain_resolves_transitively() {
        let registry = DeclarationRegistry::new()
            .with(
                EntityDeclaration::new("Base")
                    .single_table(None)
                    .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true)),
            )
            .with(EntityDeclaration::new("Mid").child_of("Base").column(
                ColumnDeclaration::new("midField", ColumnType::Text),
            ))
            .with(EntityDeclaration::new("Leaf").child_of("Mid").column(
                ColumnDeclaration::new("leafField", ColumnType::Text),
            ));
        let state = resolve(&registry);
        let leaf = &state.entities[2];
        assert!(leaf.column("id").is_some());
        assert!(leaf.column("midField").is_some());
        assert!(leaf.column("leafField").is_some());
        assert_eq!(leaf.table_name, "base");
    }

    #[test]
    fn test_inheritance_cycle_detected() {
        let registry = DeclarationRegistry::new()
            .with(EntityDeclaration::new("A").child_of("B"))
            .with(EntityDeclaration::new("B").child_of("A"));
        let mut state = BuildState::register(&registry).unwrap();
        columns::resolve(&mut state, &registry).unwrap();
        let err = super::resolve(&mut state, &registry).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let registry = DeclarationRegistry::new().with(EntityDeclaration::new("A").child_of("Ghost"));
        let mut state = BuildState::register(&registry).unwrap();
        columns::resolve(&mut state, &registry).unwrap();
        let err = super::resolve(&mut state, &registry).unwrap_err();
        assert!(err.to_string().contains("Ghost"));
    }
}
