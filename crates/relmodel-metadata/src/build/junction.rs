//! Many-to-many junction synthesis.
//!
//! Each many-to-many relation pair resolves to exactly one junction entity,
//! no matter which side the build encounters first. The junction carries one
//! virtual primary column per primary-key column of each side plus two
//! foreign keys, and its name is a pure function of the declarations so
//! repeated builds agree byte-for-byte.

use std::collections::HashSet;

use relmodel_core::Result;

use crate::declaration::RelationKind;
use crate::graph::{
    ColumnMetadata, EntityId, EntityMetadata, ForeignKeyMetadata, TableKind,
};
use crate::naming;
use crate::registry::DeclarationRegistry;

use super::{BuildState, PkSpec, RelationSource};

pub(crate) fn synthesize(state: &mut BuildState, registry: &DeclarationRegistry) -> Result<()> {
    let mut processed: HashSet<(usize, usize)> = HashSet::new();
    let declared_count = state.entities.len();

    for entity_index in 0..declared_count {
        for relation_index in 0..state.entities[entity_index].relations.len() {
            let relation = &state.entities[entity_index].relations[relation_index];
            if relation.kind != RelationKind::ManyToMany
                || processed.contains(&(entity_index, relation_index))
            {
                continue;
            }
            // Inherited copies on single-table children share the declaring
            // ancestor's junction; only the declaring copy builds one.
            let inherited = matches!(
                state.relation_sources.get(&(entity_index, relation_index)),
                Some(RelationSource::Declared { decl_entity, .. })
                    if state.decl_of[entity_index] != Some(*decl_entity)
            );
            if inherited {
                continue;
            }
            let this_side = (entity_index, relation_index);
            let other_side = relation.inverse.map(|r| (r.entity.index(), r.index));

            processed.insert(this_side);
            if let Some(other) = other_side {
                processed.insert(other);
            }

            let builder_side = choose_builder_side(state, registry, this_side, other_side);
            build_junction(state, registry, builder_side)?;
        }
    }
    link_inherited_copies(state, declared_count);
    Ok(())
}

/// Point inherited many-to-many copies on single-table children at the
/// junction their declaring ancestor built.
fn link_inherited_copies(state: &mut BuildState, declared_count: usize) {
    for entity_index in 0..declared_count {
        for relation_index in 0..state.entities[entity_index].relations.len() {
            let relation = &state.entities[entity_index].relations[relation_index];
            if relation.kind != RelationKind::ManyToMany || relation.junction.is_some() {
                continue;
            }
            let Some(RelationSource::Declared { decl_entity, .. }) =
                state.relation_sources.get(&(entity_index, relation_index)).copied()
            else {
                continue;
            };
            if state.decl_of[entity_index] == Some(decl_entity) {
                continue;
            }
            let property = relation.property_name.clone();
            let mut cursor = state.entities[entity_index].parent;
            while let Some(ancestor) = cursor {
                if state.decl_of[ancestor.index()] == Some(decl_entity) {
                    let junction = state.entities[ancestor.index()]
                        .relation(&property)
                        .and_then(|r| r.junction);
                    state.entities[entity_index].relations[relation_index].junction = junction;
                    break;
                }
                cursor = state.entities[ancestor.index()].parent;
            }
        }
    }
}

/// Which side the junction is built from: the side declaring a join table
/// wins; a unidirectional relation builds from its only side; otherwise the
/// lexicographically first `(entity name, property)` pair, so the choice is
/// independent of registration order.
fn choose_builder_side(
    state: &BuildState,
    registry: &DeclarationRegistry,
    this_side: (usize, usize),
    other_side: Option<(usize, usize)>,
) -> (usize, usize) {
    let Some(other) = other_side else {
        return this_side;
    };
    if declares_join_table(state, registry, this_side) {
        return this_side;
    }
    if declares_join_table(state, registry, other) {
        return other;
    }
    let key = |(entity_index, relation_index): (usize, usize)| {
        let entity = &state.entities[entity_index];
        (
            entity.name.clone(),
            entity.relations[relation_index].property_name.clone(),
        )
    };
    if key(this_side) <= key(other) { this_side } else { other }
}

fn declares_join_table(
    state: &BuildState,
    registry: &DeclarationRegistry,
    side: (usize, usize),
) -> bool {
    match state.relation_sources.get(&side) {
        Some(RelationSource::Declared {
            decl_entity,
            decl_relation,
        }) => registry.entities()[*decl_entity].relations[*decl_relation]
            .join_table
            .is_some(),
        _ => false,
    }
}

fn declared_table_name(
    state: &BuildState,
    registry: &DeclarationRegistry,
    side: (usize, usize),
) -> Option<String> {
    match state.relation_sources.get(&side) {
        Some(RelationSource::Declared {
            decl_entity,
            decl_relation,
        }) => registry.entities()[*decl_entity].relations[*decl_relation]
            .join_table
            .as_ref()
            .and_then(|t| t.name.clone()),
        _ => None,
    }
}

fn build_junction(
    state: &mut BuildState,
    registry: &DeclarationRegistry,
    builder_side: (usize, usize),
) -> Result<()> {
    let (owner_index, relation_index) = builder_side;
    let owner_id = state.entities[owner_index].id;
    let relation = &state.entities[owner_index].relations[relation_index];
    if relation.junction.is_some() {
        return Ok(());
    }
    let target_id = relation.target;
    let inverse = relation.inverse;
    let property = relation.property_name.clone();

    let owner_pks = state.pk_specs(owner_id);
    let target_pks = state.pk_specs(target_id);
    if owner_pks.is_empty() || target_pks.is_empty() {
        // Missing primary keys are reported by the validator on the side
        // that lacks them.
        return Ok(());
    }

    let owner_table = state.entities[owner_index].table_name.clone();
    let target_table = state.entities[target_id.index()].table_name.clone();
    let table_name = declared_table_name(state, registry, builder_side)
        .unwrap_or_else(|| naming::junction_table_name(&owner_table, &property, &target_table));

    let mut columns: Vec<ColumnMetadata> = Vec::with_capacity(owner_pks.len() + target_pks.len());
    let mut used_names: HashSet<String> = HashSet::new();
    for spec in &owner_pks {
        columns.push(junction_column(&owner_table, spec, &mut used_names));
    }
    for spec in &target_pks {
        columns.push(junction_column(&target_table, spec, &mut used_names));
    }
    let primary_columns: Vec<usize> = (0..columns.len()).collect();

    let owner_column_names: Vec<&str> = columns[..owner_pks.len()]
        .iter()
        .map(|c| c.column_name.as_str())
        .collect();
    let target_column_names: Vec<&str> = columns[owner_pks.len()..]
        .iter()
        .map(|c| c.column_name.as_str())
        .collect();
    let foreign_keys = vec![
        ForeignKeyMetadata {
            name: naming::foreign_key_name(&table_name, &owner_column_names),
            referenced_entity: owner_id,
            columns: (0..owner_pks.len()).collect(),
            referenced_columns: owner_pks.iter().map(|s| s.column).collect(),
            on_delete: None,
            on_update: None,
        },
        ForeignKeyMetadata {
            name: naming::foreign_key_name(&table_name, &target_column_names),
            referenced_entity: target_id,
            columns: (owner_pks.len()..owner_pks.len() + target_pks.len()).collect(),
            referenced_columns: target_pks.iter().map(|s| s.column).collect(),
            on_delete: None,
            on_update: None,
        },
    ];

    let junction_id = state.push_synthesized(EntityMetadata {
        id: EntityId::new(0), // reassigned by push_synthesized
        name: table_name.clone(),
        table_name,
        target: None,
        kind: TableKind::Junction,
        columns,
        relations: Vec::new(),
        foreign_keys,
        indices: Vec::new(),
        primary_columns,
        parent: None,
        closure_parent: None,
        closure_junction: None,
        discriminator_value: None,
    });

    state.entities[owner_index].relations[relation_index].junction = Some(junction_id);
    if let Some(inverse) = inverse {
        state.entities[inverse.entity.index()].relations[inverse.index].junction =
            Some(junction_id);
    }
    tracing::debug!(
        junction = %state.entities[junction_id.index()].name,
        "synthesized many-to-many junction"
    );
    Ok(())
}

/// Virtual primary column mirroring one referenced primary-key column.
/// Self-referential pairs collide on derived names; a numeric suffix keeps
/// them apart deterministically.
fn junction_column(side_table: &str, spec: &PkSpec, used_names: &mut HashSet<String>) -> ColumnMetadata {
    let base = naming::junction_column_name(side_table, &spec.column_name);
    let mut column_name = base.clone();
    let mut suffix = 2;
    while !used_names.insert(column_name.clone()) {
        column_name = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    ColumnMetadata {
        property_name: column_name.clone(),
        column_name,
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
    }
}
