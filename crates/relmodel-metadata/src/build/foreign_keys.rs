//! Foreign-key synthesis.
//!
//! Every owning relation ends up with exactly one set of join columns: the
//! declared ones when the declaration names them, otherwise one synthesized
//! virtual column per primary-key column of the referenced entity, named
//! `<relation>_<referenced column>` and mirroring the referenced column's
//! type and length through a handle. Local and referenced columns are paired
//! positionally, in the referenced entity's primary-key declaration order;
//! arity mismatches fail the build before any SQL could be generated.

use relmodel_core::{MetadataError, ReferentialAction, Result};

use crate::declaration::{JoinColumnDeclaration, RelationKind};
use crate::graph::{ColumnMetadata, EntityId, ForeignKeyMetadata};
use crate::naming;
use crate::registry::DeclarationRegistry;

use super::{BuildState, PkSpec, RelationSource};

struct WorkItem {
    relation_index: usize,
    property: String,
    kind: RelationKind,
    target: EntityId,
    nullable: bool,
    join_columns: Option<Vec<JoinColumnDeclaration>>,
    on_delete: Option<ReferentialAction>,
    on_update: Option<ReferentialAction>,
    parent_link: bool,
}

pub(crate) fn synthesize(state: &mut BuildState, registry: &DeclarationRegistry) -> Result<()> {
    for entity_index in 0..state.entities.len() {
        let items = collect_work(state, registry, entity_index);
        for item in items {
            let referenced_pks = state.pk_specs(item.target);
            if referenced_pks.is_empty() {
                // The referenced entity is missing its primary key; the
                // validator reports that root cause, so skip here instead of
                // masking it with a synthetic arity failure.
                continue;
            }
            if item.parent_link {
                link_parent(state, entity_index, &item, &referenced_pks)?;
            } else {
                link_relation(state, entity_index, &item, &referenced_pks)?;
            }
        }
    }
    Ok(())
}

fn collect_work(
    state: &BuildState,
    registry: &DeclarationRegistry,
    entity_index: usize,
) -> Vec<WorkItem> {
    let entity = &state.entities[entity_index];
    entity
        .relations
        .iter()
        .enumerate()
        .filter(|(_, r)| r.owning)
        .filter_map(|(relation_index, relation)| {
            let source = state.relation_sources.get(&(entity_index, relation_index))?;
            let (join_columns, on_delete, on_update, parent_link) = match *source {
                RelationSource::Declared {
                    decl_entity,
                    decl_relation,
                } => {
                    let decl = &registry.entities()[decl_entity].relations[decl_relation];
                    (decl.join_columns.clone(), decl.on_delete, decl.on_update, false)
                }
                RelationSource::ParentLink => (None, None, None, true),
            };
            Some(WorkItem {
                relation_index,
                property: relation.property_name.clone(),
                kind: relation.kind,
                target: relation.target,
                nullable: relation.nullable,
                join_columns,
                on_delete,
                on_update,
                parent_link,
            })
        })
        .collect()
}

/// Class-table parent link: the child's primary key doubles as the foreign
/// key to the parent.
fn link_parent(
    state: &mut BuildState,
    entity_index: usize,
    item: &WorkItem,
    referenced_pks: &[PkSpec],
) -> Result<()> {
    let local = state.entities[entity_index].primary_columns.clone();
    if local.len() != referenced_pks.len() {
        return Err(arity_mismatch(state, entity_index, item, local.len(), referenced_pks));
    }
    push_foreign_key(state, entity_index, item, local, referenced_pks);
    Ok(())
}

fn link_relation(
    state: &mut BuildState,
    entity_index: usize,
    item: &WorkItem,
    referenced_pks: &[PkSpec],
) -> Result<()> {
    let local = match &item.join_columns {
        Some(declared) if !declared.is_empty() => {
            if declared.len() != referenced_pks.len() {
                return Err(arity_mismatch(state, entity_index, item, declared.len(), referenced_pks));
            }
            let mut local = Vec::with_capacity(declared.len());
            for (position, join_column) in declared.iter().enumerate() {
                let spec = match &join_column.referenced_property {
                    Some(property) => referenced_pks
                        .iter()
                        .find(|s| &s.property == property)
                        .ok_or_else(|| {
                            MetadataError::declaration_on(
                                &state.entities[entity_index].name,
                                &item.property,
                                format!(
                                    "referenced column \"{}\" is not a primary key of the target",
                                    property
                                ),
                            )
                        })?,
                    None => &referenced_pks[position],
                };
                local.push(local_column(state, entity_index, item, join_column.name.as_deref(), spec));
            }
            local
        }
        // No names declared: synthesize one mirror per referenced primary
        // column.
        _ => referenced_pks
            .iter()
            .map(|spec| local_column(state, entity_index, item, None, spec))
            .collect(),
    };
    push_foreign_key(state, entity_index, item, local, referenced_pks);
    Ok(())
}

/// Find or synthesize the local join column mirroring `spec`.
fn local_column(
    state: &mut BuildState,
    entity_index: usize,
    item: &WorkItem,
    declared_name: Option<&str>,
    spec: &PkSpec,
) -> usize {
    let column_name = declared_name
        .map(str::to_string)
        .unwrap_or_else(|| naming::join_column_name(&item.property, &spec.column_name));

    let entity = &mut state.entities[entity_index];
    if let Some(existing) = entity
        .columns
        .iter()
        .position(|c| c.column_name == column_name)
    {
        return existing;
    }

    entity.columns.push(ColumnMetadata {
        property_name: format!("{}_{}", item.property, spec.property),
        column_name,
        ty: spec.ty,
        nullable: item.nullable,
        length: spec.length,
        default: None,
        generated: relmodel_core::Generated::None,
        primary: false,
        unique: item.kind == RelationKind::OneToOne,
        embedded_prefix: None,
        is_virtual: true,
        is_discriminator: false,
        referenced_column: Some(spec.column),
        closure_side: None,
    });
    entity.columns.len() - 1
}

fn push_foreign_key(
    state: &mut BuildState,
    entity_index: usize,
    item: &WorkItem,
    local: Vec<usize>,
    referenced_pks: &[PkSpec],
) {
    let entity = &mut state.entities[entity_index];
    let local_names: Vec<&str> = local
        .iter()
        .map(|&i| entity.columns[i].column_name.as_str())
        .collect();
    let name = naming::foreign_key_name(&entity.table_name, &local_names);
    let foreign_key_index = entity.foreign_keys.len();
    entity.foreign_keys.push(ForeignKeyMetadata {
        name,
        referenced_entity: item.target,
        columns: local.clone(),
        referenced_columns: referenced_pks.iter().map(|s| s.column).collect(),
        on_delete: item.on_delete,
        on_update: item.on_update,
    });
    entity.relations[item.relation_index].join_columns = local;
    entity.relations[item.relation_index].foreign_key = Some(foreign_key_index);
    tracing::debug!(
        entity = %entity.name,
        relation = %item.property,
        "synthesized foreign key"
    );
}

fn arity_mismatch(
    state: &BuildState,
    entity_index: usize,
    item: &WorkItem,
    local: usize,
    referenced_pks: &[PkSpec],
) -> MetadataError {
    MetadataError::ArityMismatch {
        entity: state.entities[entity_index].name.clone(),
        referenced: state.entities[item.target.index()].name.clone(),
        local,
        referenced_count: referenced_pks.len(),
    }
}
