//! Relation resolution.
//!
//! Pass 2 of the two-pass protocol: every entity skeleton already exists, so
//! lazy target handles can be dereferenced even when two entities reference
//! each other. Inverse sides resolve afterwards, once every relation on
//! every entity is materialized.
//!
//! Owning-side rules: many-to-one is always owning; one-to-one is owning
//! only on the side that declares the join column; one-to-many and
//! many-to-many are never owning. Tree edges are a constrained
//! many-to-one/one-to-many pair on the same entity.

use relmodel_core::{MetadataError, Result};

use crate::declaration::{InverseSide, RelationDeclaration, RelationKind};
use crate::graph::{EntityId, RelationMetadata, RelationRef, TableKind};
use crate::naming;
use crate::registry::DeclarationRegistry;

use super::{BuildState, RelationSource};

pub(crate) fn resolve(state: &mut BuildState, registry: &DeclarationRegistry) -> Result<()> {
    materialize(state, registry)?;
    synthesize_parent_links(state);
    resolve_inverse_sides(state, registry)?;
    Ok(())
}

fn materialize(state: &mut BuildState, registry: &DeclarationRegistry) -> Result<()> {
    for entity_index in 0..state.entities.len() {
        if state.decl_of[entity_index].is_none() {
            continue;
        }
        for (decl_entity, decl_relation) in effective_relation_decls(state, registry, entity_index) {
            let rel_decl = &registry.entities()[decl_entity].relations[decl_relation];
            let target = resolve_target(state, registry, entity_index, rel_decl)?;
            let owning = match rel_decl.kind {
                RelationKind::ManyToOne | RelationKind::TreeParent => true,
                RelationKind::OneToOne => rel_decl.join_columns.is_some(),
                RelationKind::OneToMany
                | RelationKind::ManyToMany
                | RelationKind::TreeChildren => false,
            };
            let relation = RelationMetadata {
                property_name: rel_decl.property.clone(),
                kind: rel_decl.kind,
                target,
                owning,
                nullable: rel_decl.nullable,
                inverse: None,
                join_columns: Vec::new(),
                junction: None,
                foreign_key: None,
            };
            let relation_index = state.entities[entity_index].relations.len();
            state.entities[entity_index].relations.push(relation);
            state.relation_sources.insert(
                (entity_index, relation_index),
                RelationSource::Declared {
                    decl_entity,
                    decl_relation,
                },
            );
        }
        tracing::debug!(
            entity = %state.entities[entity_index].name,
            relations = state.entities[entity_index].relations.len(),
            "resolved relations"
        );
    }
    Ok(())
}

/// Relation declarations effective on an entity: its own, plus the ancestor
/// chain's for single-table children (closest redeclaration wins).
fn effective_relation_decls(
    state: &BuildState,
    registry: &DeclarationRegistry,
    entity_index: usize,
) -> Vec<(usize, usize)> {
    let mut chain = vec![entity_index];
    if state.entities[entity_index].kind == TableKind::SingleTableChild {
        let mut cursor = state.entities[entity_index].parent;
        while let Some(parent) = cursor {
            chain.push(parent.index());
            cursor = state.entities[parent.index()].parent;
        }
    }
    chain.reverse(); // root first, so closer levels override

    let mut effective: Vec<(&str, (usize, usize))> = Vec::new();
    for level in chain {
        let Some(decl_index) = state.decl_of[level] else {
            continue;
        };
        let decl = &registry.entities()[decl_index];
        for (relation_index, relation) in decl.relations.iter().enumerate() {
            match effective.iter_mut().find(|(p, _)| *p == relation.property) {
                Some(slot) => slot.1 = (decl_index, relation_index),
                None => effective.push((&relation.property, (decl_index, relation_index))),
            }
        }
    }
    effective.into_iter().map(|(_, source)| source).collect()
}

fn resolve_target(
    state: &BuildState,
    registry: &DeclarationRegistry,
    entity_index: usize,
    rel_decl: &RelationDeclaration,
) -> Result<EntityId> {
    let entity = &state.entities[entity_index];
    if rel_decl.kind.is_tree() {
        let tree = state.decl_of[entity_index].and_then(|i| registry.entities()[i].tree);
        if tree.is_none() {
            return Err(MetadataError::declaration_on(
                &entity.name,
                &rel_decl.property,
                "tree relation declared on an entity without tree behavior",
            ));
        }
        if !rel_decl.target.is_empty() {
            let target = state.lookup_handle(&rel_decl.target);
            if target != Some(entity.id) {
                return Err(MetadataError::declaration_on(
                    &entity.name,
                    &rel_decl.property,
                    "tree relations are self-referential",
                ));
            }
        }
        return Ok(entity.id);
    }
    if rel_decl.target.is_empty() {
        return Err(MetadataError::declaration_on(
            &entity.name,
            &rel_decl.property,
            "relation has no resolvable target",
        ));
    }
    state.lookup_handle(&rel_decl.target).ok_or_else(|| {
        MetadataError::relation(
            &entity.name,
            &rel_decl.property,
            format!("target \"{}\" is not registered", rel_decl.target),
        )
    })
}

/// Realize the pending class-table parent links as owning one-to-one
/// relations; foreign-key synthesis joins them on the child's primary key.
fn synthesize_parent_links(state: &mut BuildState) {
    for (child, parent) in std::mem::take(&mut state.pending_parent_links) {
        let property = naming::column_name(&state.entities[parent.index()].name);
        let relation = RelationMetadata {
            property_name: property,
            kind: RelationKind::OneToOne,
            target: parent,
            owning: true,
            nullable: false,
            inverse: None,
            join_columns: Vec::new(),
            junction: None,
            foreign_key: None,
        };
        let relation_index = state.entities[child.index()].relations.len();
        state.entities[child.index()].relations.push(relation);
        state
            .relation_sources
            .insert((child.index(), relation_index), RelationSource::ParentLink);
    }
}

fn resolve_inverse_sides(state: &mut BuildState, registry: &DeclarationRegistry) -> Result<()> {
    for entity_index in 0..state.entities.len() {
        for relation_index in 0..state.entities[entity_index].relations.len() {
            let Some(RelationSource::Declared {
                decl_entity,
                decl_relation,
            }) = state.relation_sources.get(&(entity_index, relation_index)).copied()
            else {
                continue;
            };
            let rel_decl = &registry.entities()[decl_entity].relations[decl_relation];
            let Some(inverse) = rel_decl.inverse else {
                if rel_decl.kind == RelationKind::OneToMany {
                    tracing::warn!(
                        entity = %state.entities[entity_index].name,
                        property = %rel_decl.property,
                        "one-to-many relation without an inverse side cannot place its foreign key"
                    );
                }
                continue;
            };

            let entity_name = state.entities[entity_index].name.clone();
            let property = rel_decl.property.clone();
            let target = state.entities[entity_index].relations[relation_index].target;
            let target_entity = &state.entities[target.index()];
            let names: Vec<&str> = target_entity
                .relations
                .iter()
                .map(|r| r.property_name.as_str())
                .collect();

            let chosen = match inverse {
                InverseSide::Property(name) => name.to_string(),
                InverseSide::Selector(selector) => selector(&names).ok_or_else(|| {
                    MetadataError::relation(
                        &entity_name,
                        &property,
                        format!(
                            "inverse-side selector matched no relation on \"{}\"",
                            target_entity.name
                        ),
                    )
                })?,
            };
            let index = names.iter().position(|n| *n == chosen).ok_or_else(|| {
                MetadataError::relation(
                    &entity_name,
                    &property,
                    format!(
                        "inverse side \"{}\" does not exist on \"{}\"",
                        chosen, target_entity.name
                    ),
                )
            })?;

            state.entities[entity_index].relations[relation_index].inverse = Some(RelationRef {
                entity: target,
                index,
            });
        }
    }
    Ok(())
}
