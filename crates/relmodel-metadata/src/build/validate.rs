//! Final graph validation.
//!
//! Runs once over the fully assembled graph and aggregates every violation
//! it finds before failing, so a user fixing declarations sees the complete
//! list instead of one failure per rebuild. Any violation discards the
//! graph; downstream consumers never observe a partially-consistent schema.

use std::collections::HashMap;

use relmodel_core::{MetadataError, Result, Violation, is_valid_identifier};

use crate::graph::{EntityMetadata, RelationRef, TableKind};

use super::BuildState;

pub(crate) fn run(state: &BuildState) -> Result<()> {
    let mut violations = Vec::new();

    for entity in &state.entities {
        check_primary_key(entity, &mut violations);
        check_column_names(entity, &mut violations);
        check_identifiers(entity, &mut violations);
        check_foreign_keys(state, entity, &mut violations);
        check_virtual_columns(state, entity, &mut violations);
        check_relations(state, entity, &mut violations);
    }
    check_table_names(state, &mut violations);

    if violations.is_empty() {
        tracing::debug!(entities = state.entities.len(), "graph validation passed");
        Ok(())
    } else {
        tracing::debug!(count = violations.len(), "graph validation failed");
        Err(MetadataError::GraphValidation { violations })
    }
}

/// (a) Every primary table needs at least one primary-key column. Junction
/// tables are exempt: the composite of their foreign-key columns serves as
/// their primary key.
fn check_primary_key(entity: &EntityMetadata, violations: &mut Vec<Violation>) {
    if entity.primary_columns.is_empty() && !entity.kind.is_junction() {
        violations.push(Violation::new(
            &entity.name,
            "entity has no primary-key column and inherits none",
        ));
    }
}

/// (e) No column name may collide within one table after flattening and
/// synthesis.
fn check_column_names(entity: &EntityMetadata, violations: &mut Vec<Violation>) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for column in &entity.columns {
        *seen.entry(column.column_name.as_str()).or_default() += 1;
    }
    let mut duplicates: Vec<&str> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect();
    duplicates.sort_unstable();
    for name in duplicates {
        violations.push(Violation::new(
            &entity.name,
            format!("duplicate column name \"{}\"", name),
        ));
    }
}

/// Physical names reach generated SQL verbatim; reject anything that is not
/// a plain identifier.
fn check_identifiers(entity: &EntityMetadata, violations: &mut Vec<Violation>) {
    if !is_valid_identifier(&entity.table_name) {
        violations.push(Violation::new(
            &entity.name,
            format!("invalid table name \"{}\"", entity.table_name),
        ));
    }
    for column in &entity.columns {
        if !is_valid_identifier(&column.column_name) {
            violations.push(Violation::new(
                &entity.name,
                format!("invalid column name \"{}\"", column.column_name),
            ));
        }
    }
}

/// (b) Foreign keys pair local and referenced columns positionally; both
/// lists and the referenced entity's primary key must agree in arity.
fn check_foreign_keys(state: &BuildState, entity: &EntityMetadata, violations: &mut Vec<Violation>) {
    for fk in &entity.foreign_keys {
        let referenced = &state.entities[fk.referenced_entity.index()];
        if fk.columns.len() != fk.referenced_columns.len()
            || fk.columns.len() != referenced.primary_columns.len()
        {
            violations.push(Violation::new(
                &entity.name,
                format!(
                    "foreign key \"{}\" has {} local column(s), {} referenced column(s), against {} primary column(s) on \"{}\"",
                    fk.name,
                    fk.columns.len(),
                    fk.referenced_columns.len(),
                    referenced.primary_columns.len(),
                    referenced.name
                ),
            ));
        }
    }
}

/// A virtual column must stay structurally identical to the column it
/// mirrors; synthesis keeps them in sync, this re-checks the result.
fn check_virtual_columns(state: &BuildState, entity: &EntityMetadata, violations: &mut Vec<Violation>) {
    for column in &entity.columns {
        let Some(referenced) = column.referenced_column else {
            continue;
        };
        let source = &state.entities[referenced.entity.index()].columns[referenced.index];
        if column.ty != source.ty || column.length != source.length {
            violations.push(Violation::new(
                &entity.name,
                format!(
                    "virtual column \"{}\" diverges from its referenced column \"{}\"",
                    column.column_name, source.column_name
                ),
            ));
        }
    }
}

/// (c) Owning relations must have join columns after synthesis; resolved
/// inverse sides must agree in kind and point back at each other.
fn check_relations(state: &BuildState, entity: &EntityMetadata, violations: &mut Vec<Violation>) {
    for (relation_index, relation) in entity.relations.iter().enumerate() {
        if relation.owning && relation.join_columns.is_empty() {
            violations.push(Violation::new(
                &entity.name,
                format!(
                    "owning relation \"{}\" has no join columns after synthesis",
                    relation.property_name
                ),
            ));
        }
        let Some(inverse) = relation.inverse else {
            continue;
        };
        let other = &state.entities[inverse.entity.index()].relations[inverse.index];
        if other.kind != relation.kind.inverse_kind() {
            violations.push(Violation::new(
                &entity.name,
                format!(
                    "relation \"{}\" and its inverse \"{}\" disagree in kind",
                    relation.property_name, other.property_name
                ),
            ));
        }
        if let Some(back) = other.inverse {
            let this = RelationRef {
                entity: entity.id,
                index: relation_index,
            };
            // Inherited copies on single-table children are answered by the
            // ancestor's relation of the same property; only the declaring
            // copy must be named back.
            let inherited = is_inherited_relation(state, entity, relation_index);
            if back != this && !inherited {
                violations.push(Violation::new(
                    &entity.name,
                    format!(
                        "relation \"{}\" names inverse \"{}\" but is not named back",
                        relation.property_name, other.property_name
                    ),
                ));
            }
        }
    }
}

fn is_inherited_relation(state: &BuildState, entity: &EntityMetadata, relation_index: usize) -> bool {
    match (
        state.decl_of[entity.id.index()],
        state.relation_sources.get(&(entity.id.index(), relation_index)),
    ) {
        (Some(own_decl), Some(super::RelationSource::Declared { decl_entity, .. })) => {
            *decl_entity != own_decl
        }
        _ => false,
    }
}

/// (d) No two entities may resolve to the same physical table unless they
/// form one single-table inheritance family.
fn check_table_names(state: &BuildState, violations: &mut Vec<Violation>) {
    let mut by_table: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, entity) in state.entities.iter().enumerate() {
        by_table.entry(entity.table_name.as_str()).or_default().push(index);
    }
    let mut tables: Vec<(&str, Vec<usize>)> = by_table.into_iter().collect();
    tables.sort_unstable_by_key(|(name, _)| *name);

    for (table, members) in tables {
        if members.len() < 2 || is_single_table_family(state, &members) {
            continue;
        }
        let names: Vec<&str> = members
            .iter()
            .map(|&i| state.entities[i].name.as_str())
            .collect();
        violations.push(Violation::new(
            names[0],
            format!("table \"{}\" is mapped by unrelated entities: {}", table, names.join(", ")),
        ));
    }
}

fn is_single_table_family(state: &BuildState, members: &[usize]) -> bool {
    let roots: Vec<usize> = members
        .iter()
        .copied()
        .filter(|&i| state.entities[i].kind != TableKind::SingleTableChild)
        .collect();
    let [root] = roots.as_slice() else {
        return false;
    };
    members.iter().all(|&member| {
        if member == *root {
            return true;
        }
        // Walk the parent chain; it must reach the shared root.
        let mut cursor = state.entities[member].parent;
        let mut hops = 0;
        while let Some(parent) = cursor {
            if parent.index() == *root {
                return true;
            }
            hops += 1;
            if hops > state.entities.len() {
                return false;
            }
            cursor = state.entities[parent.index()].parent;
        }
        false
    })
}
