//! Column resolution.
//!
//! Turns raw column declarations into [`ColumnMetadata`], flattening embedded
//! structures onto the declaring entity. Embedding never creates a table: a
//! field `address.city` on `Person` becomes column `address_city` on
//! `Person`'s own table.
//!
//! An entity with zero primary-key columns is *not* rejected here;
//! inheritance may still contribute one, so that invariant belongs to the
//! final validator.

use relmodel_core::{MetadataError, Result};

use crate::declaration::{ColumnDeclaration, EmbeddedDeclaration, EmbeddedPrefix, EntityDeclaration};
use crate::graph::{ColumnMetadata, IndexMetadata};
use crate::naming;
use crate::registry::DeclarationRegistry;

use super::BuildState;

pub(crate) fn resolve(state: &mut BuildState, registry: &DeclarationRegistry) -> Result<()> {
    for entity_index in 0..state.entities.len() {
        let Some(decl_index) = state.decl_of[entity_index] else {
            continue;
        };
        let decl = &registry.entities()[decl_index];

        let mut columns = Vec::new();
        for column in &decl.columns {
            columns.push(resolve_column(column, None));
        }
        for embedded in &decl.embeddeds {
            flatten_embedded(decl, embedded, "", "", &mut columns)?;
        }

        let entity = &mut state.entities[entity_index];
        entity.primary_columns = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.primary)
            .map(|(i, _)| i)
            .collect();
        tracing::debug!(
            entity = %entity.name,
            columns = columns.len(),
            primary = entity.primary_columns.len(),
            "resolved columns"
        );
        entity.columns = columns;
    }
    Ok(())
}

fn resolve_column(decl: &ColumnDeclaration, prefix: Option<&str>) -> ColumnMetadata {
    let base_name = decl
        .column_name
        .clone()
        .unwrap_or_else(|| naming::column_name(&decl.property));
    let column_name = match prefix {
        Some(prefix) => format!("{}{}", prefix, base_name),
        None => base_name,
    };
    ColumnMetadata {
        property_name: decl.property.clone(),
        column_name,
        ty: decl.ty,
        nullable: decl.nullable,
        length: decl.length,
        default: decl.default.clone(),
        generated: decl.generated,
        primary: decl.primary,
        unique: decl.unique,
        embedded_prefix: prefix.map(str::to_string),
        is_virtual: false,
        is_discriminator: false,
        referenced_column: None,
        closure_side: None,
    }
}

/// Recursively flatten an embedded structure.
///
/// `path` is the dotted property path of the enclosing embeddeds; `prefix`
/// is the accumulated column-name prefix.
fn flatten_embedded(
    entity: &EntityDeclaration,
    embedded: &EmbeddedDeclaration,
    path: &str,
    prefix: &str,
    out: &mut Vec<ColumnMetadata>,
) -> Result<()> {
    let own_prefix = match &embedded.prefix {
        EmbeddedPrefix::Property => format!("{}_", naming::column_name(&embedded.property)),
        EmbeddedPrefix::Custom(custom) => format!("{}_", custom),
        EmbeddedPrefix::None => String::new(),
    };
    let full_prefix = format!("{}{}", prefix, own_prefix);
    let full_path = if path.is_empty() {
        embedded.property.clone()
    } else {
        format!("{}.{}", path, embedded.property)
    };

    for column in &embedded.columns {
        if column.primary {
            // A primary key cannot live inside an embedded structure; it
            // would be invisible to foreign-key pairing.
            return Err(MetadataError::declaration_on(
                &entity.name,
                format!("{}.{}", full_path, column.property),
                "embedded columns cannot be primary keys",
            ));
        }
        let mut resolved = resolve_column(column, Some(&full_prefix));
        resolved.property_name = format!("{}.{}", full_path, column.property);
        out.push(resolved);
    }
    for nested in &embedded.embeddeds {
        flatten_embedded(entity, nested, &full_path, &full_prefix, out)?;
    }
    Ok(())
}

/// Resolve declared indices against the (post-inheritance) column sets.
pub(crate) fn resolve_indices(state: &mut BuildState, registry: &DeclarationRegistry) -> Result<()> {
    for entity_index in 0..state.entities.len() {
        let Some(decl_index) = state.decl_of[entity_index] else {
            continue;
        };
        let decl = &registry.entities()[decl_index];
        if decl.indices.is_empty() {
            continue;
        }

        let entity = &mut state.entities[entity_index];
        let mut indices = Vec::with_capacity(decl.indices.len());
        for index_decl in &decl.indices {
            let mut column_indices = Vec::with_capacity(index_decl.properties.len());
            for property in &index_decl.properties {
                let position = entity
                    .columns
                    .iter()
                    .position(|c| &c.property_name == property)
                    .ok_or_else(|| {
                        MetadataError::declaration_on(
                            &entity.name,
                            property.clone(),
                            "indexed column is not declared on this entity",
                        )
                    })?;
                column_indices.push(position);
            }
            let column_names: Vec<&str> = column_indices
                .iter()
                .map(|&i| entity.columns[i].column_name.as_str())
                .collect();
            let name = index_decl
                .name
                .clone()
                .unwrap_or_else(|| naming::index_name(&entity.table_name, &column_names, index_decl.unique));
            indices.push(IndexMetadata {
                name,
                columns: column_indices,
                unique: index_decl.unique,
            });
        }
        entity.indices = indices;
    }
    Ok(())
}
