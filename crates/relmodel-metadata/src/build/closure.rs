//! Closure junction synthesis.
//!
//! A tree entity materializes its reachability relation in a closure table:
//! one row per (ancestor, descendant) pair, including the reflexive pair.
//! The junction carries, for every primary-key column of the source entity,
//! one ancestor-tagged and one descendant-tagged virtual column, both
//! primary and both referencing the source column, plus an optional depth
//! column typed by the active dialect. Exactly two foreign keys point the
//! ancestor and descendant column sets back at the source primary key.

use relmodel_core::{Dialect, Result};

use crate::graph::{
    ClosureSide, ColumnMetadata, EntityId, EntityMetadata, ForeignKeyMetadata, TableKind,
};
use crate::naming;
use crate::registry::DeclarationRegistry;

use super::{BuildState, PkSpec};

pub(crate) fn synthesize(
    state: &mut BuildState,
    registry: &DeclarationRegistry,
    dialect: Dialect,
) -> Result<()> {
    let declared_count = state.entities.len();
    for entity_index in 0..declared_count {
        let Some(decl_index) = state.decl_of[entity_index] else {
            continue;
        };
        let Some(tree) = registry.entities()[decl_index].tree else {
            continue;
        };
        // Rebuilding against the same source metadata must not duplicate.
        if state.entities[entity_index].closure_junction.is_some() {
            continue;
        }
        let source_id = state.entities[entity_index].id;
        let source_pks = state.pk_specs(source_id);
        if source_pks.is_empty() {
            // The validator reports the missing primary key on the source.
            continue;
        }

        let source_table = state.entities[entity_index].table_name.clone();
        let table_name = naming::closure_table_name(&source_table);

        // First the ancestor set, then the descendant set; the positional
        // split fixes the two foreign keys below.
        let mut columns: Vec<ColumnMetadata> = Vec::with_capacity(source_pks.len() * 2 + 1);
        for spec in &source_pks {
            columns.push(closure_column(spec, ClosureSide::Ancestor));
        }
        for spec in &source_pks {
            columns.push(closure_column(spec, ClosureSide::Descendant));
        }
        let primary_columns: Vec<usize> = (0..columns.len()).collect();

        if tree.with_level {
            columns.push(ColumnMetadata {
                property_name: "level".to_string(),
                column_name: "level".to_string(),
                ty: dialect.tree_level_type(),
                nullable: false,
                length: None,
                default: None,
                generated: relmodel_core::Generated::None,
                primary: false,
                unique: false,
                embedded_prefix: None,
                is_virtual: true,
                is_discriminator: false,
                referenced_column: None,
                closure_side: None,
            });
        }

        let arity = source_pks.len();
        let ancestor_names: Vec<&str> = columns[..arity]
            .iter()
            .map(|c| c.column_name.as_str())
            .collect();
        let descendant_names: Vec<&str> = columns[arity..arity * 2]
            .iter()
            .map(|c| c.column_name.as_str())
            .collect();
        let foreign_keys = vec![
            ForeignKeyMetadata {
                name: naming::foreign_key_name(&table_name, &ancestor_names),
                referenced_entity: source_id,
                columns: (0..arity).collect(),
                referenced_columns: source_pks.iter().map(|s| s.column).collect(),
                on_delete: None,
                on_update: None,
            },
            ForeignKeyMetadata {
                name: naming::foreign_key_name(&table_name, &descendant_names),
                referenced_entity: source_id,
                columns: (arity..arity * 2).collect(),
                referenced_columns: source_pks.iter().map(|s| s.column).collect(),
                on_delete: None,
                on_update: None,
            },
        ];

        let junction_id = state.push_synthesized(EntityMetadata {
            id: EntityId::new(0), // reassigned by push_synthesized
            name: table_name.clone(),
            table_name,
            target: None,
            kind: TableKind::ClosureJunction,
            columns,
            relations: Vec::new(),
            foreign_keys,
            indices: Vec::new(),
            primary_columns,
            parent: None,
            closure_parent: Some(source_id),
            closure_junction: None,
            discriminator_value: None,
        });
        state.entities[entity_index].closure_junction = Some(junction_id);
        tracing::debug!(
            source = %state.entities[entity_index].name,
            junction = %state.entities[junction_id.index()].name,
            "synthesized closure junction"
        );
    }
    Ok(())
}

fn closure_column(spec: &PkSpec, side: ClosureSide) -> ColumnMetadata {
    let name = naming::closure_column_name(&spec.property, side);
    ColumnMetadata {
        property_name: name.clone(),
        column_name: name,
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
        closure_side: Some(side),
    }
}

#[cfg(test)]
mod tests {
    use relmodel_core::{ColumnType, Dialect};

    use crate::declaration::{
        ColumnDeclaration, EntityDeclaration, RelationDeclaration, TreeDeclaration,
    };
    use crate::graph::{ClosureSide, TableKind};
    use crate::registry::DeclarationRegistry;

    use super::super::{BuildState, columns, foreign_keys, inheritance, junction, relations};

    fn resolve(registry: &DeclarationRegistry, dialect: Dialect) -> BuildState {
        let mut state = BuildState::register(registry).unwrap();
        columns::resolve(&mut state, registry).unwrap();
        inheritance::resolve(&mut state, registry).unwrap();
        relations::resolve(&mut state, registry).unwrap();
        foreign_keys::synthesize(&mut state, registry).unwrap();
        junction::synthesize(&mut state, registry).unwrap();
        super::synthesize(&mut state, registry, dialect).unwrap();
        state
    }

    fn tree_category(with_level: bool) -> DeclarationRegistry {
        DeclarationRegistry::new().with(
            EntityDeclaration::new("Category")
                .tree(TreeDeclaration { with_level })
                .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
                .relation(RelationDeclaration::tree_parent("parent"))
                .relation(RelationDeclaration::tree_children("children")),
        )
    }

    #[test]
    fn test_closure_junction_shape() {
        let state = resolve(&tree_category(false), Dialect::Postgres);
        assert_eq!(state.entities.len(), 2);
        let junction = &state.entities[1];
        assert_eq!(junction.kind, TableKind::ClosureJunction);
        assert_eq!(junction.table_name, "category_closure");
        assert_eq!(junction.closure_parent, Some(state.entities[0].id));
        assert_eq!(state.entities[0].closure_junction, Some(junction.id));

        assert_eq!(junction.columns.len(), 2);
        assert_eq!(junction.columns[0].column_name, "id_ancestor");
        assert_eq!(junction.columns[1].column_name, "id_descendant");
        assert_eq!(junction.columns[0].closure_side, Some(ClosureSide::Ancestor));
        assert_eq!(junction.columns[1].closure_side, Some(ClosureSide::Descendant));
        assert!(junction.columns.iter().all(|c| c.primary && c.is_virtual));

        assert_eq!(junction.foreign_keys.len(), 2);
        for fk in &junction.foreign_keys {
            assert_eq!(fk.referenced_entity, state.entities[0].id);
            assert_eq!(fk.columns.len(), 1);
            assert_eq!(fk.referenced_columns.len(), 1);
        }
    }

    #[test]
    fn test_level_column_typed_by_dialect() {
        let state = resolve(&tree_category(true), Dialect::Sqlite);
        let junction = &state.entities[1];
        assert_eq!(junction.columns.len(), 3);
        let level = junction.column_by_name("level").unwrap();
        assert_eq!(level.ty, Dialect::Sqlite.tree_level_type());
        assert!(!level.primary);
        // The level column is not part of the junction's primary key.
        assert_eq!(junction.primary_columns, vec![0, 1]);
    }

    #[test]
    fn test_composite_key_closure_completeness() {
        // Arity k=2: the junction gets 2k columns, first k ancestors, next
        // k descendants, all primary.
        let registry = DeclarationRegistry::new().with(
            EntityDeclaration::new("Node")
                .tree(TreeDeclaration::default())
                .column(ColumnDeclaration::new("realm", ColumnType::Varchar).length(16).primary(true))
                .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
                .relation(RelationDeclaration::tree_parent("parent")),
        );
        let state = resolve(&registry, Dialect::Postgres);
        let junction = &state.entities[1];
        assert_eq!(junction.columns.len(), 4);
        let names: Vec<&str> = junction.columns.iter().map(|c| c.column_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["realm_ancestor", "id_ancestor", "realm_descendant", "id_descendant"]
        );
        assert!(
            junction.columns[..2]
                .iter()
                .all(|c| c.closure_side == Some(ClosureSide::Ancestor))
        );
        assert!(
            junction.columns[2..]
                .iter()
                .all(|c| c.closure_side == Some(ClosureSide::Descendant))
        );
        assert!(junction.columns.iter().all(|c| c.primary));
        assert_eq!(junction.columns[0].length, Some(16));
        assert_eq!(junction.foreign_keys[0].columns, vec![0, 1]);
        assert_eq!(junction.foreign_keys[1].columns, vec![2, 3]);
    }

    #[test]
    fn test_repeated_synthesis_is_idempotent() {
        let registry = tree_category(true);
        let mut state = BuildState::register(&registry).unwrap();
        columns::resolve(&mut state, &registry).unwrap();
        inheritance::resolve(&mut state, &registry).unwrap();
        relations::resolve(&mut state, &registry).unwrap();
        foreign_keys::synthesize(&mut state, &registry).unwrap();
        super::synthesize(&mut state, &registry, Dialect::Postgres).unwrap();
        let after_first = state.entities.len();
        super::synthesize(&mut state, &registry, Dialect::Postgres).unwrap();
        assert_eq!(state.entities.len(), after_first);
        assert_eq!(state.entities[1].columns.len(), 3);
    }

    #[test]
    fn test_tree_entity_also_keeps_materialized_parent_column() {
        let state = resolve(&tree_category(false), Dialect::Postgres);
        let category = &state.entities[0];
        assert!(category.column_by_name("parent_id").is_some());
        assert_eq!(category.foreign_keys.len(), 1);
    }
}
