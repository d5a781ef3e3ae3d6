//! Closure-tree resolution, end to end.

use relmodel::prelude::*;

fn tree_category(with_level: bool) -> DeclarationRegistry {
    DeclarationRegistry::new().with(
        EntityDeclaration::new("Category")
            .tree(TreeDeclaration { with_level })
            .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
            .column(ColumnDeclaration::new("name", ColumnType::Text))
            .relation(RelationDeclaration::tree_parent("parent").inverse("children"))
            .relation(RelationDeclaration::tree_children("children").inverse("parent")),
    )
}

#[test]
fn tree_entity_resolves_to_closure_junction() {
    let graph = MetadataBuilder::new(tree_category(false)).build().unwrap();
    assert_eq!(graph.len(), 2);

    let category = graph.entity_by_name("Category").unwrap();
    let junction = graph.entity_by_name("category_closure").unwrap();
    assert_eq!(junction.kind, TableKind::ClosureJunction);
    assert_eq!(category.closure_junction, Some(junction.id));
    assert_eq!(junction.closure_parent, Some(category.id));

    // Exactly two virtual columns, both primary, tagged ancestor then
    // descendant, each referencing Category.id.
    assert_eq!(junction.columns.len(), 2);
    assert_eq!(junction.columns[0].column_name, "id_ancestor");
    assert_eq!(junction.columns[1].column_name, "id_descendant");
    assert!(junction.columns.iter().all(|c| c.primary && c.is_virtual));
    for column in &junction.columns {
        let source = column.referenced_column.unwrap();
        assert_eq!(source.entity, category.id);
        assert_eq!(graph.column(source).column_name, "id");
    }

    assert_eq!(junction.foreign_keys.len(), 2);
    for fk in &junction.foreign_keys {
        assert_eq!(fk.referenced_entity, category.id);
        assert_eq!(fk.columns.len(), 1);
        assert_eq!(fk.referenced_columns.len(), 1);
    }
}

#[test]
fn closure_completeness_for_composite_keys() {
    // Primary key arity k = 2: the junction must carry exactly 2k columns
    // (+1 with a level column), the first k ancestors, the next k
    // descendants, all primary.
    let registry = DeclarationRegistry::new().with(
        EntityDeclaration::new("Node")
            .tree(TreeDeclaration { with_level: true })
            .column(ColumnDeclaration::new("realm", ColumnType::Varchar).length(16).primary(true))
            .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
            .relation(RelationDeclaration::tree_parent("parent")),
    );
    let graph = MetadataBuilder::new(registry).build().unwrap();
    let junction = graph.entity_by_name("node_closure").unwrap();

    assert_eq!(junction.columns.len(), 5);
    assert_eq!(junction.primary_columns, vec![0, 1, 2, 3]);
    let sides: Vec<_> = junction.columns.iter().map(|c| c.closure_side).collect();
    assert_eq!(
        sides,
        vec![
            Some(relmodel::ClosureSide::Ancestor),
            Some(relmodel::ClosureSide::Ancestor),
            Some(relmodel::ClosureSide::Descendant),
            Some(relmodel::ClosureSide::Descendant),
            None,
        ]
    );
}

#[test]
fn level_column_uses_dialect_mapping() {
    let sqlite = MetadataBuilder::new(tree_category(true))
        .dialect(Dialect::Sqlite)
        .build()
        .unwrap();
    let postgres = MetadataBuilder::new(tree_category(true))
        .dialect(Dialect::Postgres)
        .build()
        .unwrap();

    let level_sqlite = sqlite
        .entity_by_name("category_closure")
        .unwrap()
        .column_by_name("level")
        .unwrap()
        .ty;
    let level_postgres = postgres
        .entity_by_name("category_closure")
        .unwrap()
        .column_by_name("level")
        .unwrap()
        .ty;
    assert_eq!(level_sqlite, Dialect::Sqlite.tree_level_type());
    assert_eq!(level_postgres, Dialect::Postgres.tree_level_type());
    assert_ne!(level_sqlite, level_postgres);
}

#[test]
fn tree_parent_edge_materializes_on_the_entity_itself() {
    let graph = MetadataBuilder::new(tree_category(false)).build().unwrap();
    let category = graph.entity_by_name("Category").unwrap();

    let parent = category.relation("parent").unwrap();
    assert!(parent.owning);
    assert_eq!(parent.target, category.id);
    let join = category.column_by_name("parent_id").unwrap();
    assert!(join.is_virtual);
    assert!(join.nullable); // the root has no parent

    let children = category.relation("children").unwrap();
    assert!(!children.owning);
    assert_eq!(
        graph.relation(children.inverse.unwrap()).property_name,
        "parent"
    );
}
