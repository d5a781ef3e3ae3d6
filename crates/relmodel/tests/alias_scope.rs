//! Query-scope aliases over a finished graph.

use relmodel::prelude::*;

fn graph() -> relmodel::SchemaGraph {
    let registry = DeclarationRegistry::new()
        .with(
            EntityDeclaration::new("Post")
                .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
                .relation(RelationDeclaration::many_to_many("categories", "Category")),
        )
        .with(
            EntityDeclaration::new("Category")
                .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true)),
        );
    MetadataBuilder::new(registry).build().unwrap()
}

#[test]
fn checked_access_avoids_the_failure_path() {
    let alias = Alias::new(AliasKind::From, "p");
    // Existence check never fails; the unchecked accessor fails loudly.
    assert!(!alias.has_metadata());
    assert!(matches!(
        alias.metadata().unwrap_err(),
        MetadataError::MetadataNotAttached { .. }
    ));
}

#[test]
fn scope_binds_aliases_to_graph_entities() {
    let graph = graph();
    let mut scope = QueryScope::new(&graph);
    scope.create_alias(AliasKind::From, "p", "Post").unwrap();
    scope.create_alias(AliasKind::Join, "c", "Category").unwrap();

    let p = scope.alias("p").unwrap();
    assert!(p.has_metadata());
    assert_eq!(p.metadata().unwrap().table_name, "post");
    assert_eq!(p.target().unwrap(), Some("Post"));
}

#[test]
fn junction_entities_are_addressable_but_targetless() {
    let graph = graph();
    let mut scope = QueryScope::new(&graph);
    scope
        .create_alias(AliasKind::Join, "pc", "post_categories_category")
        .unwrap();
    let pc = scope.alias("pc").unwrap();
    assert!(pc.has_metadata());
    // Synthesized tables map no structural type.
    assert_eq!(pc.target().unwrap(), None);
}

#[test]
fn sub_query_aliases_never_carry_metadata() {
    let graph = graph();
    let mut scope = QueryScope::new(&graph);
    scope.create_sub_query_alias("recent", "SELECT id FROM post LIMIT 10");
    let recent = scope.alias("recent").unwrap();
    assert!(!recent.has_metadata());
    assert!(recent.metadata().is_err());
}

#[test]
fn aliases_are_scoped_not_persistent() {
    let graph = graph();
    {
        let mut scope = QueryScope::new(&graph);
        scope.create_alias(AliasKind::From, "p", "Post").unwrap();
        assert!(scope.alias("p").is_some());
    }
    // A new scope starts empty; nothing leaked into the graph.
    let scope = QueryScope::new(&graph);
    assert!(scope.alias("p").is_none());
}
