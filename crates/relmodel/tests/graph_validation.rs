//! Build failure modes: the graph is validated as a whole, and a failed
//! build never leaks a partial graph.

use relmodel::prelude::*;

#[test]
fn entity_without_primary_key_fails_at_build_time() {
    let registry = DeclarationRegistry::new().with(
        EntityDeclaration::new("Orphan")
            .column(ColumnDeclaration::new("name", ColumnType::Text)),
    );
    let err = MetadataBuilder::new(registry).build().unwrap_err();
    match err {
        MetadataError::GraphValidation { violations } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].entity, "Orphan");
        }
        other => panic!("expected GraphValidation, got: {other}"),
    }
}

#[test]
fn inherited_primary_key_satisfies_the_invariant() {
    // The child declares no primary key of its own; the parent contributes
    // one through the inheritance chain.
    let registry = DeclarationRegistry::new()
        .with(
            EntityDeclaration::new("Person")
                .class_table()
                .column(ColumnDeclaration::new("id", ColumnType::BigInt).primary(true)),
        )
        .with(
            EntityDeclaration::new("Student")
                .child_of("Person")
                .column(ColumnDeclaration::new("grade", ColumnType::Text)),
        );
    assert!(MetadataBuilder::new(registry).build().is_ok());
}

#[test]
fn all_violations_are_reported_together() {
    let registry = DeclarationRegistry::new()
        .with(
            EntityDeclaration::new("NoKey")
                .column(ColumnDeclaration::new("name", ColumnType::Text)),
        )
        .with(
            EntityDeclaration::new("Collide")
                .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
                .column(ColumnDeclaration::new("body", ColumnType::Text))
                .column(ColumnDeclaration::new("content", ColumnType::Text).column_name("body")),
        );
    let err = MetadataBuilder::new(registry).build().unwrap_err();
    match err {
        MetadataError::GraphValidation { violations } => {
            assert!(violations.iter().any(|v| v.entity == "NoKey"));
            assert!(violations.iter().any(|v| v.entity == "Collide"));
        }
        other => panic!("expected GraphValidation, got: {other}"),
    }
}

#[test]
fn relation_target_failures_carry_entity_and_property() {
    let registry = DeclarationRegistry::new().with(
        EntityDeclaration::new("Post")
            .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
            .relation(RelationDeclaration::many_to_one("author", "User")),
    );
    let err = MetadataBuilder::new(registry).build().unwrap_err();
    let text = err.to_string();
    assert!(text.contains("Post"));
    assert!(text.contains("author"));
    assert!(text.contains("User"));
}

#[test]
fn foreign_key_arity_mismatch_is_fatal() {
    let registry = DeclarationRegistry::new()
        .with(
            EntityDeclaration::new("Shipment")
                .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
                .relation(
                    RelationDeclaration::many_to_one("item", "OrderItem")
                        .join_columns(vec![JoinColumnDeclaration::named("item_id")]),
                ),
        )
        .with(
            EntityDeclaration::new("OrderItem")
                .column(ColumnDeclaration::new("orderId", ColumnType::Integer).primary(true))
                .column(ColumnDeclaration::new("sku", ColumnType::Varchar).length(64).primary(true)),
        );
    let err = MetadataBuilder::new(registry).build().unwrap_err();
    assert!(matches!(err, MetadataError::ArityMismatch { .. }));
}

#[test]
fn embedded_structures_flatten_onto_the_owning_table() {
    let registry = DeclarationRegistry::new().with(
        EntityDeclaration::new("Person")
            .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
            .embedded(
                EmbeddedDeclaration::new("address")
                    .column(ColumnDeclaration::new("city", ColumnType::Text))
                    .column(ColumnDeclaration::new("zip", ColumnType::Varchar).length(16)),
            ),
    );
    let graph = MetadataBuilder::new(registry).build().unwrap();
    // Embedding never creates a table.
    assert_eq!(graph.len(), 1);
    let person = graph.entity_by_name("Person").unwrap();
    assert!(person.column_by_name("address_city").is_some());
    assert!(person.column_by_name("address_zip").is_some());
}

#[test]
fn flattening_collisions_are_caught_by_validation() {
    let registry = DeclarationRegistry::new().with(
        EntityDeclaration::new("Person")
            .column(ColumnDeclaration::new("id", ColumnType::Integer).primary(true))
            .column(ColumnDeclaration::new("addressCity", ColumnType::Text))
            .embedded(
                EmbeddedDeclaration::new("address")
                    .column(ColumnDeclaration::new("city", ColumnType::Text)),
            ),
    );
    let err = MetadataBuilder::new(registry).build().unwrap_err();
    match err {
        MetadataError::GraphValidation { violations } => {
            assert!(violations.iter().any(|v| v.message.contains("address_city")));
        }
        other => panic!("expected GraphValidation, got: {other}"),
    }
}
