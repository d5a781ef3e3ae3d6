//! Declaration registry.
//!
//! A purely passive container for entity declarations. Registration order is
//! preserved; it fixes the entity identifiers assigned by the builder and
//! therefore the deterministic output of repeated builds.

use crate::declaration::EntityDeclaration;

/// Collects raw entity declarations ahead of a metadata build.
#[derive(Debug, Clone, Default)]
pub struct DeclarationRegistry {
    entities: Vec<EntityDeclaration>,
}

impl DeclarationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity declaration.
    pub fn register(&mut self, entity: EntityDeclaration) {
        self.entities.push(entity);
    }

    /// Register an entity declaration, builder-style.
    #[must_use]
    pub fn with(mut self, entity: EntityDeclaration) -> Self {
        self.register(entity);
        self
    }

    /// All declarations, in registration order.
    #[must_use]
    pub fn entities(&self) -> &[EntityDeclaration] {
        &self.entities
    }

    /// Find a declaration by logical name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EntityDeclaration> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Number of registered declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order_preserved() {
        let registry = DeclarationRegistry::new()
            .with(EntityDeclaration::new("Post"))
            .with(EntityDeclaration::new("Category"));
        let names: Vec<&str> = registry.entities().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Post", "Category"]);
    }

    #[test]
    fn test_get_by_name() {
        let registry = DeclarationRegistry::new().with(EntityDeclaration::new("Post"));
        assert!(registry.get("Post").is_some());
        assert!(registry.get("Missing").is_none());
    }
}
