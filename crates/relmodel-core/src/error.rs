//! Error types for metadata resolution.
//!
//! All build errors are static-declaration errors: they abort the whole
//! build and are never retried. A failed build produces no graph at all, so
//! downstream consumers never observe a partially-resolved schema.

use std::error::Error as StdError;
use std::fmt;

/// Convenience alias for metadata operations.
pub type Result<T> = std::result::Result<T, MetadataError>;

/// A single invariant violation found by the graph validator.
///
/// The validator collects every violation it finds in one pass, so a user
/// fixing declarations sees the full list instead of one failure at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Logical name of the offending entity.
    pub entity: String,
    /// Human-readable description of the violated invariant.
    pub message: String,
}

impl Violation {
    /// Create a violation for the given entity.
    pub fn new(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entity, self.message)
    }
}

/// Errors raised while resolving entity declarations into a schema graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// A raw declaration is malformed or missing a required field.
    Declaration {
        /// Logical name of the declaring entity.
        entity: String,
        /// Property the declaration belongs to, when known.
        property: Option<String>,
        /// What is wrong with the declaration.
        message: String,
    },
    /// A relation's target or inverse side could not be resolved.
    RelationResolution {
        /// Entity declaring the relation.
        entity: String,
        /// Property name of the relation.
        property: String,
        /// What failed to resolve.
        message: String,
    },
    /// Local and referenced column counts of a foreign key disagree.
    ArityMismatch {
        /// Entity owning the foreign key.
        entity: String,
        /// Referenced entity.
        referenced: String,
        /// Number of local columns.
        local: usize,
        /// Number of referenced primary-key columns.
        referenced_count: usize,
    },
    /// One or more graph-wide invariants were violated.
    ///
    /// Aggregates every violation found in the final validation pass.
    GraphValidation {
        /// All violations, in discovery order.
        violations: Vec<Violation>,
    },
    /// An alias's metadata was accessed before being attached.
    ///
    /// Recoverable: callers check `has_metadata()` first to avoid this path.
    MetadataNotAttached {
        /// Name of the alias.
        alias: String,
    },
}

impl MetadataError {
    /// Shorthand for a declaration error without a property context.
    pub fn declaration(entity: impl Into<String>, message: impl Into<String>) -> Self {
        MetadataError::Declaration {
            entity: entity.into(),
            property: None,
            message: message.into(),
        }
    }

    /// Shorthand for a declaration error on a specific property.
    pub fn declaration_on(
        entity: impl Into<String>,
        property: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MetadataError::Declaration {
            entity: entity.into(),
            property: Some(property.into()),
            message: message.into(),
        }
    }

    /// Shorthand for a relation resolution error.
    pub fn relation(
        entity: impl Into<String>,
        property: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MetadataError::RelationResolution {
            entity: entity.into(),
            property: property.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::Declaration {
                entity,
                property,
                message,
            } => match property {
                Some(property) => {
                    write!(f, "invalid declaration {}.{}: {}", entity, property, message)
                }
                None => write!(f, "invalid declaration {}: {}", entity, message),
            },
            MetadataError::RelationResolution {
                entity,
                property,
                message,
            } => write!(
                f,
                "cannot resolve relation {}.{}: {}",
                entity, property, message
            ),
            MetadataError::ArityMismatch {
                entity,
                referenced,
                local,
                referenced_count,
            } => write!(
                f,
                "foreign key arity mismatch on {} referencing {}: {} local column(s) vs {} referenced primary column(s)",
                entity, referenced, local, referenced_count
            ),
            MetadataError::GraphValidation { violations } => {
                write!(f, "schema graph validation failed:")?;
                for v in violations {
                    write!(f, "\n  - {}", v)?;
                }
                Ok(())
            }
            MetadataError::MetadataNotAttached { alias } => {
                write!(f, "cannot get entity metadata for the given alias \"{}\"", alias)
            }
        }
    }
}

impl StdError for MetadataError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_display_with_property() {
        let err = MetadataError::declaration_on("Post", "title", "unknown column type");
        assert_eq!(
            err.to_string(),
            "invalid declaration Post.title: unknown column type"
        );
    }

    #[test]
    fn test_relation_display() {
        let err = MetadataError::relation("Post", "categories", "target \"Category\" not registered");
        assert_eq!(
            err.to_string(),
            "cannot resolve relation Post.categories: target \"Category\" not registered"
        );
    }

    #[test]
    fn test_arity_mismatch_display() {
        let err = MetadataError::ArityMismatch {
            entity: "order_item".to_string(),
            referenced: "order".to_string(),
            local: 1,
            referenced_count: 2,
        };
        let text = err.to_string();
        assert!(text.contains("order_item"));
        assert!(text.contains("1 local column(s)"));
        assert!(text.contains("2 referenced primary column(s)"));
    }

    #[test]
    fn test_graph_validation_aggregates_all_violations() {
        let err = MetadataError::GraphValidation {
            violations: vec![
                Violation::new("Post", "no primary key column"),
                Violation::new("Tag", "duplicate column name \"name\""),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("Post: no primary key column"));
        assert!(text.contains("Tag: duplicate column name \"name\""));
    }

    #[test]
    fn test_metadata_not_attached_display() {
        let err = MetadataError::MetadataNotAttached {
            alias: "post".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot get entity metadata for the given alias \"post\""
        );
    }
}
