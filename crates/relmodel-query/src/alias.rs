//! Query-scope aliases.
//!
//! An [`Alias`] binds a name to an entity (via its metadata) or to a
//! sub-query for the duration of one query construction. It is not part of
//! the persistent schema graph: aliases are created and destroyed per query
//! scope, and their metadata is attached lazily.
//!
//! Access is deliberately split in two: [`Alias::has_metadata`] never fails
//! and exists precisely so callers can avoid the failure path of
//! [`Alias::metadata`], which fails loudly when the binding was never
//! attached. Neither accessor ever silently returns an empty value.

use std::sync::Arc;

use relmodel_core::{MetadataError, Result};
use relmodel_metadata::EntityMetadata;

/// What a query-scope alias stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasKind {
    /// The FROM entity of a query.
    From,
    /// A joined entity.
    Join,
    /// A sub-query binding.
    SubQuery,
    /// Anything else (raw expressions, synthetic bindings).
    Other,
}

/// A lightweight, query-scope-only binding of a name to entity metadata or
/// a sub-query.
#[derive(Debug, Clone)]
pub struct Alias {
    /// What this alias stands for.
    pub kind: AliasKind,
    /// The alias name used in generated SQL.
    pub name: String,
    /// Physical table path, when bound to a table directly.
    pub table_path: Option<String>,
    /// Sub-query SQL, when bound to a sub-query.
    pub sub_query: Option<String>,
    metadata: Option<Arc<EntityMetadata>>,
}

impl Alias {
    /// Create an alias with no metadata attached.
    pub fn new(kind: AliasKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            table_path: None,
            sub_query: None,
            metadata: None,
        }
    }

    /// Set the physical table path.
    pub fn table_path(mut self, path: impl Into<String>) -> Self {
        self.table_path = Some(path.into());
        self
    }

    /// Set the sub-query SQL.
    pub fn sub_query(mut self, sql: impl Into<String>) -> Self {
        self.sub_query = Some(sql.into());
        self
    }

    /// Attach the backing entity metadata.
    pub fn attach_metadata(&mut self, metadata: Arc<EntityMetadata>) {
        self.metadata = Some(metadata);
    }

    /// Non-failing existence check: whether metadata has been attached.
    ///
    /// Callers use this to avoid the failure path of [`Self::metadata`].
    #[must_use]
    pub const fn has_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    /// The backing entity metadata.
    ///
    /// Fails with [`MetadataError::MetadataNotAttached`] when the binding
    /// was never attached; accessing an unattached alias is a programming
    /// error on the caller's side, not a recoverable absence.
    pub fn metadata(&self) -> Result<&Arc<EntityMetadata>> {
        self.metadata
            .as_ref()
            .ok_or_else(|| MetadataError::MetadataNotAttached {
                alias: self.name.clone(),
            })
    }

    /// The structural target of the backing entity.
    ///
    /// Fails like [`Self::metadata`] when unattached; synthesized entities
    /// (junction tables) have no target, hence the inner `Option`.
    pub fn target(&self) -> Result<Option<&str>> {
        Ok(self.metadata()?.target.as_deref())
    }
}
