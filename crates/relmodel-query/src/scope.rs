//! Per-query alias book.
//!
//! A [`QueryScope`] lives for the construction of a single query. It hands
//! out aliases bound to entities of a finished schema graph, or to
//! sub-queries, and looks them up by name while clauses are assembled. The
//! graph itself is only read; scopes on different threads need no
//! coordination.

use relmodel_core::{MetadataError, Result};
use relmodel_metadata::SchemaGraph;

use crate::alias::{Alias, AliasKind};

/// Alias book for one query construction.
#[derive(Debug)]
pub struct QueryScope<'g> {
    graph: &'g SchemaGraph,
    aliases: Vec<Alias>,
}

impl<'g> QueryScope<'g> {
    /// Create an empty scope over a finished graph.
    #[must_use]
    pub fn new(graph: &'g SchemaGraph) -> Self {
        Self {
            graph,
            aliases: Vec::new(),
        }
    }

    /// Create an alias bound to an entity, looked up by logical name or
    /// structural target.
    pub fn create_alias(
        &mut self,
        kind: AliasKind,
        name: impl Into<String>,
        entity: &str,
    ) -> Result<&Alias> {
        let metadata = self
            .graph
            .entity_by_name(entity)
            .or_else(|| self.graph.entity_by_target(entity))
            .ok_or_else(|| {
                MetadataError::declaration(
                    entity,
                    "entity is not registered in the schema graph",
                )
            })?
            .clone();
        let name = name.into();
        tracing::debug!(alias = %name, entity = %metadata.name, "created alias");
        let mut alias = Alias::new(kind, name).table_path(metadata.table_name.clone());
        alias.attach_metadata(metadata);
        self.aliases.push(alias);
        Ok(&self.aliases[self.aliases.len() - 1])
    }

    /// Create an alias bound to a sub-query; no metadata is attached.
    pub fn create_sub_query_alias(
        &mut self,
        name: impl Into<String>,
        sql: impl Into<String>,
    ) -> &Alias {
        self.aliases
            .push(Alias::new(AliasKind::SubQuery, name).sub_query(sql));
        &self.aliases[self.aliases.len() - 1]
    }

    /// Find an alias by name.
    #[must_use]
    pub fn alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|a| a.name == name)
    }

    /// All aliases, in creation order.
    #[must_use]
    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }
}
