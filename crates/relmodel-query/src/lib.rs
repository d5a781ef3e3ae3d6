//! Query-scope bindings over a resolved relmodel schema graph.
//!
//! This crate is the boundary the query-construction layer builds on: it
//! does not generate SQL itself, it only binds names to entity metadata for
//! the duration of one query. The two-method access contract on [`Alias`]
//! (checked `has_metadata` vs. failing `metadata`) is the load-bearing part;
//! query builders probe with the former to avoid the failure path of the
//! latter.

pub mod alias;
pub mod scope;

pub use alias::{Alias, AliasKind};
pub use scope::QueryScope;
