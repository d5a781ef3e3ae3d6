//! Core types and errors for relmodel.
//!
//! `relmodel-core` is the foundation layer for the metadata pipeline. It
//! defines the semantic column types shared by declarations and resolved
//! metadata, the dialect mapping queried when synthesized columns need a
//! concrete type, identifier validation, and the error taxonomy every other
//! crate reports through.
//!
//! # Who Uses This Crate
//!
//! - `relmodel-metadata` resolves declarations into a schema graph and
//!   reports failures as [`MetadataError`].
//! - `relmodel-query` exposes the query-scope alias boundary and reuses the
//!   same error type for its checked/unchecked access contract.
//!
//! Most applications should use the `relmodel` facade; reach for
//! `relmodel-core` directly when integrating at the type level.

pub mod dialect;
pub mod error;
pub mod identifiers;
pub mod types;

pub use dialect::Dialect;
pub use error::{MetadataError, Result, Violation};
pub use identifiers::{MAX_IDENTIFIER_LENGTH, is_valid_identifier};
pub use types::{ColumnType, Generated, ReferentialAction};
