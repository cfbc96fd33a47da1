//! Core contracts for the ingot translation layer.
//!
//! This crate defines everything a dialect backend needs to agree on with its
//! callers, without committing to any SQL flavor:
//!
//! - **Document model**: ordered query/update documents with a tagged-union
//!   condition per field ([`document`])
//! - **Error taxonomy**: stable, structured error kinds for constraint
//!   violations, connection failures, and index maintenance ([`error`])
//! - **Session contract**: the narrow interface a live connection must
//!   provide ([`session`])
//! - **Index descriptors**: the desired-index shape handed to backend
//!   synchronizers ([`index`])
//!
//! Dialect crates (currently `ingot-postgres`) consume these types and
//! produce parameterized SQL.

pub mod document;
pub mod error;
pub mod index;
pub mod session;

// Re-exports
pub use document::{
    Assignment, Clause, Condition, DocumentError, FieldPath, Query, Record, Update,
};
pub use error::{StoreError, StoreResult};
pub use index::IndexDefinition;
pub use session::{IndexInfo, QueryOutcome, Session, SessionConfig};
