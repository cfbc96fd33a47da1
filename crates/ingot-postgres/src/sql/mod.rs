//! SQL construction for the PostgreSQL dialect.
//!
//! Statements are assembled from structured fragments: clause builders emit
//! `(text, bound values)` pairs through a shared [`SqlParams`] accumulator,
//! never by textual template substitution, so field names can never leak
//! into placeholder positions.

mod clause;
mod params;
mod statement;

pub use params::SqlParams;
pub use statement::{FindOptions, SortOrder, SqlBuilder};

use serde_json::Value;

use crate::config::PostgresConfig;

/// SQL text plus the ordered bind values backing its placeholders.
///
/// Placeholders are 1-indexed and strictly increasing; `values[i]` binds
/// placeholder `i + 1`, and the placeholder count always equals
/// `values.len()`. A `BuiltQuery` is constructed fresh per call and
/// discarded after execution.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub values: Vec<Value>,
}

/// Quote an identifier per the active policy.
///
/// When quoting is enabled the identifier is wrapped in double quotes with
/// inner quotes doubled — unless it contains a space, in which case it is
/// emitted bare. The space exception is historical and preserved as-is; see
/// the pinning test.
pub fn quote_ident(config: &PostgresConfig, ident: &str) -> String {
    if config.quote_identifiers && !ident.contains(' ') {
        format!("\"{}\"", ident.replace('"', "\"\""))
    } else {
        ident.to_string()
    }
}

/// Escape a string embedded in SQL text as a single-quoted literal.
pub(crate) fn escape_string_literal(text: &str) -> String {
    text.replace('\'', "''")
}
