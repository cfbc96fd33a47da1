//! Index naming, key expressions, and the synchronization plan.
//!
//! Index identity is name-based: a desired definition and an existing index
//! are the same index exactly when their canonical names match. The planner
//! is a pure diff; executing the resulting create/drop phases is the
//! adapter's job.

use std::collections::HashSet;

use ingot_core::index::IndexDefinition;
use ingot_core::session::IndexInfo;

use crate::config::PostgresConfig;
use crate::sql::{escape_string_literal, quote_ident};

/// Key expression for one indexed field. Dot paths index the JSON-path
/// read; plain fields index the (possibly quoted) column.
pub fn key_expression(config: &PostgresConfig, field: &str) -> String {
    match field.split_once('.') {
        Some((base, prop)) => format!(
            "({}->>'{}')",
            quote_ident(config, base),
            escape_string_literal(prop)
        ),
        None => quote_ident(config, field),
    }
}

/// Canonical index name for a (table, fields) pair.
///
/// Lower-cases each field, joins with `_`, prefixes the table, suffixes
/// `_index`, and maps `.` to `_`. Deterministic for the same input; the
/// caller supplies fields in canonical order — this function does not sort.
pub fn index_name(table: &str, fields: &[String]) -> String {
    let joined = fields
        .iter()
        .map(|field| field.to_lowercase())
        .collect::<Vec<_>>()
        .join("_");
    format!("{}_{}_index", table, joined).replace('.', "_")
}

/// Create/drop work computed by diffing a desired index set against the
/// indexes actually present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexPlan {
    /// Definitions whose canonical name is absent among existing indexes
    pub to_add: Vec<IndexDefinition>,
    /// Names of existing indexes absent from the desired set
    pub to_remove: Vec<String>,
}

impl IndexPlan {
    /// Name-based diff; structural differences under an unchanged name are
    /// invisible to synchronization.
    pub fn plan(table: &str, desired: &[IndexDefinition], existing: &[IndexInfo]) -> Self {
        let desired_names: HashSet<String> = desired
            .iter()
            .map(|definition| index_name(table, definition.fields()))
            .collect();
        let existing_names: HashSet<&str> =
            existing.iter().map(|info| info.name.as_str()).collect();

        let to_add = desired
            .iter()
            .filter(|definition| {
                !existing_names.contains(index_name(table, definition.fields()).as_str())
            })
            .cloned()
            .collect();
        let to_remove = existing
            .iter()
            .filter(|info| !desired_names.contains(&info.name))
            .map(|info| info.name.clone())
            .collect();

        Self { to_add, to_remove }
    }

    /// Nothing to create, nothing to drop.
    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
