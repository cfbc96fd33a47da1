//! WHERE and SET clause rendering.
//!
//! One exhaustive match per condition; every branch either binds through the
//! shared [`SqlParams`] accumulator or emits a placeholder-free predicate.
//! Dot-path fields read through the JSON column with `->>` in WHERE position
//! and merge through `jsonb_build_object` in SET position.

use ingot_core::document::{Assignment, Clause, Condition, FieldPath, Query, Update};
use serde_json::Value;

use crate::config::PostgresConfig;
use crate::sql::params::SqlParams;
use crate::sql::{escape_string_literal, quote_ident};
use crate::value::{self, normalize};

/// Render a query document into per-clause fragments, in document order.
pub(crate) fn query_clauses(
    config: &PostgresConfig,
    query: &Query,
    params: &mut SqlParams,
) -> Vec<String> {
    query
        .clauses()
        .iter()
        .map(|clause| render_clause(config, clause, params))
        .collect()
}

/// `WHERE c1 AND c2 …`, or nothing for an empty document.
pub(crate) fn where_clause(
    config: &PostgresConfig,
    query: &Query,
    params: &mut SqlParams,
) -> Option<String> {
    if query.is_empty() {
        return None;
    }
    Some(format!(
        "WHERE {}",
        query_clauses(config, query, params).join(" AND ")
    ))
}

fn render_clause(config: &PostgresConfig, clause: &Clause, params: &mut SqlParams) -> String {
    match clause {
        Clause::Field { path, condition } => render_condition(config, path, condition, params),
        Clause::Or(branches) => {
            // Branches share the running counter; a multi-clause branch is
            // parenthesized so its internal ANDs cannot leak precedence.
            let rendered: Vec<String> = branches
                .iter()
                .map(|branch| {
                    let clauses = query_clauses(config, branch, params);
                    if clauses.len() > 1 {
                        format!("({})", clauses.join(" AND "))
                    } else {
                        clauses.join(" AND ")
                    }
                })
                .collect();
            format!("({})", rendered.join(" OR "))
        }
    }
}

fn render_condition(
    config: &PostgresConfig,
    path: &FieldPath,
    condition: &Condition,
    params: &mut SqlParams,
) -> String {
    let target = where_target(config, path);
    match condition {
        Condition::In(items) => {
            if items.is_empty() {
                // IN () is not valid SQL; an empty alternative set matches
                // nothing
                return "false".to_string();
            }
            let placeholders: Vec<String> = items
                .iter()
                .map(|item| params.bind(normalize(item)))
                .collect();
            format!("{} IN ({})", target, placeholders.join(", "))
        }
        Condition::Exists => format!("{} IS NOT NULL", target),
        Condition::Regex(pattern) => {
            let bare = value::normalize_pattern(pattern);
            let placeholder = params.bind(Value::String(bare.to_string()));
            format!("{} ~* {}", target, placeholder)
        }
        Condition::Lte(v) => comparison(target, "<=", path, v, params),
        Condition::Lt(v) => comparison(target, "<", path, v, params),
        Condition::Gte(v) => comparison(target, ">=", path, v, params),
        Condition::Gt(v) => comparison(target, ">", path, v, params),
        Condition::NotEquals(Value::Null) => format!("{} IS NOT NULL", target),
        Condition::NotEquals(v) => comparison(target, "!=", path, v, params),
        Condition::Equals(Value::Null) => format!("{} IS NULL", target),
        Condition::Equals(v) => comparison(target, "=", path, v, params),
    }
}

fn comparison(
    target: String,
    operator: &str,
    path: &FieldPath,
    literal: &Value,
    params: &mut SqlParams,
) -> String {
    // `->>` extraction yields text, so the bound literal follows suit
    let bound = if path.is_nested() {
        value::text_form(literal)
    } else {
        normalize(literal)
    };
    let placeholder = params.bind(bound);
    format!("{} {} {}", target, operator, placeholder)
}

/// Left-hand side of a WHERE predicate.
fn where_target(config: &PostgresConfig, path: &FieldPath) -> String {
    match path.nested() {
        Some(prop) => format!(
            "{} ->> '{}'",
            quote_ident(config, path.base()),
            escape_string_literal(prop)
        ),
        None => quote_ident(config, path.base()),
    }
}

/// Render update assignments into `target = expr` fragments, in document
/// order.
pub(crate) fn set_clauses(
    config: &PostgresConfig,
    update: &Update,
    params: &mut SqlParams,
) -> Vec<String> {
    update
        .assignments()
        .iter()
        .map(|assignment| render_assignment(config, assignment, params))
        .collect()
}

fn render_assignment(
    config: &PostgresConfig,
    assignment: &Assignment,
    params: &mut SqlParams,
) -> String {
    match assignment {
        Assignment::Set { path, value } => match path.nested() {
            // Merge the property into the JSON column instead of replacing
            // the whole column
            Some(prop) => {
                let base = quote_ident(config, path.base());
                let placeholder = params.bind(value::text_form(value));
                format!(
                    "{base} = {base} || jsonb_build_object('{}', {placeholder}::text)",
                    escape_string_literal(prop)
                )
            }
            None => {
                let placeholder = params.bind(normalize(value));
                format!("{} = {}", quote_ident(config, path.base()), placeholder)
            }
        },
        Assignment::Push { path, value } => {
            let target = quote_ident(config, path.base());
            // One allocation, two textual references: append when the
            // column already holds an array, otherwise start a fresh
            // one-element array
            let placeholder = params.bind(normalize(value));
            format!(
                "{target} = coalesce({target} || jsonb_build_array({placeholder}), jsonb_build_array({placeholder}))"
            )
        }
    }
}
