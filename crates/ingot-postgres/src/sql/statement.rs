//! Statement construction.

use std::collections::BTreeSet;

use ingot_core::document::{Query, Record, Update};
use ingot_core::index::IndexDefinition;
use serde_json::Value;

use crate::config::PostgresConfig;
use crate::index::{index_name, key_expression};
use crate::sql::clause::{set_clauses, where_clause};
use crate::sql::params::SqlParams;
use crate::sql::{quote_ident, BuiltQuery};
use crate::value::{needs_jsonb_cast, normalize};

/// Sort direction for find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Options for find.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    columns: Option<Vec<String>>,
    skip: Option<u64>,
    sort: Vec<(String, SortOrder)>,
    limit: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: select only these columns instead of `*`
    #[must_use]
    pub fn with_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Builder-style: skip the first `skip` rows
    #[must_use]
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Builder-style: append a sort term
    #[must_use]
    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((field.into(), order));
        self
    }

    /// Builder-style: cap the row count
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Builds parameterized statements for the PostgreSQL dialect.
///
/// Stateless between calls; every operation returns a fresh [`BuiltQuery`]
/// whose placeholder count equals its value count.
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    config: PostgresConfig,
}

impl SqlBuilder {
    pub fn new(config: PostgresConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    /// `SELECT … FROM table` with WHERE, OFFSET, ORDER BY, LIMIT appended in
    /// that fixed order.
    pub fn find(&self, table: &str, query: &Query, options: &FindOptions) -> BuiltQuery {
        let mut params = SqlParams::new();

        let columns = match &options.columns {
            Some(cols) => cols
                .iter()
                .map(|col| quote_ident(&self.config, col))
                .collect::<Vec<_>>()
                .join(", "),
            None => "*".to_string(),
        };

        let mut sql = format!(
            "SELECT {} FROM {}",
            columns,
            quote_ident(&self.config, table)
        );
        if let Some(clause) = where_clause(&self.config, query, &mut params) {
            sql.push(' ');
            sql.push_str(&clause);
        }
        // OFFSET is emitted before ORDER BY before LIMIT; the emission order
        // is part of this layer's compatibility surface
        if let Some(skip) = options.skip {
            sql.push_str(&format!(" OFFSET {}", skip));
        }
        if !options.sort.is_empty() {
            let terms = options
                .sort
                .iter()
                .map(|(field, order)| {
                    format!("{} {}", quote_ident(&self.config, field), order.as_sql())
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" ORDER BY {}", terms));
        }
        if let Some(limit) = options.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        BuiltQuery {
            sql,
            values: params.into_values(),
        }
    }

    /// `SELECT count(*) FROM table` with the same WHERE discipline as find.
    pub fn count(&self, table: &str, query: &Query) -> BuiltQuery {
        let mut params = SqlParams::new();
        let mut sql = format!("SELECT count(*) FROM {}", quote_ident(&self.config, table));
        if let Some(clause) = where_clause(&self.config, query, &mut params) {
            sql.push(' ');
            sql.push_str(&clause);
        }
        BuiltQuery {
            sql,
            values: params.into_values(),
        }
    }

    /// Multi-row insert returning the created rows.
    ///
    /// The field list is the union of all records' keys; a record missing a
    /// field binds NULL for that cell. Object and non-homogeneous array
    /// cells are cast to `jsonb` at the placeholder.
    pub fn create(&self, table: &str, records: &[Record]) -> BuiltQuery {
        self.insert(table, records, true)
    }

    /// Multi-row insert without `RETURNING *`.
    pub fn create_without_returning(&self, table: &str, records: &[Record]) -> BuiltQuery {
        self.insert(table, records, false)
    }

    fn insert(&self, table: &str, records: &[Record], returning: bool) -> BuiltQuery {
        let mut params = SqlParams::new();

        let fields: Vec<&str> = records
            .iter()
            .flat_map(|record| record.keys().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows: Vec<String> = records
            .iter()
            .map(|record| {
                let cells: Vec<String> = fields
                    .iter()
                    .map(|field| match record.get(*field) {
                        None | Some(Value::Null) => params.bind(Value::Null),
                        Some(value) => {
                            let placeholder = params.bind(normalize(value));
                            if needs_jsonb_cast(value) {
                                format!("{}::jsonb", placeholder)
                            } else {
                                placeholder
                            }
                        }
                    })
                    .collect();
                format!("({})", cells.join(", "))
            })
            .collect();

        let field_list = fields
            .iter()
            .map(|field| quote_ident(&self.config, field))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_ident(&self.config, table),
            field_list,
            rows.join(", ")
        );
        if returning {
            sql.push_str(" RETURNING *");
        }

        BuiltQuery {
            sql,
            values: params.into_values(),
        }
    }

    /// `UPDATE table SET … [WHERE …] [RETURNING *]`.
    ///
    /// SET placeholders come first (counter starts at zero, explicit null
    /// values are assignments), WHERE placeholders continue the same
    /// counter.
    pub fn update(
        &self,
        table: &str,
        query: &Query,
        update: &Update,
        returning: bool,
    ) -> BuiltQuery {
        let mut params = SqlParams::new();

        let sets = set_clauses(&self.config, update, &mut params);
        let mut sql = format!(
            "UPDATE {} SET {}",
            quote_ident(&self.config, table),
            sets.join(", ")
        );
        if let Some(clause) = where_clause(&self.config, query, &mut params) {
            sql.push(' ');
            sql.push_str(&clause);
        }
        if returning {
            sql.push_str(" RETURNING *");
        }

        BuiltQuery {
            sql,
            values: params.into_values(),
        }
    }

    /// `DELETE FROM table [WHERE …]`.
    pub fn delete(&self, table: &str, query: &Query) -> BuiltQuery {
        let mut params = SqlParams::new();
        let mut sql = format!("DELETE FROM {}", quote_ident(&self.config, table));
        if let Some(clause) = where_clause(&self.config, query, &mut params) {
            sql.push(' ');
            sql.push_str(&clause);
        }
        BuiltQuery {
            sql,
            values: params.into_values(),
        }
    }

    /// Single-statement upsert: insert the merged query+update fields, on
    /// conflict over the query's field list update every set field to its
    /// EXCLUDED value.
    ///
    /// Known limitation: this form only works when the conflict target is
    /// backed by an actual unique constraint, and `$push` assignments have
    /// no single-statement equivalent (they are ignored here). The reliable
    /// path is the adapter's find-then-branch upsert; this statement is
    /// kept for callers that own a matching constraint.
    pub fn upsert(&self, table: &str, query: &Query, update: &Update) -> BuiltQuery {
        let mut params = SqlParams::new();

        // Merged field list: query literals first, then set assignments;
        // later entries win on collision
        let mut merged: Vec<(&str, &Value)> = Vec::new();
        for (path, value) in query.literal_entries().chain(update.set_entries()) {
            match merged.iter_mut().find(|(name, _)| *name == path.base()) {
                Some(slot) => slot.1 = value,
                None => merged.push((path.base(), value)),
            }
        }

        let field_list = merged
            .iter()
            .map(|(name, _)| quote_ident(&self.config, name))
            .collect::<Vec<_>>()
            .join(", ");
        let cells = merged
            .iter()
            .map(|(_, value)| {
                let placeholder = params.bind(normalize(value));
                if needs_jsonb_cast(value) {
                    format!("{}::jsonb", placeholder)
                } else {
                    placeholder
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let conflict_target = query
            .literal_entries()
            .map(|(path, _)| quote_ident(&self.config, path.base()))
            .collect::<Vec<_>>()
            .join(", ");

        let action = {
            let sets: Vec<String> = update
                .set_entries()
                .map(|(path, _)| {
                    let field = quote_ident(&self.config, path.base());
                    format!("{field} = EXCLUDED.{field}")
                })
                .collect();
            if sets.is_empty() {
                "DO NOTHING".to_string()
            } else {
                format!("DO UPDATE SET {}", sets.join(", "))
            }
        };

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) {} RETURNING *",
            quote_ident(&self.config, table),
            field_list,
            cells,
            conflict_target,
            action
        );

        BuiltQuery {
            sql,
            values: params.into_values(),
        }
    }

    /// `CREATE [UNIQUE] INDEX name ON table (keys) [WHERE …]`.
    pub fn create_index(
        &self,
        table: &str,
        definition: &IndexDefinition,
        unique: bool,
    ) -> BuiltQuery {
        let mut params = SqlParams::new();

        let name = index_name(table, definition.fields());
        let keys = definition
            .fields()
            .iter()
            .map(|field| key_expression(&self.config, field))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "CREATE {}INDEX {} ON {} ({})",
            if unique { "UNIQUE " } else { "" },
            quote_ident(&self.config, &name),
            quote_ident(&self.config, table),
            keys
        );
        if let Some(filter) = definition.filter() {
            if let Some(clause) = where_clause(&self.config, filter, &mut params) {
                sql.push(' ');
                sql.push_str(&clause);
            }
        }

        BuiltQuery {
            sql,
            values: params.into_values(),
        }
    }

    /// `DROP INDEX name`.
    pub fn drop_index(&self, name: &str) -> BuiltQuery {
        BuiltQuery {
            sql: format!("DROP INDEX {}", quote_ident(&self.config, name)),
            values: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingot_core::document::Condition;
    use serde_json::json;

    fn builder() -> SqlBuilder {
        SqlBuilder::new(PostgresConfig::default())
    }

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    // =========================================================================
    // find
    // =========================================================================

    #[test]
    fn test_find_without_query() {
        let built = builder().find("users", &Query::new(), &FindOptions::default());
        assert_eq!(built.sql, "SELECT * FROM users");
        assert!(built.values.is_empty());
    }

    #[test]
    fn test_find_comparison() {
        let built = builder().find(
            "users",
            &Query::new().field("age", Condition::gt(3)),
            &FindOptions::default(),
        );
        insta::assert_snapshot!(built.sql, @"SELECT * FROM users WHERE age > $1");
        assert_eq!(built.values, vec![json!(3)]);
    }

    #[test]
    fn test_find_clause_ordering() {
        let options = FindOptions::new()
            .with_skip(10)
            .sorted_by("created_at", SortOrder::Descending)
            .with_limit(5);
        let built = builder().find(
            "events",
            &Query::new().field("kind", Condition::equals("login")),
            &options,
        );

        assert_eq!(
            built.sql,
            "SELECT * FROM events WHERE kind = $1 OFFSET 10 ORDER BY created_at DESC LIMIT 5"
        );
        assert_eq!(built.values, vec![json!("login")]);
    }

    #[test]
    fn test_find_with_column_list() {
        let config = PostgresConfig::new().with_quoted_identifiers(true);
        let built = SqlBuilder::new(config).find(
            "users",
            &Query::new(),
            &FindOptions::new().with_columns(["id", "email"]),
        );
        assert_eq!(built.sql, "SELECT \"id\", \"email\" FROM \"users\"");
    }

    #[test]
    fn test_count() {
        let built = builder().count("users", &Query::new().field("active", Condition::equals(true)));
        assert_eq!(built.sql, "SELECT count(*) FROM users WHERE active = $1");
        assert_eq!(built.values, vec![json!(true)]);
    }

    // =========================================================================
    // create
    // =========================================================================

    #[test]
    fn test_create_single_record() {
        let built = builder().create(
            "users",
            &[record(&[("id", json!("1")), ("name", json!("ann"))])],
        );
        assert_eq!(
            built.sql,
            "INSERT INTO users (id, name) VALUES ($1, $2) RETURNING *"
        );
        assert_eq!(built.values, vec![json!("1"), json!("ann")]);
    }

    #[test]
    fn test_create_union_of_fields_binds_null_for_missing() {
        let built = builder().create(
            "users",
            &[
                record(&[("a", json!(1))]),
                record(&[("b", json!(2))]),
            ],
        );

        assert_eq!(
            built.sql,
            "INSERT INTO users (a, b) VALUES ($1, $2), ($3, $4) RETURNING *"
        );
        assert_eq!(
            built.values,
            vec![json!(1), Value::Null, Value::Null, json!(2)]
        );
    }

    #[test]
    fn test_create_casts_json_composites() {
        let built = builder().create(
            "users",
            &[record(&[
                ("profile", json!({"age": 3})),
                ("tags", json!(["a", "b"])),
            ])],
        );

        // Objects are cast to jsonb; homogeneous scalar arrays bind as
        // native array literals without a cast
        assert_eq!(
            built.sql,
            "INSERT INTO users (profile, tags) VALUES ($1::jsonb, $2) RETURNING *"
        );
        assert_eq!(
            built.values,
            vec![json!(r#"{"age":3}"#), json!(r#"{"a","b"}"#)]
        );
    }

    #[test]
    fn test_create_without_returning() {
        let built = builder().create_without_returning("users", &[record(&[("a", json!(1))])]);
        assert_eq!(built.sql, "INSERT INTO users (a) VALUES ($1)");
    }

    // =========================================================================
    // update / delete
    // =========================================================================

    #[test]
    fn test_update_where_continues_counter() {
        let built = builder().update(
            "users",
            &Query::new().field("id", Condition::equals("123")),
            &Update::new().set("name", "bob").set("age", 30),
            false,
        );

        assert_eq!(
            built.sql,
            "UPDATE users SET name = $1, age = $2 WHERE id = $3"
        );
        assert_eq!(built.values, vec![json!("bob"), json!(30), json!("123")]);
    }

    #[test]
    fn test_update_push_binds_once_counts_through_where() {
        let built = builder().update(
            "users",
            &Query::new().field("id", Condition::equals("123")),
            &Update::new().push_value("names", "hey"),
            false,
        );

        assert_eq!(
            built.sql,
            "UPDATE users SET names = coalesce(names || jsonb_build_array($1), jsonb_build_array($1)) WHERE id = $2"
        );
        assert_eq!(built.values, vec![json!("hey"), json!("123")]);
    }

    #[test]
    fn test_update_returning() {
        let built = builder().update(
            "users",
            &Query::new().field("id", Condition::equals("1")),
            &Update::new().set("name", "zed"),
            true,
        );
        assert!(built.sql.ends_with("RETURNING *"));
    }

    #[test]
    fn test_delete() {
        let built = builder().delete("users", &Query::new().field("id", Condition::equals("1")));
        assert_eq!(built.sql, "DELETE FROM users WHERE id = $1");
        assert_eq!(built.values, vec![json!("1")]);
    }

    #[test]
    fn test_delete_everything_has_no_where() {
        let built = builder().delete("users", &Query::new());
        assert_eq!(built.sql, "DELETE FROM users");
    }

    // =========================================================================
    // upsert (single-statement form)
    // =========================================================================

    #[test]
    fn test_upsert_merges_query_and_update_fields() {
        let built = builder().upsert(
            "users",
            &Query::new().field("id", Condition::equals("1")),
            &Update::new().set("name", "ann"),
        );

        assert_eq!(
            built.sql,
            "INSERT INTO users (id, name) VALUES ($1, $2) ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name RETURNING *"
        );
        assert_eq!(built.values, vec![json!("1"), json!("ann")]);
    }

    #[test]
    fn test_upsert_update_value_wins_on_collision() {
        let built = builder().upsert(
            "users",
            &Query::new().field("id", Condition::equals("1")),
            &Update::new().set("id", "2"),
        );
        assert_eq!(built.values, vec![json!("2")]);
    }

    // =========================================================================
    // indexes
    // =========================================================================

    #[test]
    fn test_create_index() {
        let built = builder().create_index("users", &IndexDefinition::on(["email"]), false);
        assert_eq!(
            built.sql,
            "CREATE INDEX users_email_index ON users (email)"
        );
        assert!(built.values.is_empty());
    }

    #[test]
    fn test_create_unique_index_with_dot_path() {
        let built = builder().create_index(
            "users",
            &IndexDefinition::on(["information.email"]),
            true,
        );
        assert_eq!(
            built.sql,
            "CREATE UNIQUE INDEX users_information_email_index ON users ((information->>'email'))"
        );
    }

    #[test]
    fn test_create_partial_index() {
        let definition = IndexDefinition::on(["email"])
            .with_filter(Query::new().field("active", Condition::equals(true)));
        let built = builder().create_index("users", &definition, false);

        assert_eq!(
            built.sql,
            "CREATE INDEX users_email_index ON users (email) WHERE active = $1"
        );
        assert_eq!(built.values, vec![json!(true)]);
    }

    #[test]
    fn test_drop_index() {
        let built = builder().drop_index("users_email_index");
        assert_eq!(built.sql, "DROP INDEX users_email_index");
        assert!(built.values.is_empty());
    }

    // =========================================================================
    // invariants
    // =========================================================================

    #[test]
    fn test_placeholder_count_matches_values() {
        let query = Query::new()
            .field("a", Condition::one_of([1, 2, 3]))
            .field("b.c", Condition::equals("x"))
            .any_of([
                Query::new().field("d", Condition::gt(1)),
                Query::new().field("e", Condition::Equals(Value::Null)),
            ]);
        let built = builder().find("t", &query, &FindOptions::default());

        let highest = (1usize..)
            .take_while(|n| built.sql.contains(&format!("${}", n)))
            .last()
            .unwrap_or(0);
        assert_eq!(highest, built.values.len());
    }
}
