//! Thin orchestration over a live session.
//!
//! The adapter owns no SQL knowledge of its own: statements come from
//! [`SqlBuilder`], execution goes through the [`Session`] collaborator, and
//! recognized driver failures are upgraded to structured errors on the way
//! back up. Bulk maintenance (index phases, truncation) fans out
//! concurrently and is awaited jointly.

use futures::future::try_join_all;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use ingot_core::document::{Assignment, Query, Record, Update};
use ingot_core::error::{StoreError, StoreResult};
use ingot_core::index::IndexDefinition;
use ingot_core::session::{QueryOutcome, Session};

use crate::classify;
use crate::config::PostgresConfig;
use crate::index::{index_name, IndexPlan};
use crate::sql::{quote_ident, BuiltQuery, FindOptions, SqlBuilder};

/// PostgreSQL adapter: one logical session, stateless statements.
pub struct PostgresAdapter<S: Session> {
    session: S,
    builder: SqlBuilder,
}

impl<S: Session> PostgresAdapter<S> {
    pub fn new(session: S, config: PostgresConfig) -> Self {
        Self {
            session,
            builder: SqlBuilder::new(config),
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn builder(&self) -> &SqlBuilder {
        &self.builder
    }

    async fn run(&self, built: BuiltQuery) -> StoreResult<QueryOutcome> {
        if self.builder.config().log_statements {
            debug!(sql = %built.sql, values = ?built.values, "executing statement");
        }
        self.session.execute(&built.sql, &built.values).await
    }

    /// Execute a write, upgrading recognized constraint-violation detail to
    /// [`StoreError::DuplicateRecord`]; everything else passes through.
    async fn run_write(&self, built: BuiltQuery) -> StoreResult<QueryOutcome> {
        self.run(built).await.map_err(reclassify_write)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn find(
        &self,
        table: &str,
        query: &Query,
        options: &FindOptions,
    ) -> StoreResult<Vec<Map<String, Value>>> {
        let outcome = self.run(self.builder.find(table, query, options)).await?;
        Ok(outcome.rows)
    }

    pub async fn count(&self, table: &str, query: &Query) -> StoreResult<u64> {
        let outcome = self.run(self.builder.count(table, query)).await?;
        let count = outcome
            .rows
            .first()
            .and_then(|row| row.get("count"))
            .map(|value| match value {
                Value::Number(n) => n.as_u64().unwrap_or(0),
                Value::String(s) => s.parse().unwrap_or(0),
                _ => 0,
            })
            .unwrap_or(0);
        Ok(count)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert records and return the created rows.
    pub async fn create(
        &self,
        table: &str,
        records: &[Record],
    ) -> StoreResult<Vec<Map<String, Value>>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let outcome = self.run_write(self.builder.create(table, records)).await?;
        Ok(outcome.rows)
    }

    /// Update matching rows; returns the affected-row count.
    pub async fn update(&self, table: &str, query: &Query, update: &Update) -> StoreResult<u64> {
        let outcome = self
            .run_write(self.builder.update(table, query, update, false))
            .await?;
        Ok(outcome.row_count)
    }

    /// Update matching rows and return them; zero affected rows is
    /// [`StoreError::RecordNotFound`].
    pub async fn update_and_return(
        &self,
        table: &str,
        query: &Query,
        update: &Update,
    ) -> StoreResult<Vec<Map<String, Value>>> {
        let outcome = self
            .run_write(self.builder.update(table, query, update, true))
            .await?;
        if outcome.row_count == 0 {
            return Err(StoreError::RecordNotFound);
        }
        Ok(outcome.rows)
    }

    /// Delete matching rows; returns the affected-row count.
    pub async fn delete(&self, table: &str, query: &Query) -> StoreResult<u64> {
        let outcome = self.run(self.builder.delete(table, query)).await?;
        Ok(outcome.row_count)
    }

    /// Find-then-branch upsert: update the matching row if one exists,
    /// otherwise create the merged query+update record.
    ///
    /// This is the reliable path; the single-statement
    /// [`SqlBuilder::upsert`] form is not used here.
    pub async fn upsert(&self, table: &str, query: &Query, update: &Update) -> StoreResult<()> {
        let existing = self
            .find(table, query, &FindOptions::new().with_limit(1))
            .await?;
        if existing.is_empty() {
            self.create(table, &[merged_record(query, update)]).await?;
        } else {
            self.update(table, query, update).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Indexes
    // =========================================================================

    /// Create one index; a name collision is [`StoreError::IndexExists`].
    pub async fn create_index(
        &self,
        table: &str,
        definition: &IndexDefinition,
        unique: bool,
    ) -> StoreResult<()> {
        match self
            .run(self.builder.create_index(table, definition, unique))
            .await
        {
            Ok(_) => Ok(()),
            Err(StoreError::Driver(raw)) => {
                match classify::classify_index_error(&raw, table, definition.fields()) {
                    Some(structured) => Err(structured),
                    None => Err(StoreError::Driver(raw)),
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Drop one index; a failed drop is [`StoreError::IndexNotFound`].
    pub async fn drop_index(&self, name: &str) -> StoreResult<()> {
        match self.run(self.builder.drop_index(name)).await {
            Ok(_) => Ok(()),
            Err(StoreError::Driver(_)) => Err(StoreError::IndexNotFound {
                name: name.to_string(),
            }),
            Err(other) => Err(other),
        }
    }

    /// Reconcile the indexes on `table` with `desired`.
    ///
    /// Removals run first and complete as a group before any addition
    /// starts; within each phase operations run concurrently. An index that
    /// appears between planning and creation is reported as
    /// [`StoreError::DuplicateKey`], never as raw driver text. Running
    /// twice with an unchanged desired set is a no-op on the second run.
    pub async fn synchronize_indexes(
        &self,
        table: &str,
        desired: &[IndexDefinition],
        unique: bool,
    ) -> StoreResult<()> {
        let existing = self.session.current_indexes(table, unique).await?;
        let plan = IndexPlan::plan(table, desired, &existing);
        if plan.is_noop() {
            debug!(table, "indexes already synchronized");
            return Ok(());
        }

        try_join_all(plan.to_remove.iter().map(|name| self.drop_index(name))).await?;

        try_join_all(plan.to_add.iter().map(|definition| async move {
            match self.create_index(table, definition, unique).await {
                Err(StoreError::IndexExists { .. }) => {
                    let name = index_name(table, definition.fields());
                    warn!(%name, "index appeared during synchronization");
                    Err(StoreError::DuplicateKey {
                        message: format!("index {name} already exists"),
                    })
                }
                other => other,
            }
        }))
        .await?;

        Ok(())
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Truncate every table the session reports, concurrently.
    pub async fn truncate_all(&self) -> StoreResult<()> {
        let tables = self.session.table_names().await?;
        try_join_all(tables.iter().map(|table| {
            let built = BuiltQuery {
                sql: format!(
                    "TRUNCATE TABLE {}",
                    quote_ident(self.builder.config(), table)
                ),
                values: Vec::new(),
            };
            self.run(built)
        }))
        .await?;
        Ok(())
    }
}

fn reclassify_write(err: StoreError) -> StoreError {
    match err {
        StoreError::Driver(raw) => match classify::classify_write_error(&raw) {
            Some(structured) => structured,
            None => StoreError::Driver(raw),
        },
        other => other,
    }
}

/// Record created when an upsert finds nothing: query literals plus update
/// assignments, `$push` values starting a fresh one-element array.
fn merged_record(query: &Query, update: &Update) -> Record {
    let mut record = Record::new();
    for (path, value) in query.literal_entries() {
        record.insert(path.to_string(), value.clone());
    }
    for assignment in update.assignments() {
        match assignment {
            Assignment::Set { path, value } => {
                record.insert(path.to_string(), value.clone());
            }
            Assignment::Push { path, value } => {
                record.insert(path.to_string(), Value::Array(vec![value.clone()]));
            }
        }
    }
    record
}
