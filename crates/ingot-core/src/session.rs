//! External collaborator contract.
//!
//! Opening and closing the live connection is out of scope for this layer;
//! everything the translation engine and the index synchronizer need from it
//! is captured by [`Session`]. A session-oriented backend serializes command
//! execution on a single logical connection, so implementations need no
//! internal locking and statements stay self-contained between calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Result of executing one parameterized statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    /// Returned rows, one JSON object per row
    pub rows: Vec<Map<String, Value>>,
    /// Rows affected (or returned, for reads)
    pub row_count: u64,
}

impl QueryOutcome {
    /// Outcome with rows; `row_count` tracks the row total
    pub fn with_rows(rows: Vec<Map<String, Value>>) -> Self {
        let row_count = rows.len() as u64;
        Self { rows, row_count }
    }

    /// Outcome of a statement that returned nothing
    pub fn affected(row_count: u64) -> Self {
        Self {
            rows: Vec::new(),
            row_count,
        }
    }
}

/// One index as reported by backend introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl IndexInfo {
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// The live connection as the core consumes it.
#[async_trait]
pub trait Session: Send + Sync {
    /// Execute a parameterized statement. Driver failures surface as
    /// [`StoreError::Driver`] with the raw message intact so classifiers
    /// can inspect it and unrecognized errors pass through unmodified.
    async fn execute(&self, sql: &str, values: &[Value]) -> StoreResult<QueryOutcome>;

    /// Indexes currently present on `table`, restricted by uniqueness flag.
    async fn current_indexes(&self, table: &str, unique: bool) -> StoreResult<Vec<IndexInfo>>;

    /// Names of every user table. Used by maintenance routines.
    async fn table_names(&self) -> StoreResult<Vec<String>>;
}

/// Connection settings handed to whatever opens the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Backend connection URI
    pub uri: String,
}

impl SessionConfig {
    /// Validate and build; an empty URI is the classic missing-constructor-
    /// argument failure.
    pub fn new(uri: impl Into<String>) -> StoreResult<Self> {
        let uri = uri.into();
        if uri.trim().is_empty() {
            return Err(StoreError::MissingParameters("connection uri".to_string()));
        }
        Ok(Self { uri })
    }
}
