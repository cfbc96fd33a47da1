//! PostgreSQL dialect for ingot.
//!
//! Translates document-style queries into parameterized PostgreSQL
//! statements, keeps indexes synchronized against a declared desired set,
//! and classifies driver error text into the stable taxonomy of
//! `ingot-core`.
//!
//! ## Components
//!
//! - **SqlBuilder**: find/count/create/update/delete/upsert/create-index
//!   translation with strict placeholder accounting ([`sql`])
//! - **Index naming & synchronization plan**: deterministic names, JSON-path
//!   key expressions, name-based add/remove diffing ([`index`])
//! - **Error classifier**: constraint-violation and connection-failure text
//!   parsing ([`classify`])
//! - **Adapter**: the thin shell that executes built statements through a
//!   [`Session`](ingot_core::Session) ([`adapter`])
//!
//! ## Usage
//!
//! ```rust
//! use ingot_core::{Condition, Query};
//! use ingot_postgres::{FindOptions, PostgresConfig, SqlBuilder};
//!
//! let builder = SqlBuilder::new(PostgresConfig::default());
//! let query = Query::new().field("age", Condition::gt(3));
//! let built = builder.find("users", &query, &FindOptions::default());
//!
//! assert_eq!(built.sql, "SELECT * FROM users WHERE age > $1");
//! assert_eq!(built.values.len(), 1);
//! ```

pub mod adapter;
pub mod classify;
pub mod config;
pub mod index;
pub mod sql;
pub mod value;

// Re-exports
pub use adapter::PostgresAdapter;
pub use config::PostgresConfig;
pub use index::{index_name, key_expression, IndexPlan};
pub use sql::{BuiltQuery, FindOptions, SortOrder, SqlBuilder};
