//! Error taxonomy for the translation layer.
//!
//! Every failure a backend can surface is one of these kinds. Recognized
//! driver conditions (duplicate keys, connection refusals, index collisions)
//! are classified into structured variants by the dialect crate; anything
//! unrecognized stays a [`StoreError::Driver`] with the raw message intact so
//! it is never swallowed.

use thiserror::Error;

use crate::document::DocumentError;

/// Structured error for store operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Required constructor argument absent
    #[error("missing required parameter: {0}")]
    MissingParameters(String),

    /// Connection refused by the backend host
    #[error("unable to connect to database")]
    UnableToConnect,

    /// Target database absent; name extracted from the driver message
    #[error("database {name:?} does not exist")]
    InvalidDatabaseName { name: String },

    /// Connect failed for any other reason
    #[error("invalid database connection string")]
    InvalidConnectionString,

    /// An update-and-return operation affected zero rows
    #[error("record not found")]
    RecordNotFound,

    /// A write violated a uniqueness constraint
    #[error("duplicate value for unique fields {fields:?}")]
    DuplicateRecord {
        fields: Vec<String>,
        values: Vec<String>,
    },

    /// Index creation collided with an existing index of the same name
    #[error("index on {collection} ({fields:?}) already exists")]
    IndexExists {
        collection: String,
        fields: Vec<String>,
    },

    /// Index drop targeted a non-existent index
    #[error("index not found: {name}")]
    IndexNotFound { name: String },

    /// Synchronization tried to add an index that turned out to exist
    #[error("duplicate key during index synchronization: {message}")]
    DuplicateKey { message: String },

    /// Malformed query or update document
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Unclassified driver error, passed through unmodified
    #[error("driver error: {0}")]
    Driver(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Create a passthrough driver error
    pub fn driver<S: Into<String>>(msg: S) -> Self {
        Self::Driver(msg.into())
    }

    /// Check if the error reports a uniqueness violation
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRecord { .. } | Self::DuplicateKey { .. } | Self::IndexExists { .. }
        )
    }

    /// Check if the error came from failing to reach the backend
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::UnableToConnect | Self::InvalidDatabaseName { .. } | Self::InvalidConnectionString
        )
    }
}
