//! Engine configuration.
//!
//! The historical layer read process-wide toggles on every call; here the
//! toggles are explicit construction state, so two engines with different
//! policies can coexist and tests flip behavior by constructing new
//! instances rather than mutating globals.

/// Configuration for the PostgreSQL translation engine and adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostgresConfig {
    /// Wrap bare identifiers in double quotes. Identifiers containing a
    /// space are never quoted regardless of this flag (historical behavior,
    /// preserved).
    pub quote_identifiers: bool,

    /// Log every built statement and its bind values at debug level before
    /// execution.
    pub log_statements: bool,
}

impl PostgresConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: toggle identifier quoting
    #[must_use]
    pub fn with_quoted_identifiers(mut self, on: bool) -> Self {
        self.quote_identifiers = on;
        self
    }

    /// Builder-style: toggle statement logging
    #[must_use]
    pub fn with_statement_logging(mut self, on: bool) -> Self {
        self.log_statements = on;
        self
    }
}
