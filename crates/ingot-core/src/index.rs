//! Desired-index descriptors.
//!
//! An [`IndexDefinition`] declares one index the application wants to exist:
//! an ordered field list (dot paths allowed) plus an optional filter query
//! for partial indexes. Uniqueness is not part of the descriptor — backends
//! synchronize per (collection, unique) pair and carry the flag on the
//! operation.

use crate::document::Query;

/// One desired index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexDefinition {
    fields: Vec<String>,
    filter: Option<Query>,
}

impl IndexDefinition {
    /// Index over the given fields, in the given (canonical) order.
    pub fn on<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            filter: None,
        }
    }

    /// Builder-style: restrict to rows matching `filter` (partial index)
    #[must_use]
    pub fn with_filter(mut self, filter: Query) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn filter(&self) -> Option<&Query> {
        self.filter.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Condition;

    #[test]
    fn test_definition_keeps_field_order() {
        let def = IndexDefinition::on(["b", "a"]);
        assert_eq!(def.fields(), ["b", "a"]);
        assert!(def.filter().is_none());
    }

    #[test]
    fn test_definition_with_filter() {
        let def = IndexDefinition::on(["email"])
            .with_filter(Query::new().field("active", Condition::equals(true)));
        assert!(def.filter().is_some());
    }
}
