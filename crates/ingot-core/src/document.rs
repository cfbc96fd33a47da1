//! Query and update documents.
//!
//! The document model is the structured input to a dialect's translation
//! engine. Each per-field predicate is a tagged [`Condition`] rather than an
//! untyped value probed for `$`-prefixed operator keys, so translation is a
//! single exhaustive match. The JSON front door ([`Query::from_json`] /
//! [`Update::from_json`]) still accepts the wire shape
//! (`{"age": {"$gt": 3}}`, `$or`, `$push`) and applies the historical
//! operator-tag precedence when a clause object carries several tags.
//!
//! Clause order is insertion order and is preserved through translation,
//! which keeps placeholder numbering reproducible for a given call.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// A record handed to create: field name to literal value.
///
/// Backed by `serde_json::Map`, so field iteration order is deterministic.
pub type Record = Map<String, Value>;

/// Malformed document input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document must be a JSON object")]
    NotAnObject,

    #[error("`$or` expects an array of sub-documents")]
    MalformedOr,

    #[error("`$in` expects an array of literals")]
    MalformedIn,

    #[error("`$regex` expects a string pattern")]
    MalformedRegex,

    #[error("`$push` expects an object of field/value pairs")]
    MalformedPush,

    #[error("`$push` is only valid in update documents")]
    PushInQuery,
}

// ============================================================================
// Field paths
// ============================================================================

/// Column reference, optionally reaching one level into a JSON object column
/// (`base.prop`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    base: String,
    nested: Option<String>,
}

impl FieldPath {
    /// Parse a raw field name; a single `.` splits base column from the
    /// nested JSON property.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('.') {
            Some((base, prop)) => Self {
                base: base.to_string(),
                nested: Some(prop.to_string()),
            },
            None => Self {
                base: raw.to_string(),
                nested: None,
            },
        }
    }

    /// The column name
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The nested JSON property, if any
    pub fn nested(&self) -> Option<&str> {
        self.nested.as_deref()
    }

    /// Whether this path reaches into a JSON column
    pub fn is_nested(&self) -> bool {
        self.nested.is_some()
    }
}

impl From<&str> for FieldPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for FieldPath {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.nested {
            Some(prop) => write!(f, "{}.{}", self.base, prop),
            None => write!(f, "{}", self.base),
        }
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// A single per-field predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Literal equality; `Value::Null` matches SQL NULL in WHERE position
    Equals(Value),
    /// Set membership over literal alternatives (`$in`)
    In(Vec<Value>),
    /// Case-insensitive pattern match (`$regex`)
    Regex(String),
    /// `$lte`
    Lte(Value),
    /// `$lt`
    Lt(Value),
    /// `$gte`
    Gte(Value),
    /// `$gt`
    Gt(Value),
    /// Inequality; `Value::Null` renders as a presence check (`$ne`)
    NotEquals(Value),
    /// Presence check (`$exists` / `$type`)
    Exists,
}

impl Condition {
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::Equals(value.into())
    }

    pub fn not_equals(value: impl Into<Value>) -> Self {
        Self::NotEquals(value.into())
    }

    pub fn one_of<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::In(items.into_iter().map(Into::into).collect())
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex(pattern.into())
    }

    pub fn lte(value: impl Into<Value>) -> Self {
        Self::Lte(value.into())
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        Self::Lt(value.into())
    }

    pub fn gte(value: impl Into<Value>) -> Self {
        Self::Gte(value.into())
    }

    pub fn gt(value: impl Into<Value>) -> Self {
        Self::Gt(value.into())
    }
}

// ============================================================================
// Query documents
// ============================================================================

/// One WHERE-level clause of a query document.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Predicate on a single field
    Field {
        path: FieldPath,
        condition: Condition,
    },
    /// `$or`: any branch may match; clauses inside a branch stay ANDed
    Or(Vec<Query>),
}

/// Ordered query document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: add a field predicate
    #[must_use]
    pub fn field(mut self, path: impl Into<FieldPath>, condition: Condition) -> Self {
        self.clauses.push(Clause::Field {
            path: path.into(),
            condition,
        });
        self
    }

    /// Builder-style: add an `$or` group
    #[must_use]
    pub fn any_of(mut self, branches: impl IntoIterator<Item = Query>) -> Self {
        self.clauses.push(Clause::Or(branches.into_iter().collect()));
        self
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Field/value pairs of every top-level literal-equality clause, in
    /// order. Backends use this to derive conflict targets and merged
    /// upsert field lists.
    pub fn literal_entries(&self) -> impl Iterator<Item = (&FieldPath, &Value)> {
        self.clauses.iter().filter_map(|clause| match clause {
            Clause::Field {
                path,
                condition: Condition::Equals(value),
            } => Some((path, value)),
            _ => None,
        })
    }

    /// Parse the wire shape: a JSON object mapping field names (or `$or`)
    /// to literals or operator objects.
    pub fn from_json(doc: &Value) -> Result<Self, DocumentError> {
        let map = doc.as_object().ok_or(DocumentError::NotAnObject)?;
        let mut query = Query::new();

        for (key, value) in map {
            match key.as_str() {
                "$or" => {
                    let branches = value.as_array().ok_or(DocumentError::MalformedOr)?;
                    let parsed = branches
                        .iter()
                        .map(Query::from_json)
                        .collect::<Result<Vec<_>, _>>()?;
                    query.clauses.push(Clause::Or(parsed));
                }
                "$push" => return Err(DocumentError::PushInQuery),
                _ => {
                    query.clauses.push(Clause::Field {
                        path: FieldPath::parse(key),
                        condition: condition_from_json(value)?,
                    });
                }
            }
        }

        Ok(query)
    }
}

/// Operator-tag dispatch for one clause value.
///
/// Tag precedence when several appear in one object: `$in`, `$exists`,
/// `$type` (string payload), `$regex`, `$lte`, `$lt`, `$gte`, `$gt`, `$ne`.
/// First match wins. Objects with no recognized tag are literal values.
fn condition_from_json(value: &Value) -> Result<Condition, DocumentError> {
    let Some(map) = value.as_object() else {
        return Ok(Condition::Equals(value.clone()));
    };

    if let Some(items) = map.get("$in") {
        let items = items.as_array().ok_or(DocumentError::MalformedIn)?;
        return Ok(Condition::In(items.clone()));
    }
    if map.contains_key("$exists") {
        return Ok(Condition::Exists);
    }
    if map.get("$type").is_some_and(Value::is_string) {
        return Ok(Condition::Exists);
    }
    if let Some(pattern) = map.get("$regex") {
        let pattern = pattern.as_str().ok_or(DocumentError::MalformedRegex)?;
        return Ok(Condition::Regex(pattern.to_string()));
    }
    if let Some(v) = map.get("$lte") {
        return Ok(Condition::Lte(v.clone()));
    }
    if let Some(v) = map.get("$lt") {
        return Ok(Condition::Lt(v.clone()));
    }
    if let Some(v) = map.get("$gte") {
        return Ok(Condition::Gte(v.clone()));
    }
    if let Some(v) = map.get("$gt") {
        return Ok(Condition::Gt(v.clone()));
    }
    if let Some(v) = map.get("$ne") {
        return Ok(Condition::NotEquals(v.clone()));
    }

    Ok(Condition::Equals(value.clone()))
}

// ============================================================================
// Update documents
// ============================================================================

/// One assignment of an update document.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    /// Literal assignment; explicit `null` assigns NULL, it is never a
    /// presence filter
    Set { path: FieldPath, value: Value },
    /// Append into a JSON array column (`$push`)
    Push { path: FieldPath, value: Value },
}

/// Ordered update document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Update {
    assignments: Vec<Assignment>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: assign a literal
    #[must_use]
    pub fn set(mut self, path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.assignments.push(Assignment::Set {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    /// Builder-style: append into a JSON array column
    #[must_use]
    pub fn push_value(mut self, path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.assignments.push(Assignment::Push {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Field/value pairs of every literal assignment, in order.
    pub fn set_entries(&self) -> impl Iterator<Item = (&FieldPath, &Value)> {
        self.assignments.iter().filter_map(|a| match a {
            Assignment::Set { path, value } => Some((path, value)),
            Assignment::Push { .. } => None,
        })
    }

    /// Parse the wire shape: field names map to literal assignments, the
    /// reserved `$push` key maps to an object of per-field appends.
    pub fn from_json(doc: &Value) -> Result<Self, DocumentError> {
        let map = doc.as_object().ok_or(DocumentError::NotAnObject)?;
        let mut update = Update::new();

        for (key, value) in map {
            if key == "$push" {
                let entries = value.as_object().ok_or(DocumentError::MalformedPush)?;
                for (field, v) in entries {
                    update.assignments.push(Assignment::Push {
                        path: FieldPath::parse(field),
                        value: v.clone(),
                    });
                }
            } else {
                update.assignments.push(Assignment::Set {
                    path: FieldPath::parse(key),
                    value: value.clone(),
                });
            }
        }

        Ok(update)
    }
}
