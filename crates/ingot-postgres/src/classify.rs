//! Driver error classification.
//!
//! Backend error text is inherently string-shaped; this module is the only
//! place that parses it. Every function is pure and total: recognized
//! shapes map to structured [`StoreError`] kinds, everything else reports
//! "no match" so callers re-raise the original error unmodified.

use once_cell::sync::Lazy;
use regex::Regex;

use ingot_core::error::StoreError;

/// `Key (email)=(a@b.com) already exists.`
static DUPLICATE_DETAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Key \((.+?)\)=\((.+?)\) already exists\.").expect("duplicate-detail pattern")
});

/// `::text` and friends
static CAST_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"::\w+").expect("cast-suffix pattern"));

/// `database "name" does not exist`
static QUOTED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)" does not exist"#).expect("quoted-name pattern"));

/// Classify a constraint-violation detail string.
///
/// `None` means the text did not match the duplicate-key shape; the caller
/// re-raises the original driver error.
pub fn classify_write_error(detail: &str) -> Option<StoreError> {
    let captures = DUPLICATE_DETAIL.captures(detail)?;

    let fields = captures[1]
        .split(',')
        .map(|field| canonical_field(field.trim()))
        .collect();
    let values = captures[2]
        .split(',')
        .map(|value| value.trim().to_string())
        .collect();

    Some(StoreError::DuplicateRecord { fields, values })
}

/// Canonical column name from a constraint-key expression.
///
/// `(information ->> 'email'::text)` → `email`: keep the segment after the
/// JSON-path read, drop cast suffixes, drop stray parentheses and quotes.
fn canonical_field(raw: &str) -> String {
    let after_path = raw.rsplit(" ->> ").next().unwrap_or(raw);
    let without_cast = CAST_SUFFIX.replace_all(after_path, "");
    without_cast
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '"' | '\''))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Classify a connect failure.
pub fn classify_connect_error(message: &str) -> StoreError {
    let lowered = message.to_lowercase();
    if lowered.contains("connection refused") {
        return StoreError::UnableToConnect;
    }
    if lowered.contains("does not exist") {
        if let Some(captures) = QUOTED_NAME.captures(message) {
            return StoreError::InvalidDatabaseName {
                name: captures[1].to_string(),
            };
        }
    }
    StoreError::InvalidConnectionString
}

/// Classify an index-creation failure against the collection and fields
/// that were requested. `None` for anything that is not a name collision.
pub fn classify_index_error(
    message: &str,
    collection: &str,
    fields: &[String],
) -> Option<StoreError> {
    if message.contains("already exists") {
        Some(StoreError::IndexExists {
            collection: collection.to_string(),
            fields: fields.to_vec(),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(
        "Key (email)=(a@b.com) already exists.",
        &["email"], &["a@b.com"];
        "plain field"
    )]
    #[test_case(
        "Key (tenant, email)=(t1, a@b.com) already exists.",
        &["tenant", "email"], &["t1", "a@b.com"];
        "multiple fields"
    )]
    #[test_case(
        "Key ((information ->> 'email'::text))=(a@b.com) already exists.",
        &["email"], &["a@b.com"];
        "json path field with cast"
    )]
    #[test_case(
        "duplicate key value violates unique constraint \"users_email_index\"\nDETAIL:  Key (email)=(a@b.com) already exists.",
        &["email"], &["a@b.com"];
        "full driver message"
    )]
    fn test_duplicate_detail(detail: &str, fields: &[&str], values: &[&str]) {
        let classified = classify_write_error(detail).expect("should classify");
        assert_eq!(
            classified,
            StoreError::DuplicateRecord {
                fields: fields.iter().map(|f| f.to_string()).collect(),
                values: values.iter().map(|v| v.to_string()).collect(),
            }
        );
    }

    #[test_case("deadlock detected"; "unrelated error")]
    #[test_case("Key email=a@b.com already exists"; "missing parentheses")]
    #[test_case(""; "empty message")]
    fn test_no_match_passes_through(detail: &str) {
        assert_eq!(classify_write_error(detail), None);
    }

    #[test]
    fn test_connect_refused() {
        assert_eq!(
            classify_connect_error("could not connect to server: Connection refused"),
            StoreError::UnableToConnect
        );
    }

    #[test]
    fn test_connect_missing_database_extracts_name() {
        assert_eq!(
            classify_connect_error("FATAL:  database \"analytics\" does not exist"),
            StoreError::InvalidDatabaseName {
                name: "analytics".to_string()
            }
        );
    }

    #[test]
    fn test_connect_other_failures_are_invalid_connection_string() {
        assert_eq!(
            classify_connect_error("password authentication failed for user \"app\""),
            StoreError::InvalidConnectionString
        );
        // "does not exist" without a quoted name falls through too
        assert_eq!(
            classify_connect_error("role does not exist"),
            StoreError::InvalidConnectionString
        );
    }

    #[test]
    fn test_index_collision() {
        let fields = vec!["email".to_string()];
        let classified =
            classify_index_error("relation \"users_email_index\" already exists", "users", &fields);
        assert_eq!(
            classified,
            Some(StoreError::IndexExists {
                collection: "users".to_string(),
                fields,
            })
        );

        assert_eq!(
            classify_index_error("out of memory", "users", &["email".to_string()]),
            None
        );
    }
}
