//! Bind-value normalization.
//!
//! Everything here is pure: a literal from a document goes in, a value safe
//! to bind as a statement parameter comes out. Composites are serialized to
//! text — homogeneous scalar arrays to the native array literal (`{...}`),
//! everything else to JSON — because the wire protocol binds text, not
//! structure.

use serde_json::Value;

/// Normalize an arbitrary literal into a bindable parameter value.
///
/// - array of scalars → native array literal text (`{"a","b"}`)
/// - any other array, or object → JSON text
/// - everything else passes through unchanged
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Array(items) if items.iter().all(is_scalar) => {
            Value::String(native_array_literal(items))
        }
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        other => other.clone(),
    }
}

/// Whether a cell's placeholder needs a `::jsonb` cast: objects and
/// non-homogeneous arrays bind as JSON text; native array literals and
/// scalars bind bare.
pub fn needs_jsonb_cast(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => !items.iter().all(is_scalar),
        _ => false,
    }
}

/// Strip enclosing `/` delimiters from a pattern literal, leaving the bare
/// pattern text.
pub fn normalize_pattern(pattern: &str) -> &str {
    pattern
        .strip_prefix('/')
        .and_then(|p| p.strip_suffix('/'))
        .unwrap_or(pattern)
}

/// Text form of a literal, for comparison against a `->>` extraction
/// (which always yields text).
pub fn text_form(value: &Value) -> Value {
    match value {
        Value::String(_) | Value::Null => value.clone(),
        other => Value::String(other.to_string()),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// The serialized JSON array with its brackets swapped for braces.
fn native_array_literal(items: &[Value]) -> String {
    let json = Value::Array(items.to_vec()).to_string();
    format!("{{{}}}", &json[1..json.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(normalize(&json!(3)), json!(3));
        assert_eq!(normalize(&json!("hey")), json!("hey"));
        assert_eq!(normalize(&json!(true)), json!(true));
        assert_eq!(normalize(&Value::Null), Value::Null);
    }

    #[test]
    fn test_scalar_array_becomes_native_literal() {
        assert_eq!(normalize(&json!(["a", "b"])), json!(r#"{"a","b"}"#));
        assert_eq!(normalize(&json!([1, 2, 3])), json!("{1,2,3}"));
        assert_eq!(normalize(&json!([])), json!("{}"));
    }

    #[test]
    fn test_composites_become_json_text() {
        assert_eq!(
            normalize(&json!({"a": 1})),
            json!(r#"{"a":1}"#)
        );
        assert_eq!(
            normalize(&json!([{"a": 1}])),
            json!(r#"[{"a":1}]"#)
        );
    }

    #[test]
    fn test_cast_decision() {
        assert!(needs_jsonb_cast(&json!({"a": 1})));
        assert!(needs_jsonb_cast(&json!([[1], [2]])));
        assert!(!needs_jsonb_cast(&json!(["a", "b"])));
        assert!(!needs_jsonb_cast(&json!("plain")));
    }

    #[test]
    fn test_pattern_delimiters_stripped() {
        assert_eq!(normalize_pattern("/^a.c$/"), "^a.c$");
        assert_eq!(normalize_pattern("^a.c$"), "^a.c$");
        // A lone leading slash is part of the pattern, not a delimiter
        assert_eq!(normalize_pattern("/path"), "/path");
    }

    #[test]
    fn test_text_form() {
        assert_eq!(text_form(&json!(3)), json!("3"));
        assert_eq!(text_form(&json!(true)), json!("true"));
        assert_eq!(text_form(&json!("s")), json!("s"));
        assert_eq!(text_form(&Value::Null), Value::Null);
    }
}
