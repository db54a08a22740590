//! Dotted path resolution
//!
//! Supports:
//! - `name` (single field)
//! - `user.avatar.url` (nested records)
//! - `items.0` (index-keyed records built from JSON arrays)
//!
//! Absent segments are not errors: the path resolves to nothing and renders
//! as the empty string, as do falsy leaves. A function met at any segment is
//! called with no arguments and its result is used in its place.

use html_escape::encode_text;

use crate::context::{Record, Value};
use crate::error::{Result, StacheError};

/// Split a dotted path into its field names
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.')
}

/// Read one field, calling it when it holds a function
fn step(current: Option<Value>, field: &str, path: &str) -> Result<Option<Value>> {
    let Some(Value::Record(record)) = current else {
        return Ok(None);
    };
    match record.get(field) {
        Some(Value::Function(f)) => f().map(Some).map_err(|source| StacheError::Callable {
            path: path.to_string(),
            source,
        }),
        other => Ok(other),
    }
}

/// Walk the full path from the context root
pub fn resolve(context: &Record, path: &str) -> Result<Option<Value>> {
    let mut current = Some(Value::Record(context.clone()));
    for field in segments(path) {
        current = step(current, field, path)?;
        if current.is_none() {
            break;
        }
    }
    Ok(current)
}

/// Resolve and render as escaped text
///
/// Falsy leaves (`false`, `0`, `NaN`, `""`) render empty like absent ones.
pub fn pluck(context: &Record, path: &str) -> Result<String> {
    let text = resolve(context, path)?
        .filter(|value| !value.is_falsy())
        .map(|value| value.render())
        .unwrap_or_default();
    Ok(escape(&text))
}

/// Write `value` at a dotted path through `Record::set`
///
/// Every segment but the last must resolve to a record.
pub fn assign(context: &Record, path: &str, value: Value) -> Result<()> {
    let (parent, field) = match path.rsplit_once('.') {
        Some((parent, field)) => (resolve(context, parent)?, field),
        None => (Some(Value::Record(context.clone())), path),
    };

    match parent {
        Some(Value::Record(record)) if !field.is_empty() => record.set(field, value),
        _ => Err(StacheError::InvalidAssignment {
            assignment: path.to_string(),
            reason: "parent path does not hold a record".to_string(),
        }),
    }
}

/// HTML-escape a rendered value (`&`, `<`, `>`)
pub fn escape(text: &str) -> String {
    encode_text(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: serde_json::Value) -> Record {
        Record::from_json(value).unwrap()
    }

    #[test]
    fn pluck_simple_field() {
        let ctx = context(json!({"name": "Hubot"}));
        assert_eq!(pluck(&ctx, "name").unwrap(), "Hubot");
    }

    #[test]
    fn pluck_missing_field_is_empty() {
        let ctx = context(json!({}));
        assert_eq!(pluck(&ctx, "name").unwrap(), "");
    }

    #[test]
    fn pluck_missing_intermediate_is_empty() {
        let ctx = context(json!({"user": "not a record"}));
        assert_eq!(pluck(&ctx, "user.avatar.url").unwrap(), "");
        assert_eq!(pluck(&ctx, "account.id").unwrap(), "");
    }

    #[test]
    fn pluck_chain() {
        let ctx = context(json!({"user": {"id": 42}}));
        assert_eq!(pluck(&ctx, "user.id").unwrap(), "42");
    }

    #[test]
    fn pluck_null_is_empty() {
        let ctx = context(json!({"name": null}));
        assert_eq!(pluck(&ctx, "name").unwrap(), "");
    }

    #[test]
    fn pluck_falsy_leaves_are_empty() {
        let ctx = context(json!({"count": 0, "flag": false, "s": "", "on": true, "n": 1.5}));
        assert_eq!(pluck(&ctx, "count").unwrap(), "");
        assert_eq!(pluck(&ctx, "flag").unwrap(), "");
        assert_eq!(pluck(&ctx, "s").unwrap(), "");
        assert_eq!(pluck(&ctx, "on").unwrap(), "true");
        assert_eq!(pluck(&ctx, "n").unwrap(), "1.5");

        let nan = Record::new().with("x", f64::NAN);
        assert_eq!(pluck(&nan, "x").unwrap(), "");
    }

    #[test]
    fn pluck_self_containing_record_terminates() {
        let ctx = context(json!({"name": "Hubot"}));
        ctx.insert("me", Value::Record(ctx.clone()));
        let text = pluck(&ctx, "me").unwrap();
        assert!(text.contains(r#""me":null"#));
        assert!(text.contains(r#""name":"Hubot""#));
    }

    #[test]
    fn pluck_calls_function_leaf() {
        let ctx = Record::new().with("name", Value::function(|| Ok("Hubot".into())));
        assert_eq!(pluck(&ctx, "name").unwrap(), "Hubot");
    }

    #[test]
    fn pluck_calls_function_in_the_middle() {
        let user = Record::new().with("id", 7);
        let ctx = Record::new().with(
            "user",
            Value::function(move || Ok(Value::Record(user.clone()))),
        );
        assert_eq!(pluck(&ctx, "user.id").unwrap(), "7");
    }

    #[test]
    fn failing_function_propagates() {
        let ctx = Record::new().with("name", Value::function(|| Err(anyhow::anyhow!("offline"))));
        let err = pluck(&ctx, "name").unwrap_err();
        assert!(matches!(err, StacheError::Callable { ref path, .. } if path == "name"));
    }

    #[test]
    fn pluck_escapes_markup() {
        let ctx = context(json!({"name": "<b>Tom & Jerry</b>"}));
        assert_eq!(
            pluck(&ctx, "name").unwrap(),
            "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;"
        );
    }

    #[test]
    fn assign_nested_field() {
        let ctx = context(json!({"user": {"avatar": {"url": "/hubot.png"}}}));
        assign(&ctx, "user.avatar.url", Value::from("/bender.png")).unwrap();
        assert_eq!(pluck(&ctx, "user.avatar.url").unwrap(), "/bender.png");

        assign(&ctx, "title", Value::from("Hi")).unwrap();
        assert_eq!(pluck(&ctx, "title").unwrap(), "Hi");
    }

    #[test]
    fn assign_through_non_record_fails() {
        let ctx = context(json!({"user": "Hubot"}));
        let err = assign(&ctx, "user.name", Value::from("x")).unwrap_err();
        assert!(matches!(err, StacheError::InvalidAssignment { .. }));
    }

    #[test]
    fn pluck_array_index() {
        let ctx = context(json!({"items": ["first", "second"]}));
        assert_eq!(pluck(&ctx, "items.1").unwrap(), "second");
    }
}
