//! Capture engine: parses `name : path` directive lines out of a step's
//! `capture` text block and writes the extracted values into the run's
//! variable store. A missing extraction is silently skipped, never a
//! failure — no escalation or error-code machinery here.

use std::collections::HashMap;

use serde_json::Value;

use crate::interpolate::VariableStore;
use crate::jsonpath;

/// Applies every capture directive in `spec`, writing resolved values into
/// `store` and returning the subset that actually matched (for reporting).
pub fn apply_captures(spec: &str, body: Option<&Value>, store: &mut VariableStore) -> HashMap<String, Value> {
    let mut captured = HashMap::new();
    let Some(body) = body else {
        return captured;
    };

    for line in spec.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((name, path)) = trimmed.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let path = path.trim();
        if name.is_empty() {
            continue;
        }
        if let Some(value) = jsonpath::extract(body, path) {
            store.set(name, value.clone());
            captured.insert(name.to_string(), value);
        }
    }

    captured
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn captures_named_path_into_store() {
        let body = json!({"user": {"id": 42}});
        let mut store = VariableStore::new();
        let captured = apply_captures("userId : user.id", Some(&body), &mut store);
        assert_eq!(captured.get("userId"), Some(&json!(42)));
        assert_eq!(store.get("userId"), Some(&json!(42)));
    }

    #[test]
    fn skips_comment_and_blank_lines() {
        let body = json!({"a": 1});
        let mut store = VariableStore::new();
        let captured = apply_captures("# a comment\n\nval : a", Some(&body), &mut store);
        assert_eq!(captured.len(), 1);
    }

    #[test]
    fn silently_skips_missing_path() {
        let body = json!({"a": 1});
        let mut store = VariableStore::new();
        let captured = apply_captures("val : missing.path", Some(&body), &mut store);
        assert!(captured.is_empty());
        assert!(store.get("val").is_none());
    }

    #[test]
    fn no_body_skips_all_directives() {
        let mut store = VariableStore::new();
        let captured = apply_captures("val : a", None, &mut store);
        assert!(captured.is_empty());
    }
}
