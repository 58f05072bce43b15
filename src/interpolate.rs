//! Variable store and `{{name}}` interpolation. A missing name is left as
//! the literal token rather than an error — flows are written by end
//! users, not deploy-time operators, so a typo should surface in the
//! response body, not abort the run.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde_json::Value;

static INTERPOLATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*(\$?[A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").unwrap());

/// Named values captured during a run, available to later steps.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    variables: HashMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn resolve_token(store: &VariableStore, token: &str) -> Option<String> {
    match token {
        "$timestamp" => Some(current_unix_timestamp().to_string()),
        "$randomInt" => Some(random_int().to_string()),
        name => store.get(name).map(stringify),
    }
}

fn current_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn random_int() -> u32 {
    rand::thread_rng().gen_range(0..10_000)
}

/// Replaces every `{{name}}` token in `input`. Tokens that don't resolve
/// (unknown variable name) are left verbatim, braces included.
pub fn interpolate_str(store: &VariableStore, input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut last = 0;

    for caps in INTERPOLATION_RE.captures_iter(input) {
        let whole = caps.get(0).unwrap();
        output.push_str(&input[last..whole.start()]);
        let token = caps.get(1).unwrap().as_str();
        match resolve_token(store, token) {
            Some(resolved) => output.push_str(&resolved),
            None => output.push_str(whole.as_str()),
        }
        last = whole.end();
    }
    output.push_str(&input[last..]);
    output
}

/// Recursively interpolates every string leaf of a JSON value.
pub fn interpolate_value(store: &VariableStore, value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(interpolate_str(store, s)),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| interpolate_value(store, v)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), interpolate_value(store, v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_variable() {
        let mut store = VariableStore::new();
        store.set("token", Value::String("abc123".into()));
        assert_eq!(interpolate_str(&store, "Bearer {{token}}"), "Bearer abc123");
    }

    #[test]
    fn leaves_missing_variable_literal() {
        let store = VariableStore::new();
        assert_eq!(interpolate_str(&store, "{{missing}}"), "{{missing}}");
    }

    #[test]
    fn timestamp_builtin_is_numeric() {
        let store = VariableStore::new();
        let out = interpolate_str(&store, "{{$timestamp}}");
        assert!(out.parse::<u64>().is_ok());
    }

    #[test]
    fn random_int_builtin_is_within_bounds() {
        let store = VariableStore::new();
        let out = interpolate_str(&store, "{{$randomInt}}");
        let value: u32 = out.parse().expect("numeric");
        assert!(value < 10_000);
    }

    #[test]
    fn non_string_value_stringified_without_quotes() {
        let mut store = VariableStore::new();
        store.set("count", Value::from(3));
        assert_eq!(interpolate_str(&store, "{{count}}"), "3");
    }

    #[test]
    fn interpolates_nested_object_leaves() {
        let mut store = VariableStore::new();
        store.set("id", Value::String("42".into()));
        let value = serde_json::json!({"user": {"id": "{{id}}"}, "tags": ["{{id}}"]});
        let result = interpolate_value(&store, &value);
        assert_eq!(result["user"]["id"], "42");
        assert_eq!(result["tags"][0], "42");
    }
}
