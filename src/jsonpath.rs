//! Dotted-key JSON path extraction: no array indexing, no wildcards, just
//! a chain of object key lookups. The empty path always resolves to the
//! root value.

use serde_json::Value;

/// Walks `root` through each `.`-separated segment of `path`, returning
/// `None` as soon as a segment is missing or the current value isn't an
/// object. `extract(root, "")` always returns `Some(root)`.
pub fn extract(root: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return Some(root.clone());
    }

    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_path_returns_root() {
        let root = json!({"a": 1});
        assert_eq!(extract(&root, ""), Some(root.clone()));
    }

    #[test]
    fn single_segment_reads_top_level_key() {
        let root = json!({"status": "ok"});
        assert_eq!(extract(&root, "status"), Some(json!("ok")));
    }

    #[test]
    fn nested_segments_walk_objects() {
        let root = json!({"user": {"profile": {"name": "ada"}}});
        assert_eq!(extract(&root, "user.profile.name"), Some(json!("ada")));
    }

    #[test]
    fn missing_key_returns_none() {
        let root = json!({"a": 1});
        assert_eq!(extract(&root, "b"), None);
    }

    #[test]
    fn segment_through_non_object_returns_none() {
        let root = json!({"a": 1});
        assert_eq!(extract(&root, "a.b"), None);
    }

    #[test]
    fn segment_through_array_returns_none() {
        let root = json!({"items": [1, 2, 3]});
        assert_eq!(extract(&root, "items.0"), None);
    }

    #[test]
    fn composability_matches_two_step_chaining() {
        let root = json!({"a": {"b": {"c": 7}}});
        let intermediate = extract(&root, "a.b").unwrap();
        assert_eq!(extract(&intermediate, "c"), extract(&root, "a.b.c"));
    }
}
