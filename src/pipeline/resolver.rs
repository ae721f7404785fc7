//! Argument resolution for pipeline steps
//!
//! Resolution policy: an exact nested-path walk. Each dotted path is split
//! into segments and matched against object keys level by level; the walk
//! stops and yields `Value::Null` as soon as any segment is unresolvable.
//! There is no recursive "find the key anywhere" fallback — ambiguous nested
//! keys resolve deterministically or not at all.
//!
//! Unresolved paths are never an error: the `Null` placeholder keeps its
//! position in the argument list and the task function decides what a missing
//! argument means.

use serde_json::{Map, Value};

use crate::pipeline::cache::CacheStore;
use crate::pipeline::spec::TaskSpec;

/// Walk `source` along one dotted path, cloning the value at the end.
///
/// Returns `Value::Null` if any segment is missing or an intermediate value
/// is not an object.
pub fn resolve_path(source: &Value, path: &str) -> Value {
    let mut current = source;
    for segment in path.split('.') {
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => current = next,
                None => return Value::Null,
            },
            _ => return Value::Null,
        }
    }
    current.clone()
}

/// Resolve an ordered list of paths against one source value.
///
/// The output always has the same length and order as `paths`.
pub fn resolve_paths(source: &Value, paths: &[String]) -> Vec<Value> {
    paths.iter().map(|path| resolve_path(source, path)).collect()
}

/// Resolve one dotted path against a top-level request payload map.
pub fn resolve_map_path(payload: &Map<String, Value>, path: &str) -> Value {
    let mut segments = path.split('.');
    // split always yields at least one segment
    let first = segments.next().unwrap_or_default();
    let Some(mut current) = payload.get(first) else {
        return Value::Null;
    };
    for segment in segments {
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => current = next,
                None => return Value::Null,
            },
            _ => return Value::Null,
        }
    }
    current.clone()
}

/// Assemble the argument list for one task spec.
///
/// Request-sourced values come first (in `request_args_keys` order), followed
/// by previous-task values (in `prev_task_data_args` order). A cache miss for
/// the previous task resolves every one of its paths to `Null`.
pub fn resolve_task_args(
    spec: &TaskSpec,
    request_args: &Map<String, Value>,
    cache: &CacheStore,
) -> Vec<Value> {
    let mut args = Vec::new();

    if let Some(request) = &spec.request_args {
        for path in &request.request_args_keys {
            args.push(resolve_map_path(request_args, path));
        }
    }

    if let Some(prev) = &spec.prev_task_data_as_arg {
        match cache.get(prev.prev_task_id) {
            Some(data) => {
                for path in &prev.prev_task_data_args {
                    args.push(resolve_path(data, path));
                }
            }
            None => args.extend(prev.prev_task_data_args.iter().map(|_| Value::Null)),
        }
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::spec::{task_fn, TaskSpec};
    use proptest::prelude::*;
    use serde_json::json;

    fn noop_spec(task_id: u64) -> TaskSpec {
        TaskSpec::new(task_id, "noop", task_fn(|_| async { Ok(json!(null)) }))
    }

    #[test]
    fn test_nested_walk_finds_values() {
        let source = json!({"a": {"b": {"c": 42}}, "d": 10, "e": {"f": 50}});
        let paths: Vec<String> = ["a.b.c", "d", "e.f", "g.h"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let values = resolve_paths(&source, &paths);
        assert_eq!(values, vec![json!(42), json!(10), json!(50), Value::Null]);
    }

    #[test]
    fn test_missing_intermediate_segment_yields_null() {
        let source = json!({"a": {"x": 1}});
        assert_eq!(resolve_path(&source, "a.b.c"), Value::Null);
    }

    #[test]
    fn test_walk_through_non_object_yields_null() {
        let source = json!({"a": 5});
        assert_eq!(resolve_path(&source, "a.b"), Value::Null);
    }

    #[test]
    fn test_no_recursive_search_for_nested_keys() {
        // The key exists deeper in the tree, but only the exact path matches.
        let source = json!({"outer": {"target": 1}});
        assert_eq!(resolve_path(&source, "target"), Value::Null);
        assert_eq!(resolve_path(&source, "outer.target"), json!(1));
    }

    #[test]
    fn test_map_path_resolution() {
        let payload = json!({"user": {"id": 7}, "limit": 20});
        let payload = payload.as_object().unwrap();

        assert_eq!(resolve_map_path(payload, "user.id"), json!(7));
        assert_eq!(resolve_map_path(payload, "limit"), json!(20));
        assert_eq!(resolve_map_path(payload, "missing"), Value::Null);
    }

    #[test]
    fn test_request_args_precede_prev_task_args() {
        let payload = json!({"key1": "req"});
        let payload = payload.as_object().unwrap();

        let mut cache = CacheStore::new();
        cache.set(1, json!({"x": "prev"}));

        let spec = noop_spec(2)
            .with_request_args(["key1"])
            .with_prev_task_data(1, ["x"]);

        let args = resolve_task_args(&spec, payload, &cache);
        assert_eq!(args, vec![json!("req"), json!("prev")]);
    }

    #[test]
    fn test_cache_miss_resolves_prev_args_to_null() {
        let payload = Map::new();
        let cache = CacheStore::new();

        let spec = noop_spec(2).with_prev_task_data(9, ["x", "y"]);

        let args = resolve_task_args(&spec, &payload, &cache);
        assert_eq!(args, vec![Value::Null, Value::Null]);
    }

    #[test]
    fn test_spec_without_sourcing_rules_gets_no_args() {
        let payload = Map::new();
        let cache = CacheStore::new();

        let args = resolve_task_args(&noop_spec(1), &payload, &cache);
        assert!(args.is_empty());
    }

    proptest! {
        /// A value nested along any chain of keys is found by the exact path.
        #[test]
        fn prop_exact_path_finds_nested_leaf(
            segments in proptest::collection::vec("[a-z]{1,8}", 1..5),
            leaf in any::<i64>(),
        ) {
            let mut value = json!(leaf);
            for segment in segments.iter().rev() {
                value = json!({ segment.clone(): value });
            }

            let path = segments.join(".");
            prop_assert_eq!(resolve_path(&value, &path), json!(leaf));
        }

        /// Extending a resolvable path past its leaf yields Null, not an error.
        #[test]
        fn prop_overlong_path_yields_null(
            segments in proptest::collection::vec("[a-z]{1,8}", 1..4),
            leaf in any::<i64>(),
        ) {
            let mut value = json!(leaf);
            for segment in segments.iter().rev() {
                value = json!({ segment.clone(): value });
            }

            let path = format!("{}.extra", segments.join("."));
            prop_assert_eq!(resolve_path(&value, &path), Value::Null);
        }
    }
}
