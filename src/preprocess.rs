//! Input preprocessing: key migration and base-structure merging.
//!
//! Both transforms run before validation, migration first, so migrated
//! keys participate in the base merge and `when` predicates observe the
//! fully preprocessed root document.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Action applied to one top-level key.
#[derive(Clone)]
enum MigrateAction {
    /// Move the value to a new key, removing the old one.
    Rename(String),
    /// Replace the value in place; the key stays.
    Transform(Arc<dyn Fn(&Value) -> Value + Send + Sync>),
}

/// Top-level key migration for evolving stored documents across schema
/// versions: renames and value rewrites applied before validation.
///
/// Every rule reads from an immutable snapshot of the original input, so
/// rules never observe each other's effects. A rename chain like
/// `a -> b, b -> c` therefore moves the original `a` to `b` and the
/// original `b` to `c`; rule order only matters when two rules write the
/// same destination key, in which case the later rule wins. Only
/// top-level keys are addressed; nested structures pass through
/// unchanged, and non-mapping input is returned untouched.
#[derive(Clone, Default)]
pub struct Migration {
    rules: Vec<(String, MigrateAction)>,
}

impl Migration {
    pub fn new() -> Self {
        Migration { rules: Vec::new() }
    }

    /// Moves the value under `from` to `to`, removing `from`. An existing
    /// value under `to` is overwritten. No-op when `from` is absent.
    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rules
            .push((from.into(), MigrateAction::Rename(to.into())));
        self
    }

    /// Replaces the value under `key` with `f(old_value)`. No-op when
    /// `key` is absent.
    pub fn transform<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.rules
            .push((key.into(), MigrateAction::Transform(Arc::new(f))));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies the rules to a top-level mapping.
    pub(crate) fn apply(&self, input: &Value) -> Value {
        let snapshot = match input.as_object() {
            Some(map) => map,
            None => return input.clone(),
        };
        let mut out = snapshot.clone();
        // Remove every rename source first so a rename whose destination
        // is another rule's source cannot clobber it mid-pass.
        for (from, action) in &self.rules {
            if matches!(action, MigrateAction::Rename(_)) && snapshot.contains_key(from) {
                out.remove(from);
            }
        }
        for (from, action) in &self.rules {
            let original = match snapshot.get(from) {
                Some(value) => value,
                None => continue,
            };
            match action {
                MigrateAction::Rename(to) => {
                    out.insert(to.clone(), original.clone());
                }
                MigrateAction::Transform(f) => {
                    out.insert(from.clone(), f(original));
                }
            }
        }
        Value::Object(out)
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for (from, action) in &self.rules {
            match action {
                MigrateAction::Rename(to) => list.entry(&format!("rename {} -> {}", from, to)),
                MigrateAction::Transform(_) => list.entry(&format!("transform {}", from)),
            };
        }
        list.finish()
    }
}

/// Recursively fills keys missing from `input` with values from `base`.
///
/// Presence governs, not truthiness: a key present in the input keeps its
/// value even when falsy. Where both sides hold mappings the merge
/// recurses; in every other conflict the input side wins. Non-mapping
/// input is returned untouched.
pub(crate) fn merge_base(input: &Value, base: &Value) -> Value {
    match (input, base) {
        (Value::Object(input_map), Value::Object(base_map)) => {
            let mut out = input_map.clone();
            for (key, base_value) in base_map {
                match input_map.get(key) {
                    None => {
                        out.insert(key.clone(), base_value.clone());
                    }
                    Some(input_value) => {
                        if input_value.is_object() && base_value.is_object() {
                            out.insert(key.clone(), merge_base(input_value, base_value));
                        }
                    }
                }
            }
            Value::Object(out)
        }
        _ => input.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_migration_has_no_rules() {
        assert!(Migration::new().is_empty());
        assert!(!Migration::new().rename("a", "b").is_empty());
        assert!(!Migration::new().transform("k", |old| old.clone()).is_empty());
    }

    #[test]
    fn test_rename_moves_value_and_removes_source() {
        let migration = Migration::new().rename("hostname", "host");
        let out = migration.apply(&json!({"hostname": "db1", "port": 5432}));
        assert_eq!(out, json!({"host": "db1", "port": 5432}));
    }

    #[test]
    fn test_rename_absent_key_is_noop() {
        let migration = Migration::new().rename("old", "new");
        let out = migration.apply(&json!({"other": 1}));
        assert_eq!(out, json!({"other": 1}));
    }

    #[test]
    fn test_rename_overwrites_existing_destination() {
        let migration = Migration::new().rename("old", "new");
        let out = migration.apply(&json!({"old": 1, "new": 2}));
        assert_eq!(out, json!({"new": 1}));
    }

    #[test]
    fn test_rules_read_from_snapshot_not_each_other() {
        // a -> b and b -> c move the *original* values; the chain does
        // not cascade a into c.
        let migration = Migration::new().rename("a", "b").rename("b", "c");
        let out = migration.apply(&json!({"a": 1, "b": 2}));
        assert_eq!(out, json!({"b": 1, "c": 2}));
    }

    #[test]
    fn test_rule_order_is_irrelevant_without_destination_overlap() {
        let input = json!({"a": 1, "b": 2});
        let forward = Migration::new().rename("a", "x").rename("b", "y");
        let backward = Migration::new().rename("b", "y").rename("a", "x");
        assert_eq!(forward.apply(&input), backward.apply(&input));
    }

    #[test]
    fn test_later_rule_wins_on_destination_collision() {
        let migration = Migration::new().rename("a", "x").rename("b", "x");
        let out = migration.apply(&json!({"a": 1, "b": 2}));
        assert_eq!(out, json!({"x": 2}));
    }

    #[test]
    fn test_transform_rewrites_in_place() {
        let migration = Migration::new().transform("port", |old| match old.as_str() {
            Some(s) => s.parse::<i64>().map(Value::from).unwrap_or_else(|_| old.clone()),
            None => old.clone(),
        });
        let out = migration.apply(&json!({"port": "5432"}));
        assert_eq!(out, json!({"port": 5432}));
    }

    #[test]
    fn test_transform_reads_original_value() {
        // Two transforms of the same key both see the snapshot; the later
        // rule's output wins.
        let migration = Migration::new()
            .transform("n", |old| json!(old.as_i64().unwrap_or(0) + 1))
            .transform("n", |old| json!(old.as_i64().unwrap_or(0) * 10));
        let out = migration.apply(&json!({"n": 3}));
        assert_eq!(out, json!({"n": 30}));
    }

    #[test]
    fn test_non_mapping_input_passes_through() {
        let migration = Migration::new().rename("a", "b");
        assert_eq!(migration.apply(&json!([1, 2])), json!([1, 2]));
        assert_eq!(migration.apply(&json!(42)), json!(42));
    }

    #[test]
    fn test_migration_touches_top_level_only() {
        let migration = Migration::new().rename("host", "hostname");
        let out = migration.apply(&json!({"db": {"host": "x"}}));
        assert_eq!(out, json!({"db": {"host": "x"}}));
    }

    #[test]
    fn test_merge_fills_missing_keys() {
        let out = merge_base(&json!({"a": 1}), &json!({"a": 9, "b": 2}));
        assert_eq!(out, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_merge_presence_beats_truthiness() {
        let out = merge_base(
            &json!({"enabled": false, "name": "", "count": 0}),
            &json!({"enabled": true, "name": "default", "count": 10}),
        );
        assert_eq!(out, json!({"enabled": false, "name": "", "count": 0}));
    }

    #[test]
    fn test_merge_recurses_into_nested_mappings() {
        let input = json!({"db": {"host": "custom"}});
        let base = json!({"db": {"host": "localhost", "port": 5432}, "debug": false});
        let out = merge_base(&input, &base);
        assert_eq!(
            out,
            json!({"db": {"host": "custom", "port": 5432}, "debug": false})
        );
    }

    #[test]
    fn test_merge_input_wins_on_kind_conflict() {
        // Input holds a scalar where base holds a mapping: input wins.
        let out = merge_base(&json!({"db": "disabled"}), &json!({"db": {"port": 5432}}));
        assert_eq!(out, json!({"db": "disabled"}));
    }

    #[test]
    fn test_merge_non_mapping_input_passes_through() {
        assert_eq!(merge_base(&json!([1]), &json!({"a": 1})), json!([1]));
        assert_eq!(merge_base(&json!(null), &json!({"a": 1})), json!(null));
    }
}
