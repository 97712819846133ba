//! Property-based tests for path resolution using proptest.
//!
//! These tests check the resolution rules over generated graphs:
//!
//! - A successful write is visible to a read of the same path
//! - Writes never create missing intermediate containers
//! - Writing one past the end of a list appends exactly one element
//! - Name lookups fall back to case-insensitive matching
//! - Integer segments address list elements, never dictionary keys

#[cfg(test)]
mod tests {
    use proptest::collection::{btree_map, vec};
    use proptest::prelude::*;
    use serde_json::{json, Value as Json};

    use crate::path::enumerate;
    use crate::resolver::{set_path, try_get_path};

    fn name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,7}"
    }

    fn leaf() -> impl Strategy<Value = Json> {
        prop_oneof![
            Just(Json::Null),
            any::<bool>().prop_map(Json::from),
            any::<i64>().prop_map(Json::from),
            "[ -~]{0,12}".prop_map(Json::from),
        ]
    }

    fn object() -> impl Strategy<Value = Json> {
        btree_map(name(), leaf(), 0..6).prop_map(|m| json!(m))
    }

    // =========================================================================
    // Reads and writes
    // =========================================================================

    proptest! {
        /// A write to a key of an existing object is read back unchanged.
        #[test]
        fn write_then_read(root in object(), key in name(), value in leaf()) {
            let mut root = json!({"outer": root});
            let path = format!("outer.{}", key);

            set_path(&mut root, &path, value.clone()).unwrap();
            prop_assert_eq!(try_get_path(&root, &path), Some(value));
        }

        /// Writing below a missing key fails and leaves the root untouched.
        #[test]
        fn write_never_densifies(
            root in object(),
            missing in "[A-Z]{1,6}",
            tail in vec(name(), 1..4),
            value in leaf()
        ) {
            let before = root.clone();
            let mut root = root;
            let path = format!("{}.{}", missing, tail.join("."));

            prop_assert!(set_path(&mut root, &path, value).is_err());
            prop_assert_eq!(root, before);
        }

        /// Index `len` appends one element; any index beyond fails.
        #[test]
        fn append_exactly_one(
            items in vec(leaf(), 0..8),
            value in leaf(),
            gap in 1usize..5
        ) {
            let len = items.len();
            let mut root = json!({"items": items});

            let err = set_path(&mut root, &format!("items[{}]", len + gap), value.clone());
            prop_assert!(err.is_err());
            prop_assert_eq!(root["items"].as_array().map(Vec::len), Some(len));

            set_path(&mut root, &format!("items[{}]", len), value.clone()).unwrap();
            prop_assert_eq!(root["items"].as_array().map(Vec::len), Some(len + 1));
            prop_assert_eq!(&root["items"][len], &value);
        }

        /// Overwriting an existing element keeps the list length.
        #[test]
        fn overwrite_keeps_length(
            items in vec(leaf(), 1..8),
            index in any::<prop::sample::Index>(),
            value in leaf()
        ) {
            let len = items.len();
            let i = index.index(len);
            let mut root = json!({"items": items});

            set_path(&mut root, &format!("items[{}]", i), value.clone()).unwrap();
            prop_assert_eq!(root["items"].as_array().map(Vec::len), Some(len));
            prop_assert_eq!(try_get_path(&root, &format!("items[{}]", i)), Some(value));
        }
    }

    // =========================================================================
    // Name and index matching
    // =========================================================================

    proptest! {
        /// A key is found under any casing when there is no exact match.
        #[test]
        fn case_insensitive_fallback(key in "[a-z]{1,8}", value in leaf()) {
            let mut map = serde_json::Map::new();
            map.insert(key.clone(), value.clone());
            let root = Json::Object(map);

            prop_assert_eq!(try_get_path(&root, &key.to_uppercase()), Some(value.clone()));
            prop_assert_eq!(try_get_path(&root, &key), Some(value));
        }

        /// An exact match wins over a case-insensitive one.
        #[test]
        fn exact_match_preferred(key in "[a-z]{1,8}") {
            let upper = key.to_uppercase();
            let root = json!({ key.clone(): "lower", upper.clone(): "upper" });

            prop_assert_eq!(try_get_path(&root, &key), Some(json!("lower")));
            prop_assert_eq!(try_get_path(&root, &upper), Some(json!("upper")));
        }

        /// Integer-looking segments never address dictionary keys.
        #[test]
        fn numeric_segment_is_index(n in 0i64..1000, value in leaf()) {
            let root = json!({ n.to_string(): value });

            prop_assert_eq!(try_get_path(&root, &format!("[{}]", n)), None);
            prop_assert_eq!(try_get_path(&root, &n.to_string()), None);
        }

        /// Dotted identifiers enumerate back to the same names.
        #[test]
        fn enumeration_splits_names(names in vec(name(), 1..6)) {
            let path = names.join(".");
            let segments: Vec<_> = enumerate(&path).collect();

            prop_assert_eq!(segments.len(), names.len());
            for (segment, expected) in segments.iter().zip(&names) {
                prop_assert_eq!(segment.text(), expected.as_str());
            }
            prop_assert!(segments.last().map_or(false, |s| s.is_terminal()));
        }

        /// Bracketed indices enumerate as index segments.
        #[test]
        fn enumeration_indices(indices in vec(0i64..10_000, 1..5)) {
            let path: String = indices.iter().map(|i| format!("items[{}]", i)).collect::<Vec<_>>().join(".");
            let parsed: Vec<_> = enumerate(&path).filter_map(|s| s.index()).collect();

            prop_assert_eq!(parsed, indices);
        }
    }
}
