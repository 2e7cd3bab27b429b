//! Property-based tests for merging and splitting configuration maps.
//!
//! These tests use proptest to generate random nested maps and verify that
//! the merge invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::merge::{merge, split_map, strip_merge_tokens, MERGE_TOKEN};
    use crate::value::{ConfigMap, ConfigValue};
    use proptest::prelude::*;

    fn scalar() -> impl Strategy<Value = ConfigValue> {
        prop_oneof![
            Just(ConfigValue::Null),
            any::<bool>().prop_map(ConfigValue::Bool),
            any::<i64>().prop_map(ConfigValue::from),
            "[a-z]{0,6}".prop_map(ConfigValue::String),
        ]
    }

    fn value() -> impl Strategy<Value = ConfigValue> {
        scalar().prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(ConfigValue::List),
                prop::collection::btree_map("[a-d]", inner, 0..4).prop_map(ConfigValue::Map),
            ]
        })
    }

    fn config_map() -> impl Strategy<Value = ConfigMap> {
        prop::collection::btree_map("[a-f]{1,2}", value(), 0..6)
    }

    // ============================================================================
    // split/merge round trip
    // ============================================================================

    proptest! {
        /// Property: merging the two halves of a split reproduces the input
        #[test]
        fn split_then_merge_is_identity(input in config_map(), pivot in "[a-f]") {
            let (matching, unmatching) = split_map(&input, |path, _| path < pivot.as_str());
            prop_assert_eq!(merge(Some(&matching), Some(&unmatching)), input);
        }

        /// Property: splitting by value type also round-trips
        #[test]
        fn split_by_type_then_merge_is_identity(input in config_map()) {
            let (matching, unmatching) =
                split_map(&input, |_, value| matches!(value, ConfigValue::String(_)));
            prop_assert_eq!(merge(Some(&matching), Some(&unmatching)), input);
        }

        /// Property: a constant predicate puts everything on one side
        #[test]
        fn split_with_constant_predicate_is_one_sided(input in config_map()) {
            let (matching, _) = split_map(&input, |_, _| true);
            let (_, unmatching) = split_map(&input, |_, _| false);
            prop_assert_eq!(&matching, &input);
            prop_assert_eq!(&unmatching, &input);
        }
    }

    // ============================================================================
    // merge identities
    // ============================================================================

    proptest! {
        /// Property: merging with nothing returns the other side
        #[test]
        fn merge_with_empty_is_identity(input in config_map()) {
            prop_assert_eq!(merge(Some(&input), None), input.clone());
            prop_assert_eq!(merge(None, Some(&input)), input.clone());
            prop_assert_eq!(merge(Some(&ConfigMap::new()), Some(&input)), input);
        }

        /// Property: merging a map with itself returns it unchanged
        #[test]
        fn merge_is_idempotent(input in config_map()) {
            prop_assert_eq!(merge(Some(&input), Some(&input)), input);
        }

        /// Property: non-null override scalars always win
        #[test]
        fn override_scalars_win(base in config_map(), over in config_map()) {
            let merged = merge(Some(&base), Some(&over));
            for (key, value) in &over {
                let is_scalar = !matches!(value, ConfigValue::Null | ConfigValue::List(_) | ConfigValue::Map(_));
                if is_scalar {
                    prop_assert_eq!(&merged[key], value);
                }
            }
        }

        /// Property: merge never mutates its inputs and keeps every key
        #[test]
        fn merge_keeps_all_keys(base in config_map(), over in config_map()) {
            let base_before = base.clone();
            let over_before = over.clone();
            let merged = merge(Some(&base), Some(&over));
            prop_assert_eq!(&base, &base_before);
            prop_assert_eq!(&over, &over_before);
            for key in base.keys().chain(over.keys()) {
                prop_assert!(merged.contains_key(key));
            }
        }

        /// Property: splicing keeps every frame element and inserts the other list once
        #[test]
        fn splice_keeps_frame_order(
            head in prop::collection::vec("[a-c]", 0..3),
            tail in prop::collection::vec("[x-z]", 0..3),
            insert in prop::collection::vec("[m-o]", 0..3),
        ) {
            let frame: Vec<ConfigValue> = head
                .iter()
                .map(|s| ConfigValue::from(s.as_str()))
                .chain(std::iter::once(ConfigValue::from(MERGE_TOKEN)))
                .chain(tail.iter().map(|s| ConfigValue::from(s.as_str())))
                .collect();
            let base: ConfigMap = [("k".to_string(), ConfigValue::List(frame))].into();
            let over: ConfigMap = [(
                "k".to_string(),
                ConfigValue::List(insert.iter().map(|s| ConfigValue::from(s.as_str())).collect()),
            )]
            .into();

            let merged = merge(Some(&base), Some(&over));
            let items = merged["k"].as_list().unwrap_or_default();

            let mut expected: Vec<String> = Vec::new();
            for s in head.iter().chain(insert.iter()).chain(tail.iter()) {
                if !expected.contains(s) {
                    expected.push(s.clone());
                }
            }
            let actual: Vec<String> = items.iter().map(|v| v.to_text()).collect();
            prop_assert_eq!(actual, expected);
            prop_assert_eq!(strip_merge_tokens(&merged), merged);
        }
    }
}
