//! Splitting a map in two by predicate
//!
//! `split_map` is the inverse of [`merge`](super::merge) for disjoint maps:
//! every leaf entry lands in exactly one of the two outputs at its original
//! nesting path, so merging the halves reproduces the input.

use crate::value::{ConfigMap, ConfigValue};

/// Partition `input` into `(matching, unmatching)`.
///
/// Nested non-empty maps are descended into; every other value (scalars,
/// lists, empty maps) is a leaf and is judged as a whole. The predicate
/// receives the dotted path of the leaf and its value.
pub fn split_map<F>(input: &ConfigMap, predicate: F) -> (ConfigMap, ConfigMap)
where
    F: Fn(&str, &ConfigValue) -> bool,
{
    let mut matching = ConfigMap::new();
    let mut unmatching = ConfigMap::new();
    split_into(input, "", &predicate, &mut matching, &mut unmatching);
    (matching, unmatching)
}

fn split_into<F>(
    input: &ConfigMap,
    prefix: &str,
    predicate: &F,
    matching: &mut ConfigMap,
    unmatching: &mut ConfigMap,
) where
    F: Fn(&str, &ConfigValue) -> bool,
{
    for (key, value) in input {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            ConfigValue::Map(nested) if !nested.is_empty() => {
                let mut nested_matching = ConfigMap::new();
                let mut nested_unmatching = ConfigMap::new();
                split_into(
                    nested,
                    &path,
                    predicate,
                    &mut nested_matching,
                    &mut nested_unmatching,
                );
                if !nested_matching.is_empty() {
                    matching.insert(key.clone(), ConfigValue::Map(nested_matching));
                }
                if !nested_unmatching.is_empty() {
                    unmatching.insert(key.clone(), ConfigValue::Map(nested_unmatching));
                }
            }
            _ => {
                let target = if predicate(&path, value) {
                    &mut *matching
                } else {
                    &mut *unmatching
                };
                target.insert(key.clone(), value.clone());
            }
        }
    }
}
