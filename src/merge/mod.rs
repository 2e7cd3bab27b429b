//! Deep merge of configuration maps
//!
//! This module implements the merge used everywhere configuration is
//! inherited: environment → tenant/node, role → super-role, role → variant.
//!
//! ## Rules
//!
//! For `merge(base, override)`, values sharing a key are combined as follows:
//!
//! - Maps: recursively merged.
//! - Lists: if either list contains the merge token ([`MERGE_TOKEN`]) the
//!   other list is spliced in at the token's position, otherwise the override
//!   list replaces the base list.
//! - Anything else: the override value wins unless it is null.
//!
//! Inputs are never mutated; every call returns a new map.
//!
//! ## Example
//!
//! ```
//! use confgen::merge::merge;
//! use confgen::value::map_from_yaml;
//!
//! let base = map_from_yaml("k: [x, '<<merge>>', y]").unwrap();
//! let over = map_from_yaml("k: [p, q]").unwrap();
//! let merged = merge(Some(&base), Some(&over));
//! assert_eq!(merged, map_from_yaml("k: [x, p, q, y]").unwrap());
//! ```

pub mod split;

use log::warn;

use crate::value::{ConfigMap, ConfigValue};

pub use split::split_map;

/// List element marking where the other side's list is spliced in.
pub const MERGE_TOKEN: &str = "<<merge>>";

/// Whether a value is the merge token.
pub fn is_merge_token(value: &ConfigValue) -> bool {
    value.as_str() == Some(MERGE_TOKEN)
}

/// Deep-merge `override_map` onto `base`. Absent arguments are treated as empty.
pub fn merge(base: Option<&ConfigMap>, override_map: Option<&ConfigMap>) -> ConfigMap {
    match (base, override_map) {
        (None, None) => ConfigMap::new(),
        (Some(base), None) => base.clone(),
        (None, Some(over)) => over.clone(),
        (Some(base), Some(over)) => merge_maps(base, over, ""),
    }
}

fn merge_maps(base: &ConfigMap, over: &ConfigMap, path: &str) -> ConfigMap {
    let mut result = base.clone();
    for (key, value) in over {
        let key_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };
        let merged = match result.get(key) {
            Some(existing) => merge_values(existing, value, &key_path),
            None => value.clone(),
        };
        result.insert(key.clone(), merged);
    }
    result
}

/// Merge two values found at the same key path.
pub fn merge_values(base: &ConfigValue, over: &ConfigValue, path: &str) -> ConfigValue {
    match (base, over) {
        (ConfigValue::Map(b), ConfigValue::Map(o)) => ConfigValue::Map(merge_maps(b, o, path)),
        (ConfigValue::List(b), ConfigValue::List(o)) => ConfigValue::List(merge_lists(b, o)),
        (_, ConfigValue::Null) => base.clone(),
        (ConfigValue::Null, _) => over.clone(),
        (ConfigValue::Map(_) | ConfigValue::List(_), _) | (_, ConfigValue::Map(_) | ConfigValue::List(_)) => {
            warn!(
                "Type mismatch at path '{}': replacing {} with {}",
                path,
                base.type_name(),
                over.type_name()
            );
            over.clone()
        }
        _ => over.clone(),
    }
}

/// Merge two lists.
///
/// A merge token in `over` takes precedence: `base` is spliced into `over`.
/// Otherwise a token in `base` splices `over` into `base`. Without tokens the
/// override list replaces the base list.
pub fn merge_lists(base: &[ConfigValue], over: &[ConfigValue]) -> Vec<ConfigValue> {
    if over.iter().any(is_merge_token) {
        splice(over, base)
    } else if base.iter().any(is_merge_token) {
        splice(base, over)
    } else {
        over.to_vec()
    }
}

/// Replace the first merge token in `frame` with the elements of `insert`.
///
/// Frame elements keep their positions (the first of any duplicates wins);
/// inserted elements already present in the frame, or inserted earlier, are
/// dropped. Additional tokens in either list are discarded.
fn splice(frame: &[ConfigValue], insert: &[ConfigValue]) -> Vec<ConfigValue> {
    let mut frame_items: Vec<&ConfigValue> = Vec::with_capacity(frame.len());
    let mut splice_at = None;
    for item in frame {
        if is_merge_token(item) {
            splice_at.get_or_insert(frame_items.len());
        } else if !frame_items.contains(&item) {
            frame_items.push(item);
        }
    }
    let splice_at = splice_at.unwrap_or(frame_items.len());

    let mut inserted: Vec<&ConfigValue> = Vec::with_capacity(insert.len());
    for item in insert {
        if !is_merge_token(item) && !frame_items.contains(&item) && !inserted.contains(&item) {
            inserted.push(item);
        }
    }

    frame_items[..splice_at]
        .iter()
        .chain(inserted.iter())
        .chain(frame_items[splice_at..].iter())
        .map(|item| (*item).clone())
        .collect()
}

/// Remove leftover merge tokens from every list in a map.
///
/// A token survives merging when a list carrying one was never merged with
/// another list; it has no meaning for rendering.
pub fn strip_merge_tokens(map: &ConfigMap) -> ConfigMap {
    map.iter()
        .map(|(k, v)| (k.clone(), strip_value(v)))
        .collect()
}

fn strip_value(value: &ConfigValue) -> ConfigValue {
    match value {
        ConfigValue::Map(map) => ConfigValue::Map(strip_merge_tokens(map)),
        ConfigValue::List(items) => ConfigValue::List(
            items
                .iter()
                .filter(|item| !is_merge_token(item))
                .map(strip_value)
                .collect(),
        ),
        other => other.clone(),
    }
}
