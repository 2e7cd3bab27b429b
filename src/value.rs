//! # Configuration Values
//!
//! `ConfigValue` is the closed sum type every resolver operates on. It mirrors
//! the YAML data model (string, number, boolean, null, list, map) so role and
//! environment definitions convert into it losslessly, and it is converted
//! back into `serde_yaml::Value` for output.
//!
//! `ConfigMap` is an ordered map (`BTreeMap`). Key order carries no meaning
//! but iteration and output are deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
pub use serde_yaml::Number;
use serde_yaml::Value as YamlValue;

/// A configuration map from string keys to values.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "YamlValue", into = "YamlValue")]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<ConfigValue>),
    Map(ConfigMap),
}

impl ConfigValue {
    /// Human-readable type name, used in log and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Null => "Null",
            ConfigValue::Bool(_) => "Bool",
            ConfigValue::Number(_) => "Number",
            ConfigValue::String(_) => "String",
            ConfigValue::List(_) => "List",
            ConfigValue::Map(_) => "Map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Render the value as placeholder substitution text.
    ///
    /// Lists are comma-joined element-wise, maps render as `k=v` pairs joined
    /// by commas in key order, and null renders as the empty string.
    pub fn to_text(&self) -> String {
        match self {
            ConfigValue::Null => String::new(),
            ConfigValue::Bool(b) => b.to_string(),
            ConfigValue::Number(n) => n.to_string(),
            ConfigValue::String(s) => s.clone(),
            ConfigValue::List(items) => items
                .iter()
                .map(ConfigValue::to_text)
                .collect::<Vec<_>>()
                .join(","),
            ConfigValue::Map(map) => map
                .iter()
                .map(|(k, v)| format!("{}={}", k, v.to_text()))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        ConfigValue::Number(n.into())
    }
}

impl From<i32> for ConfigValue {
    fn from(n: i32) -> Self {
        ConfigValue::Number(i64::from(n).into())
    }
}

impl From<usize> for ConfigValue {
    fn from(n: usize) -> Self {
        ConfigValue::Number((n as u64).into())
    }
}

impl From<f64> for ConfigValue {
    fn from(n: f64) -> Self {
        ConfigValue::Number(n.into())
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::List(items)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(map: ConfigMap) -> Self {
        ConfigValue::Map(map)
    }
}

/// Stringify a YAML mapping key. Non-string scalar keys use their YAML text.
fn yaml_key_to_string(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl From<YamlValue> for ConfigValue {
    fn from(value: YamlValue) -> Self {
        match value {
            YamlValue::Null => ConfigValue::Null,
            YamlValue::Bool(b) => ConfigValue::Bool(b),
            YamlValue::Number(n) => ConfigValue::Number(n),
            YamlValue::String(s) => ConfigValue::String(s),
            YamlValue::Sequence(seq) => {
                ConfigValue::List(seq.into_iter().map(ConfigValue::from).collect())
            }
            YamlValue::Mapping(mapping) => ConfigValue::Map(
                mapping
                    .into_iter()
                    .map(|(k, v)| (yaml_key_to_string(k), ConfigValue::from(v)))
                    .collect(),
            ),
            YamlValue::Tagged(tagged) => ConfigValue::from(tagged.value),
        }
    }
}

impl From<ConfigValue> for YamlValue {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Null => YamlValue::Null,
            ConfigValue::Bool(b) => YamlValue::Bool(b),
            ConfigValue::Number(n) => YamlValue::Number(n),
            ConfigValue::String(s) => YamlValue::String(s),
            ConfigValue::List(items) => {
                YamlValue::Sequence(items.into_iter().map(YamlValue::from).collect())
            }
            ConfigValue::Map(map) => YamlValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (YamlValue::String(k), YamlValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Parse a YAML document into a `ConfigMap`.
///
/// An empty document yields an empty map; any other non-mapping document is
/// rejected.
pub fn map_from_yaml(yaml: &str) -> crate::error::Result<ConfigMap> {
    let value: ConfigValue = serde_yaml::from_str(yaml)?;
    match value {
        ConfigValue::Map(map) => Ok(map),
        ConfigValue::Null => Ok(ConfigMap::new()),
        other => Err(crate::error::Error::InvalidConfig {
            message: format!("expected a mapping at document root, found {}", other.type_name()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml_nested() {
        let map = map_from_yaml("a:\n  b: [1, two, true]\n  c: ~\n").unwrap();
        let a = map.get("a").and_then(ConfigValue::as_map).unwrap();
        assert_eq!(
            a.get("b"),
            Some(&ConfigValue::List(vec![
                ConfigValue::from(1),
                ConfigValue::from("two"),
                ConfigValue::from(true),
            ]))
        );
        assert_eq!(a.get("c"), Some(&ConfigValue::Null));
    }

    #[test]
    fn test_from_yaml_numeric_keys_become_strings() {
        let map = map_from_yaml("8080: http\ntrue: yes\n").unwrap();
        assert!(map.contains_key("8080"));
        assert!(map.contains_key("true"));
    }

    #[test]
    fn test_from_yaml_rejects_non_mapping_root() {
        assert!(map_from_yaml("- a\n- b\n").is_err());
        assert!(map_from_yaml("").unwrap().is_empty());
    }

    #[test]
    fn test_to_text() {
        assert_eq!(ConfigValue::Null.to_text(), "");
        assert_eq!(ConfigValue::from(42).to_text(), "42");
        assert_eq!(ConfigValue::from(1.5).to_text(), "1.5");
        let list = ConfigValue::List(vec![
            ConfigValue::from("a"),
            ConfigValue::List(vec![ConfigValue::from("b"), ConfigValue::from("c")]),
        ]);
        assert_eq!(list.to_text(), "a,b,c");

        let mut map = ConfigMap::new();
        map.insert("z".to_string(), ConfigValue::from(1));
        map.insert("a".to_string(), ConfigValue::from("x"));
        assert_eq!(ConfigValue::Map(map).to_text(), "a=x,z=1");
    }

    #[test]
    fn test_yaml_round_trip() {
        let map = map_from_yaml("name: web\nports: [80, 443]\nnested:\n  enabled: false\n").unwrap();
        let yaml = serde_yaml::to_string(&ConfigValue::Map(map.clone())).unwrap();
        assert_eq!(map_from_yaml(&yaml).unwrap(), map);
    }
}
