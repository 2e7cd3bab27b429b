//! Whole-map resolution
//!
//! Every string in the map is resolved against the map itself. Passes repeat
//! until the map stops changing, which lets values that resolve to other
//! placeholders (or to lists and maps containing them) settle.
//!
//! A map holding the `_foreach` key is a template that expands into one map
//! per element of the referenced list:
//!
//! ```yaml
//! servers: [a, b]
//! upstreams:
//!   - _foreach: ${servers}
//!     host: ${_item}.internal
//!     weight: ${_index + 1}
//! ```
//!
//! Inside a list the expansion is spliced in place; as the value of a key it
//! replaces the template map with the expanded list.

use log::{debug, trace};

use super::{deescape_map, has_placeholders, value_has_placeholders, Interpolator, StringResolver};
use crate::error::{Error, Result};
use crate::value::{ConfigMap, ConfigValue};

/// Marks a map as an iteration template.
pub const FOREACH_KEY: &str = "_foreach";
/// Current element while expanding an iteration template.
pub const ITEM_KEY: &str = "_item";
/// Zero-based position of the current element.
pub const INDEX_KEY: &str = "_index";

/// Resolves all placeholders in a nested configuration map.
pub struct MapResolver<'e, 'a> {
    engine: &'e Interpolator<'a>,
}

impl<'e, 'a> MapResolver<'e, 'a> {
    pub fn new(engine: &'e Interpolator<'a>) -> Self {
        Self { engine }
    }

    /// Resolve `config` against itself until nothing changes.
    ///
    /// With `deescape`, escaped placeholders are turned into plain `${...}`
    /// text once resolution has finished.
    pub fn resolve(&self, config: &ConfigMap, deescape: bool) -> Result<ConfigMap> {
        if config.contains_key(FOREACH_KEY) {
            return Err(Error::InvalidConfig {
                message: format!("'{}' cannot be used at the root of a configuration", FOREACH_KEY),
            });
        }

        let max_passes = self.engine.options().max_iterations;
        let mut current = config.clone();

        for pass in 1..=max_passes {
            let next = self.resolve_map(&current, &current)?;
            if next == current {
                if let Some(expression) = first_unresolved(&next) {
                    return Err(Error::CyclicReference { expression });
                }
                debug!("Configuration resolved after {} pass(es)", pass);
                return Ok(if deescape { deescape_map(&next) } else { next });
            }
            trace!("Resolution pass {} changed the configuration", pass);
            current = next;
        }

        Err(Error::CyclicReference {
            expression: first_unresolved(&current).unwrap_or_else(|| "<configuration>".to_string()),
        })
    }

    fn resolve_map(&self, map: &ConfigMap, variables: &ConfigMap) -> Result<ConfigMap> {
        map.iter()
            .map(|(key, value)| Ok((key.clone(), self.resolve_value(value, variables)?)))
            .collect()
    }

    fn resolve_value(&self, value: &ConfigValue, variables: &ConfigMap) -> Result<ConfigValue> {
        match value {
            ConfigValue::String(s) => StringResolver::for_map_pass(self.engine, variables).resolve(s),
            ConfigValue::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        ConfigValue::Map(template) if template.contains_key(FOREACH_KEY) => {
                            match self.expand(template, variables)? {
                                Some(expanded) => out.extend(expanded),
                                None => out.push(item.clone()),
                            }
                        }
                        other => out.push(self.resolve_value(other, variables)?),
                    }
                }
                Ok(ConfigValue::List(out))
            }
            ConfigValue::Map(template) if template.contains_key(FOREACH_KEY) => {
                Ok(match self.expand(template, variables)? {
                    Some(expanded) => ConfigValue::List(expanded),
                    None => value.clone(),
                })
            }
            ConfigValue::Map(map) => Ok(ConfigValue::Map(self.resolve_map(map, variables)?)),
            other => Ok(other.clone()),
        }
    }

    /// Expand an iteration template into one resolved map per element.
    ///
    /// Returns `None` when the source or an expanded element still waits on
    /// a deferred expression; the template is then kept for the next pass.
    fn expand(&self, template: &ConfigMap, variables: &ConfigMap) -> Result<Option<Vec<ConfigValue>>> {
        let source = template.get(FOREACH_KEY).cloned().unwrap_or_default();
        let source = self.resolve_value(&source, variables)?;
        if value_has_placeholders(&source) {
            trace!("Deferring '{}' expansion until its source is resolved", FOREACH_KEY);
            return Ok(None);
        }
        let items = match source {
            ConfigValue::List(items) => items,
            ConfigValue::Null => Vec::new(),
            ConfigValue::Map(map) => map.into_values().collect(),
            other => {
                return Err(Error::InvalidConfig {
                    message: format!(
                        "'{}' must reference a list, got {} '{}'",
                        FOREACH_KEY,
                        other.type_name(),
                        other
                    ),
                })
            }
        };

        let body: ConfigMap = template
            .iter()
            .filter(|(key, _)| key.as_str() != FOREACH_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let max_passes = self.engine.options().max_iterations;
        let mut expanded = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let mut scope = variables.clone();
            scope.insert(ITEM_KEY.to_string(), item);
            scope.insert(INDEX_KEY.to_string(), ConfigValue::from(index));

            let mut current = ConfigValue::Map(body.clone());
            let mut settled = false;
            for _ in 0..max_passes {
                let next = self.resolve_value(&current, &scope)?;
                if next == current {
                    settled = true;
                    break;
                }
                current = next;
            }
            if !settled {
                return Err(Error::CyclicReference {
                    expression: first_unresolved_value(&current)
                        .unwrap_or_else(|| FOREACH_KEY.to_string()),
                });
            }
            if value_has_placeholders(&current) {
                trace!("Deferring '{}' expansion at index {}", FOREACH_KEY, index);
                return Ok(None);
            }
            expanded.push(current);
        }

        Ok(Some(expanded))
    }
}

/// First string in the map that still contains a placeholder.
fn first_unresolved(map: &ConfigMap) -> Option<String> {
    map.values().find_map(first_unresolved_value)
}

fn first_unresolved_value(value: &ConfigValue) -> Option<String> {
    match value {
        ConfigValue::String(s) if has_placeholders(s) => Some(s.clone()),
        ConfigValue::List(items) => items.iter().find_map(first_unresolved_value),
        ConfigValue::Map(map) => first_unresolved(map),
        _ => None,
    }
}
