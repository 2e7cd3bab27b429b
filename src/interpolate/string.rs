//! Resolution of the placeholders inside a single string

use log::trace;

use super::map::FOREACH_KEY;
use super::{find_placeholders, Interpolator, PlaceholderKind};
use crate::error::{Error, Result};
use crate::expression::ExpressionEvaluator;
use crate::path::key_paths;
use crate::suggestions::did_you_mean;
use crate::value::{ConfigMap, ConfigValue};

/// Resolves `${...}` placeholders in strings against one variable map.
///
/// A string that consists of exactly one placeholder (surrounding whitespace
/// allowed) resolves to the referenced value with its native type. Any other
/// string resolves to a string with every placeholder replaced by its text.
pub struct StringResolver<'e, 'a> {
    engine: &'e Interpolator<'a>,
    variables: &'e ConfigMap,
    simple: bool,
    defer_pending: bool,
}

impl<'e, 'a> StringResolver<'e, 'a> {
    pub fn new(engine: &'e Interpolator<'a>, variables: &'e ConfigMap) -> Self {
        Self {
            engine,
            variables,
            simple: false,
            defer_pending: false,
        }
    }

    /// A resolver for one whole-map pass.
    ///
    /// An embedded expression whose operands still hold placeholders is kept
    /// as written so that a later pass can evaluate it once they settle.
    pub fn for_map_pass(engine: &'e Interpolator<'a>, variables: &'e ConfigMap) -> Self {
        Self {
            defer_pending: true,
            ..Self::new(engine, variables)
        }
    }

    /// Resolve every placeholder in `input`.
    ///
    /// Fails with [`Error::CyclicReference`] naming `input` when resolution
    /// needs more than the configured number of nested steps.
    pub fn resolve(&self, input: &str) -> Result<ConfigValue> {
        self.resolve_at(input, input, 0)
    }

    /// Best-effort resolution of plain variable references only.
    ///
    /// Embedded expressions are left as written and anything that fails to
    /// resolve keeps its original value. Lists and maps are processed
    /// element by element.
    pub fn resolve_simple(engine: &'e Interpolator<'a>, variables: &'e ConfigMap, value: &ConfigValue) -> ConfigValue {
        let resolver = Self {
            engine,
            variables,
            simple: true,
            defer_pending: false,
        };
        resolver.simple_value(value)
    }

    fn simple_value(&self, value: &ConfigValue) -> ConfigValue {
        match value {
            ConfigValue::String(s) => match self.resolve_at(s, s, 0) {
                Ok(resolved) => resolved,
                Err(e) => {
                    trace!("Leaving '{}' unresolved: {}", s, e);
                    value.clone()
                }
            },
            ConfigValue::List(items) => {
                ConfigValue::List(items.iter().map(|item| self.simple_value(item)).collect())
            }
            ConfigValue::Map(map) => ConfigValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.simple_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn resolve_at(&self, input: &str, origin: &str, depth: usize) -> Result<ConfigValue> {
        if depth > self.engine.options().max_iterations {
            return Err(Error::CyclicReference {
                expression: origin.to_string(),
            });
        }

        let placeholders = find_placeholders(input);
        let Some(first) = placeholders.first() else {
            return Ok(ConfigValue::String(input.to_string()));
        };

        if placeholders.len() == 1 && input.trim() == &input[first.start..first.end] {
            return Ok(self
                .placeholder(&first.body, input, origin, depth)?
                .unwrap_or_else(|| ConfigValue::String(input.to_string())));
        }

        let mut out = String::with_capacity(input.len());
        let mut last = 0;
        for placeholder in &placeholders {
            out.push_str(&input[last..placeholder.start]);
            match self.placeholder(&placeholder.body, input, origin, depth)? {
                Some(value) => out.push_str(&value.to_text()),
                None => out.push_str(&input[placeholder.start..placeholder.end]),
            }
            last = placeholder.end;
        }
        out.push_str(&input[last..]);

        Ok(ConfigValue::String(out))
    }

    /// Value of one placeholder body. `None` means "keep the placeholder as
    /// written", which happens in simple mode and for deferred expressions.
    fn placeholder(
        &self,
        body: &str,
        input: &str,
        origin: &str,
        depth: usize,
    ) -> Result<Option<ConfigValue>> {
        match self.engine.syntax().classify(body) {
            PlaceholderKind::Variable {
                provider,
                name,
                default,
            } => {
                let found = self
                    .engine
                    .resolver()
                    .resolve(provider.as_deref(), &name, self.variables)?;
                match found {
                    Some(value) => self.nested(&value, origin, depth + 1).map(Some),
                    None => match default {
                        Some(default) => Ok(Some(ConfigValue::String(default))),
                        None => Err(self.unresolved(provider.as_deref(), &name, input)),
                    },
                }
            }
            PlaceholderKind::Expression(_) if self.simple => Ok(None),
            PlaceholderKind::Expression(expression) if self.defer_pending => {
                ExpressionEvaluator::new(self.engine).evaluate_settled(&expression, self.variables)
            }
            PlaceholderKind::Expression(expression) => self
                .engine
                .evaluate(&expression, self.variables)
                .map(Some),
        }
    }

    /// Resolve a looked-up value: strings recursively, lists and maps element
    /// by element. Maps that still carry an iteration marker are left for the
    /// map resolver to expand.
    fn nested(&self, value: &ConfigValue, origin: &str, depth: usize) -> Result<ConfigValue> {
        match value {
            ConfigValue::String(s) => self.resolve_at(s, origin, depth),
            ConfigValue::List(items) => items
                .iter()
                .map(|item| self.nested(item, origin, depth))
                .collect::<Result<Vec<_>>>()
                .map(ConfigValue::List),
            ConfigValue::Map(map) if map.contains_key(FOREACH_KEY) => Ok(value.clone()),
            ConfigValue::Map(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), self.nested(v, origin, depth)?)))
                .collect::<Result<ConfigMap>>()
                .map(ConfigValue::Map),
            other => Ok(other.clone()),
        }
    }

    fn unresolved(&self, provider: Option<&str>, name: &str, input: &str) -> Error {
        let (variable, hint) = match provider {
            Some(provider) => (format!("{}::{}", provider, name), None),
            None => {
                let paths = key_paths(self.variables);
                let hint = did_you_mean(name, paths.iter().map(String::as_str));
                (name.to_string(), hint)
            }
        };
        Error::UnresolvedVariable {
            variable,
            expression: input.to_string(),
            hint,
        }
    }
}
