//! Placeholder interpolation
//!
//! Strings in a configuration may contain `${...}` placeholders:
//!
//! - `${name}` / `${a.b[0].c}`: variable reference into the configuration
//! - `${name:default}`: with a literal fallback used when the variable is absent
//! - `${provider::expression}` / `${provider::expression:default}`: delegated
//!   to a registered value provider
//! - anything else, e.g. `${port + 1}`: an embedded expression
//!
//! `\${...}` is an escaped placeholder. It survives resolution untouched and
//! only loses its backslash in the explicit [`deescape`] pass.
//!
//! [`Interpolator`] bundles what every resolver needs (variable lookup, the
//! compiled placeholder grammar and the iteration limits). The per-string
//! engine lives in [`string`], the whole-map engine in [`map`].

pub mod map;
pub mod string;

use regex::Regex;

use crate::error::Result;
use crate::value::{ConfigMap, ConfigValue};
use crate::variables::{ProviderRegistry, VariableResolver};

pub use map::{MapResolver, FOREACH_KEY, INDEX_KEY, ITEM_KEY};
pub use string::StringResolver;

/// Maximum number of nested resolution steps per string and of whole-map passes.
pub const MAX_ITERATIONS: usize = 20;

/// Tuning for a resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Cap on nested resolution levels and whole-map passes
    pub max_iterations: usize,
    /// Whether map resolution finishes with a de-escape pass
    pub deescape: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            deescape: true,
        }
    }
}

/// A `${...}` occurrence found in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Byte offset of `$`
    pub start: usize,
    /// Byte offset just past the closing `}`
    pub end: usize,
    /// Text between the braces
    pub body: String,
}

/// What a placeholder body means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderKind {
    Variable {
        provider: Option<String>,
        name: String,
        default: Option<String>,
    },
    Expression(String),
}

/// Find the end of a placeholder body starting at byte `from` (just past `${`).
/// Returns the byte offset of the matching `}`.
///
/// A quote only opens a string literal where an expression operand can
/// start, so `${name:O'Brien}` is not a quoted body. If a quote never
/// closes, the body ends at the first `}` outside nested braces.
fn matching_brace(input: &str, from: usize) -> Option<usize> {
    matching_brace_quoted(input, from).or_else(|| matching_brace_plain(input, from))
}

fn matching_brace_quoted(input: &str, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev: Option<char> = None;
    for (offset, ch) in input[from..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
                prev = Some(ch);
            }
            continue;
        }
        match ch {
            '\'' | '"' if opens_literal(prev) => quote = Some(ch),
            '{' => depth += 1,
            '}' if depth == 0 => return Some(from + offset),
            '}' => depth -= 1,
            _ => {}
        }
        if !ch.is_whitespace() {
            prev = Some(ch);
        }
    }
    None
}

fn matching_brace_plain(input: &str, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, ch) in input[from..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(from + offset),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Whether a quote following `prev` (the last non-blank character) starts a
/// string literal rather than sitting inside a word.
fn opens_literal(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => !(c.is_alphanumeric() || matches!(c, '_' | '.' | ')' | ']' | '\'' | '"')),
    }
}

/// Scan `input` for unescaped placeholders, left to right.
///
/// Escaped placeholders are skipped as a whole; an unterminated `${` is
/// plain text.
pub fn find_placeholders(input: &str) -> Vec<Placeholder> {
    let bytes = input.as_bytes();
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(rel) = input[pos..].find("${") {
        let start = pos + rel;
        let Some(close) = matching_brace(input, start + 2) else {
            pos = start + 2;
            continue;
        };
        let escaped = start > 0 && bytes[start - 1] == b'\\';
        if !escaped {
            found.push(Placeholder {
                start,
                end: close + 1,
                body: input[start + 2..close].to_string(),
            });
        }
        pos = close + 1;
    }

    found
}

/// Whether `input` still contains an unescaped placeholder.
pub fn has_placeholders(input: &str) -> bool {
    !find_placeholders(input).is_empty()
}

/// Whether any string inside `value` still contains an unescaped placeholder.
pub fn value_has_placeholders(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::String(s) => has_placeholders(s),
        ConfigValue::List(items) => items.iter().any(value_has_placeholders),
        ConfigValue::Map(map) => map.values().any(value_has_placeholders),
        _ => false,
    }
}

/// Rewrite escaped placeholders `\${` to `${`. Strings without escapes are
/// returned unchanged.
pub fn deescape(input: &str) -> String {
    input.replace("\\${", "${")
}

/// Apply [`deescape`] to every string in a value.
pub fn deescape_value(value: &ConfigValue) -> ConfigValue {
    match value {
        ConfigValue::String(s) => ConfigValue::String(deescape(s)),
        ConfigValue::List(items) => ConfigValue::List(items.iter().map(deescape_value).collect()),
        ConfigValue::Map(map) => ConfigValue::Map(deescape_map(map)),
        other => other.clone(),
    }
}

/// Apply [`deescape`] to every string in a map.
pub fn deescape_map(map: &ConfigMap) -> ConfigMap {
    map.iter()
        .map(|(k, v)| (k.clone(), deescape_value(v)))
        .collect()
}

/// The compiled placeholder grammar.
#[derive(Debug, Clone)]
pub struct PlaceholderSyntax {
    provider: Regex,
    variable: Regex,
}

impl PlaceholderSyntax {
    pub fn new() -> Result<Self> {
        Ok(Self {
            provider: Regex::new(
                r"(?s)^\s*([A-Za-z_][A-Za-z0-9_-]*)::([^:{}]*)(?::(.*))?$",
            )?,
            variable: Regex::new(
                r"(?s)^\s*([A-Za-z_][A-Za-z0-9_-]*(?:\.[A-Za-z0-9_-]+|\[\d+\])*)\s*(?::(.*))?$",
            )?,
        })
    }

    /// Classify a placeholder body as a variable reference or an expression.
    pub fn classify(&self, body: &str) -> PlaceholderKind {
        if let Some(caps) = self.provider.captures(body) {
            let expression = caps[2].trim();
            if !expression.is_empty() {
                return PlaceholderKind::Variable {
                    provider: Some(caps[1].to_string()),
                    name: expression.to_string(),
                    default: caps.get(3).map(|m| m.as_str().to_string()),
                };
            }
        }

        if let Some(caps) = self.variable.captures(body) {
            let name = &caps[1];
            if !matches!(name, "true" | "false" | "null") {
                return PlaceholderKind::Variable {
                    provider: None,
                    name: name.to_string(),
                    default: caps.get(2).map(|m| m.as_str().to_string()),
                };
            }
        }

        PlaceholderKind::Expression(body.trim().to_string())
    }
}

/// Shared context for string, map and expression resolution.
#[derive(Debug, Clone)]
pub struct Interpolator<'a> {
    resolver: VariableResolver<'a>,
    syntax: PlaceholderSyntax,
    options: ResolverOptions,
}

impl<'a> Interpolator<'a> {
    pub fn new(providers: &'a ProviderRegistry, options: ResolverOptions) -> Result<Self> {
        Ok(Self {
            resolver: VariableResolver::new(providers),
            syntax: PlaceholderSyntax::new()?,
            options,
        })
    }

    pub fn resolver(&self) -> &VariableResolver<'a> {
        &self.resolver
    }

    pub fn syntax(&self) -> &PlaceholderSyntax {
        &self.syntax
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Resolve every placeholder in one string against `variables`.
    pub fn resolve_str(&self, input: &str, variables: &ConfigMap) -> Result<ConfigValue> {
        StringResolver::new(self, variables).resolve(input)
    }

    /// Resolve a whole configuration map against itself, de-escaping
    /// according to the options.
    pub fn resolve_map(&self, config: &ConfigMap) -> Result<ConfigMap> {
        MapResolver::new(self).resolve(config, self.options.deescape)
    }

    /// Evaluate an embedded expression.
    pub fn evaluate(&self, expression: &str, variables: &ConfigMap) -> Result<ConfigValue> {
        crate::expression::ExpressionEvaluator::new(self).evaluate(expression, variables)
    }
}
