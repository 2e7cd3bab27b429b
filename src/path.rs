//! Path expressions for navigating nested configuration maps
//!
//! Variable references such as `${db.hosts[0].name}` name a value by path.
//! This module parses those paths into segments and looks them up in a
//! `ConfigMap`.

use std::iter::Peekable;
use std::str::Chars;

use crate::value::{ConfigMap, ConfigValue};

/// Represents a segment in a path expression for navigating nested structures
///
/// Path expressions like "servers[0].host" or "database.connection.timeout"
/// are parsed into a sequence of PathSegments for navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// A named key for accessing map members
    Key(String),
    /// A numeric index for accessing list elements
    Index(usize),
}

/// Parse a path string into segments
///
/// Supports:
/// - Dot notation: `foo.bar.baz`
/// - Bracket notation: `foo["bar"]` or `foo['bar']`
/// - List indices: `foo[0]` or `items[1].name`
/// - Escaped characters: `foo\.bar` (literal dot)
/// - Mixed: `servers[0].config["special.key"]`
///
/// # Examples
///
/// ```
/// use confgen::path::parse_path;
///
/// let segments = parse_path("servers[0].host");
/// assert_eq!(segments.len(), 3);
/// ```
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut key = String::new();
    let mut chars = path.trim().chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => key.extend(chars.next()),
            '.' => flush_key(&mut key, &mut segments),
            '[' => {
                flush_key(&mut key, &mut segments);
                if let Some(segment) = bracket_segment(&mut chars) {
                    segments.push(segment);
                }
            }
            _ => key.push(ch),
        }
    }
    flush_key(&mut key, &mut segments);
    segments
}

fn flush_key(key: &mut String, segments: &mut Vec<PathSegment>) {
    if !key.is_empty() {
        segments.push(PathSegment::Key(std::mem::take(key)));
    }
}

/// Read the rest of a `[...]` segment; the opening bracket is consumed.
fn bracket_segment(chars: &mut Peekable<Chars<'_>>) -> Option<PathSegment> {
    if let Some(quote @ ('"' | '\'')) = chars.peek().copied() {
        chars.next();
        let mut key = String::new();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => key.extend(chars.next()),
                c if c == quote && chars.peek() == Some(&']') => {
                    chars.next();
                    break;
                }
                c => key.push(c),
            }
        }
        return Some(PathSegment::Key(key));
    }

    let content: String = chars.by_ref().take_while(|c| *c != ']').collect();
    let content = content.trim();
    match content.parse::<usize>() {
        Ok(idx) => Some(PathSegment::Index(idx)),
        Err(_) if content.is_empty() => None,
        Err(_) => Some(PathSegment::Key(content.to_string())),
    }
}

/// Follow `segments` from a value. Returns `None` when any segment is missing
/// or the value at that point has the wrong shape.
pub fn lookup_value<'a>(value: &'a ConfigValue, segments: &[PathSegment]) -> Option<&'a ConfigValue> {
    let mut current = value;
    for segment in segments {
        current = match (segment, current) {
            (PathSegment::Key(key), ConfigValue::Map(map)) => map.get(key)?,
            (PathSegment::Index(idx), ConfigValue::List(items)) => items.get(*idx)?,
            // `a.0` addresses list elements as well as `a[0]`
            (PathSegment::Key(key), ConfigValue::List(items)) => {
                items.get(key.parse::<usize>().ok()?)?
            }
            (PathSegment::Index(idx), ConfigValue::Map(map)) => map.get(&idx.to_string())?,
            _ => return None,
        };
    }
    Some(current)
}

/// Look up a dotted path in a map. Never fails; a missing segment yields `None`.
pub fn lookup<'a>(map: &'a ConfigMap, path: &str) -> Option<&'a ConfigValue> {
    let segments = parse_path(path);
    let (first, rest) = segments.split_first()?;
    let root = match first {
        PathSegment::Key(key) => map.get(key)?,
        PathSegment::Index(idx) => map.get(&idx.to_string())?,
    };
    lookup_value(root, rest)
}

/// All dotted key paths in a map, depth-first. Used for "did you mean" hints.
pub fn key_paths(map: &ConfigMap) -> Vec<String> {
    fn collect(prefix: &str, map: &ConfigMap, out: &mut Vec<String>) {
        for (key, value) in map {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            if let ConfigValue::Map(nested) = value {
                collect(&path, nested, out);
            }
            out.push(path);
        }
    }

    let mut out = Vec::new();
    collect("", map, &mut out);
    out
}
