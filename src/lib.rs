//! # confgen
//!
//! This library computes the final configuration maps used to render
//! environment-specific configuration files from role and environment
//! definitions. It is designed to be used by the `confgen` command-line tool
//! but can be embedded by any program that renders templates from layered
//! configuration.
//!
//! ## Quick Example
//!
//! ```
//! use confgen::interpolate::{Interpolator, ResolverOptions};
//! use confgen::merge::merge;
//! use confgen::value::{map_from_yaml, ConfigValue};
//! use confgen::variables::ProviderRegistry;
//!
//! let defaults = map_from_yaml("host: localhost\nport: 8080").unwrap();
//! let overrides = map_from_yaml("host: web1\nurl: http://${host}:${port}/").unwrap();
//! let config = merge(Some(&defaults), Some(&overrides));
//!
//! let providers = ProviderRegistry::new();
//! let engine = Interpolator::new(&providers, ResolverOptions::default()).unwrap();
//! let resolved = engine.resolve_map(&config).unwrap();
//! assert_eq!(resolved["url"], ConfigValue::from("http://web1:8080/"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Values (`value`, `path`)**: the closed [`ConfigValue`](value::ConfigValue)
//!   type and dotted-path lookups such as `a.b[0].c`.
//! - **Merging (`merge`)**: deep merge with `<<merge>>` splice points in lists,
//!   and the inverse split by predicate.
//! - **Variables (`variables`)**: single-name lookup, locally or through
//!   pluggable value providers (`env`, `file`, custom).
//! - **Interpolation (`interpolate`, `expression`)**: `${...}` placeholders
//!   with defaults, escaping, embedded expressions, `_foreach` expansion and
//!   cycle detection.
//! - **Inheritance (`inheritance`)**: scoped configuration flowing down the
//!   environment tree, and role inheritance chains.
//! - **Definitions (`model`, `definitions`)**: YAML role and environment files.
//! - **Planning (`generate`)**: everything above, combined into one resolved
//!   unit per node, role and variant.

pub mod definitions;
pub mod error;
pub mod expression;
pub mod generate;
pub mod inheritance;
pub mod interpolate;
pub mod merge;
pub mod model;
pub mod output;
pub mod path;
pub mod suggestions;
pub mod value;
pub mod variables;

#[cfg(test)]
mod merge_proptest;
