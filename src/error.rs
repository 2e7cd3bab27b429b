//! # Error Handling
//!
//! This module defines the centralized error type for the `confgen` library.
//! It uses `thiserror` to build a single `Error` enum covering every failure
//! the resolution core and its glue can raise.
//!
//! ## Error Kinds
//!
//! - **Cyclic reference**: the resolution iteration cap was exceeded while
//!   resolving a string or a whole configuration map.
//! - **Unresolved variable**: a placeholder names a variable with no value,
//!   no default and no provider match.
//! - **Bad expression**: an embedded expression failed to parse or evaluate.
//! - **Role validation**: unknown roles, variant mismatches between an
//!   inheriting role and its super-role, unknown variants and cyclic
//!   inheritance.
//! - **Definition and I/O errors**: parsing role/environment definitions and
//!   reading files.
//!
//! None of these are recoverable for the affected generation unit. Every
//! variant carries the offending expression or role name plus, where
//! available, the context string (environment/node/role) it occurred in.

use thiserror::Error;

fn render_hint(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!("\n  hint: {}", h))
        .unwrap_or_default()
}

/// Main error type for confgen operations
#[derive(Error, Debug)]
pub enum Error {
    /// The resolution iteration limit was exceeded.
    ///
    /// Raised by string resolution, whole-map resolution and expression
    /// pre-resolution. `expression` is the original string that could not be
    /// brought to a fixpoint.
    #[error("Cyclic reference detected while resolving '{expression}'")]
    CyclicReference { expression: String },

    /// A placeholder references a variable that has no value.
    #[error("Unresolved variable '{variable}' in '{expression}'{}", render_hint(hint))]
    UnresolvedVariable {
        variable: String,
        /// The placeholder text or surrounding string
        expression: String,
        /// Optional "did you mean" hint
        hint: Option<String>,
    },

    /// An embedded expression could not be parsed or evaluated.
    #[error("Bad expression '{expression}': {message}")]
    BadExpression { expression: String, message: String },

    /// A role referenced by name does not exist.
    #[error("Role '{role}' not found (referenced from {context}){}", render_hint(hint))]
    RoleNotFound {
        role: String,
        context: String,
        /// Optional "did you mean" hint
        hint: Option<String>,
    },

    /// An inheriting role does not declare every variant of its super-role.
    #[error("Role '{role}' inherits from '{super_role}' but does not declare its variant(s) {missing} (in {context})")]
    VariantMismatch {
        role: String,
        super_role: String,
        missing: String,
        context: String,
    },

    /// A node selected a variant the role does not declare.
    #[error("Role '{role}' has no variant '{variant}' (in {context})")]
    UnknownVariant {
        role: String,
        variant: String,
        context: String,
    },

    /// The role inheritance depth limit was exceeded.
    #[error("Cyclic inheritance detected for role '{role}' (in {context})")]
    CyclicInheritance { role: String, context: String },

    /// A definition uses a key reserved for injected context variables.
    #[error("Key '{key}' is reserved and cannot be set in configuration (in {context})")]
    ReservedKey { key: String, context: String },

    /// The configuration is structurally invalid.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A value provider failed.
    #[error("Value provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    /// A placeholder names a provider that is not registered.
    #[error("Unknown value provider '{provider}'")]
    UnknownProvider { provider: String },

    /// A role or environment definition could not be parsed.
    #[error("Definition parsing error: {message}{}", render_hint(hint))]
    DefinitionParse {
        message: String,
        /// Optional hint for how to fix the definition
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Resolution of one generation unit failed.
    ///
    /// Wraps the underlying error with the environment, node, role and
    /// variant the unit belongs to.
    #[error("{source}\n  while generating {context}")]
    Generation {
        context: String,
        #[source]
        source: Box<Error>,
    },

    /// An error indicating that a mutex has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

impl Error {
    /// The innermost error, looking through [`Error::Generation`] wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Generation { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_cyclic_reference() {
        let error = Error::CyclicReference {
            expression: "${var1}".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Cyclic reference"));
        assert!(display.contains("${var1}"));
    }

    #[test]
    fn test_error_display_unresolved_variable() {
        let error = Error::UnresolvedVariable {
            variable: "db.host".to_string(),
            expression: "jdbc://${db.host}".to_string(),
            hint: None,
        };
        let display = format!("{}", error);
        assert!(display.contains("Unresolved variable 'db.host'"));
        assert!(display.contains("jdbc://${db.host}"));
        assert!(!display.contains("hint:"));
    }

    #[test]
    fn test_error_display_unresolved_variable_with_hint() {
        let error = Error::UnresolvedVariable {
            variable: "prot".to_string(),
            expression: "${prot}".to_string(),
            hint: Some("Did you mean 'port'?".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("hint:"));
        assert!(display.contains("Did you mean 'port'?"));
    }

    #[test]
    fn test_error_display_role_not_found() {
        let error = Error::RoleNotFound {
            role: "webserver".to_string(),
            context: "environment prod, node web1".to_string(),
            hint: None,
        };
        let display = format!("{}", error);
        assert!(display.contains("Role 'webserver' not found"));
        assert!(display.contains("environment prod, node web1"));
    }

    #[test]
    fn test_error_display_variant_mismatch() {
        let error = Error::VariantMismatch {
            role: "child".to_string(),
            super_role: "base".to_string(),
            missing: "'v2'".to_string(),
            context: "test".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("'child'"));
        assert!(display.contains("'base'"));
        assert!(display.contains("'v2'"));
    }

    #[test]
    fn test_error_display_bad_expression() {
        let error = Error::BadExpression {
            expression: "1 +".to_string(),
            message: "unexpected end of expression".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Bad expression '1 +'"));
        assert!(display.contains("unexpected end"));
    }

    #[test]
    fn test_error_display_definition_parse_with_hint() {
        let error = Error::DefinitionParse {
            message: "Missing role name".to_string(),
            hint: Some("Add 'name:' to the role file".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Definition parsing error"));
        assert!(display.contains("hint:"));
        assert!(display.contains("Add 'name:'"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_str = "invalid: [unclosed";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: Error = yaml_error.into();
        let display = format!("{}", error);
        assert!(display.contains("YAML parsing error"));
    }

    #[test]
    fn test_error_generation_wraps_source() {
        let error = Error::Generation {
            context: "environment 'prod', node 'web1', role 'web'".to_string(),
            source: Box::new(Error::CyclicReference {
                expression: "${a}".to_string(),
            }),
        };
        let display = format!("{}", error);
        assert!(display.contains("Cyclic reference"));
        assert!(display.contains("while generating environment 'prod'"));
        assert!(matches!(error.root(), Error::CyclicReference { .. }));
    }

    #[test]
    fn test_error_reserved_key() {
        let error = Error::ReservedKey {
            key: "_env".to_string(),
            context: "role web".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("'_env' is reserved"));
        assert!(display.contains("role web"));
    }
}
