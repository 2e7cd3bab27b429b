//! # Embedded Expressions
//!
//! Placeholders that are not plain variable references, such as
//! `${port + 1}` or `${debug ? 'dev' : 'prod'}`, are evaluated as small
//! expressions. The language covers literals, list and map literals, member
//! access, arithmetic, comparison, logical operators, the ternary and elvis
//! operators, and the `size()`/`empty()` functions.
//!
//! Before evaluation, the variables an expression reads are passed through
//! best-effort simple resolution so that `${a}`-style references inside them
//! are already substituted. Expressions nested inside those values are not
//! evaluated at this stage; during whole-map resolution an expression that
//! reads such a value waits for a later pass.

pub mod eval;
pub mod lexer;
pub mod parser;

use std::collections::BTreeSet;

use log::trace;

use crate::error::{Error, Result};
use crate::interpolate::{value_has_placeholders, Interpolator, StringResolver};
use crate::value::{ConfigMap, ConfigValue};
use parser::Expr;

/// Parse an expression into its syntax tree.
pub fn parse(expression: &str) -> Result<Expr> {
    let tokens = lexer::tokenize(expression).map_err(|message| bad_expression(expression, message))?;
    parser::parse(&tokens).map_err(|message| bad_expression(expression, message))
}

fn bad_expression(expression: &str, message: String) -> Error {
    Error::BadExpression {
        expression: expression.to_string(),
        message,
    }
}

/// Root variable names an expression reads.
pub fn referenced_variables(expr: &Expr) -> BTreeSet<String> {
    fn walk(expr: &Expr, out: &mut BTreeSet<String>) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Var(name) => {
                out.insert(name.clone());
            }
            Expr::Property(target, _) => walk(target, out),
            Expr::Index(target, index) => {
                walk(target, out);
                walk(index, out);
            }
            Expr::List(items) | Expr::Call(_, items) => items.iter().for_each(|i| walk(i, out)),
            Expr::Map(entries) => entries.iter().for_each(|(k, v)| {
                walk(k, out);
                walk(v, out);
            }),
            Expr::Unary(_, operand) => walk(operand, out),
            Expr::Binary(_, left, right) | Expr::Elvis(left, right) => {
                walk(left, out);
                walk(right, out);
            }
            Expr::Ternary(condition, then, otherwise) => {
                walk(condition, out);
                walk(then, out);
                walk(otherwise, out);
            }
        }
    }

    let mut out = BTreeSet::new();
    walk(expr, &mut out);
    out
}

/// Evaluates embedded expressions for an [`Interpolator`].
pub struct ExpressionEvaluator<'e, 'a> {
    engine: &'e Interpolator<'a>,
}

impl<'e, 'a> ExpressionEvaluator<'e, 'a> {
    pub fn new(engine: &'e Interpolator<'a>) -> Self {
        Self { engine }
    }

    /// Evaluate `expression` against `variables`.
    pub fn evaluate(&self, expression: &str, variables: &ConfigMap) -> Result<ConfigValue> {
        let expr = parse(expression)?;
        let scope = self.scope(&expr, variables);
        self.run(expression, &expr, &scope)
    }

    /// Evaluate `expression` only once everything it reads has settled.
    ///
    /// Returns `Ok(None)` while a referenced variable still holds a
    /// placeholder after simple resolution, typically another expression
    /// that a later whole-map pass will evaluate first.
    pub fn evaluate_settled(&self, expression: &str, variables: &ConfigMap) -> Result<Option<ConfigValue>> {
        let expr = parse(expression)?;
        let scope = self.scope(&expr, variables);
        if let Some(name) = scope
            .iter()
            .find_map(|(name, value)| value_has_placeholders(value).then_some(name))
        {
            trace!("Deferring '{}' until '{}' is resolved", expression, name);
            return Ok(None);
        }
        self.run(expression, &expr, &scope).map(Some)
    }

    fn scope(&self, expr: &Expr, variables: &ConfigMap) -> ConfigMap {
        referenced_variables(expr)
            .into_iter()
            .filter_map(|name| {
                let value = variables.get(&name)?;
                let resolved = StringResolver::resolve_simple(self.engine, variables, value);
                Some((name, resolved))
            })
            .collect()
    }

    fn run(&self, expression: &str, expr: &Expr, scope: &ConfigMap) -> Result<ConfigValue> {
        let value =
            eval::evaluate(expr, scope).map_err(|message| bad_expression(expression, message))?;
        trace!("Evaluated '{}' to {:?}", expression, value);
        Ok(value)
    }
}
