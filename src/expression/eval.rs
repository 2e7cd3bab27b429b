//! Tree-walking evaluation of parsed expressions
//!
//! Evaluation is lenient about missing data: unknown variables and missing
//! members evaluate to null. Type errors (e.g. multiplying a map) and
//! arithmetic failures are reported as messages; the caller wraps them into
//! [`Error::BadExpression`](crate::error::Error::BadExpression).

use std::cmp::Ordering;

use super::parser::{BinaryOp, Expr, UnaryOp};
use crate::path::{lookup_value, PathSegment};
use crate::value::{ConfigMap, ConfigValue};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(n) => n,
        }
    }

    fn into_value(self) -> ConfigValue {
        match self {
            Num::Int(n) => ConfigValue::from(n),
            Num::Float(n) => ConfigValue::from(n),
        }
    }
}

fn to_num(value: &ConfigValue) -> Option<Num> {
    match value {
        ConfigValue::Number(n) => n
            .as_i64()
            .map(Num::Int)
            .or_else(|| n.as_f64().map(Num::Float)),
        ConfigValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Num::Int)
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(Num::Float))
        }
        ConfigValue::Bool(b) => Some(Num::Int(i64::from(*b))),
        ConfigValue::Null => Some(Num::Int(0)),
        _ => None,
    }
}

/// Truthiness used by `!`, `&&`, `||`, `?:` and the ternary.
pub fn truthy(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::Null => false,
        ConfigValue::Bool(b) => *b,
        ConfigValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        ConfigValue::String(s) => !s.is_empty(),
        ConfigValue::List(items) => !items.is_empty(),
        ConfigValue::Map(map) => !map.is_empty(),
    }
}

/// Evaluate `expr` against `variables`.
pub fn evaluate(expr: &Expr, variables: &ConfigMap) -> Result<ConfigValue, String> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Var(name) => Ok(variables.get(name).cloned().unwrap_or_default()),
        Expr::Property(target, name) => {
            let target = evaluate(target, variables)?;
            Ok(lookup_value(&target, &[PathSegment::Key(name.clone())])
                .cloned()
                .unwrap_or_default())
        }
        Expr::Index(target, index) => {
            let target = evaluate(target, variables)?;
            let index = evaluate(index, variables)?;
            let segment = match &index {
                ConfigValue::Number(n) => match n.as_u64() {
                    Some(idx) => PathSegment::Index(idx as usize),
                    None => return Err(format!("invalid index {}", n)),
                },
                ConfigValue::String(key) => PathSegment::Key(key.clone()),
                other => return Err(format!("cannot index with a {}", other.type_name())),
            };
            Ok(lookup_value(&target, &[segment]).cloned().unwrap_or_default())
        }
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, variables))
            .collect::<Result<Vec<_>, _>>()
            .map(ConfigValue::List),
        Expr::Map(entries) => {
            let mut map = ConfigMap::new();
            for (key, value) in entries {
                let key = evaluate(key, variables)?.to_text();
                map.insert(key, evaluate(value, variables)?);
            }
            Ok(ConfigValue::Map(map))
        }
        Expr::Unary(UnaryOp::Not, operand) => {
            Ok(ConfigValue::Bool(!truthy(&evaluate(operand, variables)?)))
        }
        Expr::Unary(UnaryOp::Neg, operand) => {
            let value = evaluate(operand, variables)?;
            match to_num(&value) {
                Some(Num::Int(n)) => n
                    .checked_neg()
                    .map(ConfigValue::from)
                    .ok_or_else(|| "integer overflow".to_string()),
                Some(Num::Float(n)) => Ok(ConfigValue::from(-n)),
                None => Err(format!("cannot negate a {}", value.type_name())),
            }
        }
        Expr::Binary(BinaryOp::And, left, right) => {
            let result = truthy(&evaluate(left, variables)?) && truthy(&evaluate(right, variables)?);
            Ok(ConfigValue::Bool(result))
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            let result = truthy(&evaluate(left, variables)?) || truthy(&evaluate(right, variables)?);
            Ok(ConfigValue::Bool(result))
        }
        Expr::Binary(op, left, right) => {
            let left = evaluate(left, variables)?;
            let right = evaluate(right, variables)?;
            binary(*op, &left, &right)
        }
        Expr::Ternary(condition, then, otherwise) => {
            if truthy(&evaluate(condition, variables)?) {
                evaluate(then, variables)
            } else {
                evaluate(otherwise, variables)
            }
        }
        Expr::Elvis(value, fallback) => {
            let value = evaluate(value, variables)?;
            if truthy(&value) {
                Ok(value)
            } else {
                evaluate(fallback, variables)
            }
        }
        Expr::Call(name, args) => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, variables))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, &args)
        }
    }
}

fn call(name: &str, args: &[ConfigValue]) -> Result<ConfigValue, String> {
    let single = || match args {
        [arg] => Ok(arg),
        _ => Err(format!("{}() takes exactly one argument, {} given", name, args.len())),
    };
    match name {
        "size" => {
            let size = match single()? {
                ConfigValue::Null => 0,
                ConfigValue::String(s) => s.chars().count(),
                ConfigValue::List(items) => items.len(),
                ConfigValue::Map(map) => map.len(),
                other => return Err(format!("size() is not defined for a {}", other.type_name())),
            };
            Ok(ConfigValue::from(size))
        }
        "empty" => {
            let empty = match single()? {
                ConfigValue::Null => true,
                ConfigValue::String(s) => s.is_empty(),
                ConfigValue::List(items) => items.is_empty(),
                ConfigValue::Map(map) => map.is_empty(),
                _ => false,
            };
            Ok(ConfigValue::Bool(empty))
        }
        other => Err(format!("unknown function '{}'", other)),
    }
}

fn binary(op: BinaryOp, left: &ConfigValue, right: &ConfigValue) -> Result<ConfigValue, String> {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => arithmetic(op, left, right),
        BinaryOp::Eq => Ok(ConfigValue::Bool(equals(left, right))),
        BinaryOp::Ne => Ok(ConfigValue::Bool(!equals(left, right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(left, right)?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(ConfigValue::Bool(result))
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("logical operators short-circuit in evaluate"),
    }
}

fn add(left: &ConfigValue, right: &ConfigValue) -> Result<ConfigValue, String> {
    match (left, right) {
        (ConfigValue::String(_), _) | (_, ConfigValue::String(_)) => {
            Ok(ConfigValue::String(format!("{}{}", left.to_text(), right.to_text())))
        }
        (ConfigValue::List(a), ConfigValue::List(b)) => {
            Ok(ConfigValue::List(a.iter().chain(b.iter()).cloned().collect()))
        }
        _ => arithmetic(BinaryOp::Add, left, right),
    }
}

fn arithmetic(op: BinaryOp, left: &ConfigValue, right: &ConfigValue) -> Result<ConfigValue, String> {
    let (a, b) = match (to_num(left), to_num(right)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(format!(
                "arithmetic is not defined for {} and {}",
                left.type_name(),
                right.type_name()
            ))
        }
    };

    match (a, b) {
        (Num::Int(x), Num::Int(y)) => {
            let result = match op {
                BinaryOp::Add => x.checked_add(y),
                BinaryOp::Sub => x.checked_sub(y),
                BinaryOp::Mul => x.checked_mul(y),
                BinaryOp::Div if y == 0 => return Err("division by zero".to_string()),
                BinaryOp::Div => x.checked_div(y),
                BinaryOp::Mod if y == 0 => return Err("division by zero".to_string()),
                BinaryOp::Mod => x.checked_rem(y),
                _ => None,
            };
            result
                .map(ConfigValue::from)
                .ok_or_else(|| "integer overflow".to_string())
        }
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            let result = match op {
                BinaryOp::Add => x + y,
                BinaryOp::Sub => x - y,
                BinaryOp::Mul => x * y,
                BinaryOp::Div if y == 0.0 => return Err("division by zero".to_string()),
                BinaryOp::Div => x / y,
                BinaryOp::Mod if y == 0.0 => return Err("division by zero".to_string()),
                BinaryOp::Mod => x % y,
                _ => return Err("unsupported arithmetic operator".to_string()),
            };
            Ok(Num::Float(result).into_value())
        }
    }
}

fn equals(left: &ConfigValue, right: &ConfigValue) -> bool {
    let numeric = matches!(left, ConfigValue::Number(_)) || matches!(right, ConfigValue::Number(_));
    if numeric {
        if let (Some(a), Some(b)) = (to_num(left), to_num(right)) {
            return a.as_f64() == b.as_f64();
        }
    }
    left == right
}

fn compare(left: &ConfigValue, right: &ConfigValue) -> Result<Ordering, String> {
    if let (ConfigValue::String(a), ConfigValue::String(b)) = (left, right) {
        if to_num(left).is_none() || to_num(right).is_none() {
            return Ok(a.cmp(b));
        }
    }
    match (to_num(left), to_num(right)) {
        (Some(a), Some(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .ok_or_else(|| "cannot compare NaN".to_string()),
        _ => Err(format!(
            "cannot compare {} with {}",
            left.type_name(),
            right.type_name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::lexer::tokenize;
    use crate::expression::parser::parse;
    use crate::value::map_from_yaml;

    fn eval(input: &str, vars: &str) -> Result<ConfigValue, String> {
        let expr = parse(&tokenize(input)?)?;
        evaluate(&expr, &map_from_yaml(vars).unwrap())
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3", "").unwrap(), ConfigValue::from(7));
        assert_eq!(eval("(1 + 2) * 3", "").unwrap(), ConfigValue::from(9));
        assert_eq!(eval("7 / 2", "").unwrap(), ConfigValue::from(3));
        assert_eq!(eval("7 % 4", "").unwrap(), ConfigValue::from(3));
        assert_eq!(eval("1.5 * 2", "").unwrap(), ConfigValue::from(3.0));
        assert_eq!(eval("-port", "port: 80").unwrap(), ConfigValue::from(-80));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(
            eval("'http://' + host + ':' + port", "host: web\nport: 8080").unwrap(),
            ConfigValue::from("http://web:8080")
        );
    }

    #[test]
    fn test_numeric_strings_coerce() {
        assert_eq!(eval("port * 2", "port: '80'").unwrap(), ConfigValue::from(160));
        assert_eq!(eval("port == 80", "port: '80'").unwrap(), ConfigValue::Bool(true));
    }

    #[test]
    fn test_member_access() {
        let vars = "db:\n  hosts: [a, b]\n  port: 5432\n";
        assert_eq!(eval("db.port", vars).unwrap(), ConfigValue::from(5432));
        assert_eq!(eval("db.hosts[1]", vars).unwrap(), ConfigValue::from("b"));
        assert_eq!(eval("db['port']", vars).unwrap(), ConfigValue::from(5432));
        assert_eq!(eval("db.missing", vars).unwrap(), ConfigValue::Null);
        assert_eq!(eval("nothing.here", vars).unwrap(), ConfigValue::Null);
    }

    #[test]
    fn test_logic_and_ternary() {
        assert_eq!(eval("debug ? 'on' : 'off'", "debug: true").unwrap(), ConfigValue::from("on"));
        assert_eq!(eval("name ?: 'default'", "name: ''").unwrap(), ConfigValue::from("default"));
        assert_eq!(eval("a > 1 && b < 1", "a: 2\nb: 0").unwrap(), ConfigValue::Bool(true));
        assert_eq!(eval("not a or b", "a: true\nb: false").unwrap(), ConfigValue::Bool(false));
        assert_eq!(eval("'abc' < 'abd'", "").unwrap(), ConfigValue::Bool(true));
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("size(l)", "l: [1, 2, 3]").unwrap(), ConfigValue::from(3));
        assert_eq!(eval("empty(m)", "m: {}").unwrap(), ConfigValue::Bool(true));
        assert!(eval("size(1, 2)", "").is_err());
        assert!(eval("shout('x')", "").is_err());
    }

    #[test]
    fn test_errors() {
        assert!(eval("1 / 0", "").is_err());
        assert!(eval("m * 2", "m: {a: 1}").is_err());
        assert!(eval("9223372036854775807 + 1", "").is_err());
    }
}
