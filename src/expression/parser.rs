//! Precedence-climbing parser for embedded expressions
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr     := or ( '?' expr ':' expr | '?:' expr )?
//! or       := and ( ('||' | 'or') and )*
//! and      := equality ( ('&&' | 'and') equality )*
//! equality := relation ( ('==' | '!=' | 'eq' | 'ne') relation )*
//! relation := additive ( ('<' | '<=' | '>' | '>=' | 'lt' | 'le' | 'gt' | 'ge') additive )*
//! additive := term ( ('+' | '-') term )*
//! term     := unary ( ('*' | '/' | '%' | 'div' | 'mod') unary )*
//! unary    := ('!' | 'not' | '-') unary | postfix
//! postfix  := primary ( '.' name | '[' expr ']' )*
//! primary  := literal | name | name '(' args ')' | '(' expr ')' | '[' list ']' | '{' map '}'
//! ```

use super::lexer::Token;
use crate::value::ConfigValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(ConfigValue),
    Var(String),
    Property(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    List(Vec<Expr>),
    Map(Vec<(Expr, Expr)>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Elvis(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

/// Parse a token stream into a single expression.
pub fn parse(tokens: &[Token]) -> Result<Expr, String> {
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(format!("unexpected '{}'", token.describe())),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(name)) if name == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), String> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(format!(
                "expected '{}' but found '{}'",
                expected.describe(),
                token.describe()
            )),
            None => Err(format!(
                "expected '{}' but reached end of expression",
                expected.describe()
            )),
        }
    }

    fn expr(&mut self) -> Result<Expr, String> {
        let condition = self.or()?;
        if self.eat(&Token::Question) {
            let then = self.expr()?;
            self.expect(&Token::Colon)?;
            let otherwise = self.expr()?;
            return Ok(Expr::Ternary(
                Box::new(condition),
                Box::new(then),
                Box::new(otherwise),
            ));
        }
        if self.eat(&Token::Elvis) {
            let fallback = self.expr()?;
            return Ok(Expr::Elvis(Box::new(condition), Box::new(fallback)));
        }
        Ok(condition)
    }

    fn or(&mut self) -> Result<Expr, String> {
        let mut left = self.and()?;
        while self.eat(&Token::OrOr) || self.eat_word("or") {
            let right = self.and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, String> {
        let mut left = self.equality()?;
        while self.eat(&Token::AndAnd) || self.eat_word("and") {
            let right = self.equality()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, String> {
        let mut left = self.relation()?;
        loop {
            let op = if self.eat(&Token::EqEq) || self.eat_word("eq") {
                BinaryOp::Eq
            } else if self.eat(&Token::NotEq) || self.eat_word("ne") {
                BinaryOp::Ne
            } else {
                break;
            };
            let right = self.relation()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn relation(&mut self) -> Result<Expr, String> {
        let mut left = self.additive()?;
        loop {
            let op = if self.eat(&Token::Lt) || self.eat_word("lt") {
                BinaryOp::Lt
            } else if self.eat(&Token::Le) || self.eat_word("le") {
                BinaryOp::Le
            } else if self.eat(&Token::Gt) || self.eat_word("gt") {
                BinaryOp::Gt
            } else if self.eat(&Token::Ge) || self.eat_word("ge") {
                BinaryOp::Ge
            } else {
                break;
            };
            let right = self.additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, String> {
        let mut left = self.term()?;
        loop {
            let op = if self.eat(&Token::Plus) {
                BinaryOp::Add
            } else if self.eat(&Token::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut left = self.unary()?;
        loop {
            let op = if self.eat(&Token::Star) {
                BinaryOp::Mul
            } else if self.eat(&Token::Slash) || self.eat_word("div") {
                BinaryOp::Div
            } else if self.eat(&Token::Percent) || self.eat_word("mod") {
                BinaryOp::Mod
            } else {
                break;
            };
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if self.eat(&Token::Bang) || self.eat_word("not") {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }
        if self.eat(&Token::Minus) {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, String> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) {
                let name = match self.next() {
                    Some(Token::Ident(name)) => name.clone(),
                    Some(Token::Int(idx)) => idx.to_string(),
                    Some(token) => {
                        return Err(format!("expected property name after '.', found '{}'", token.describe()))
                    }
                    None => return Err("expected property name after '.'".to_string()),
                };
                expr = Expr::Property(Box::new(expr), name);
            } else if self.eat(&Token::LBracket) {
                let index = self.expr()?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, String> {
        let token = self
            .next()
            .cloned()
            .ok_or_else(|| "unexpected end of expression".to_string())?;
        match token {
            Token::Int(n) => Ok(Expr::Literal(ConfigValue::from(n))),
            Token::Float(n) => Ok(Expr::Literal(ConfigValue::from(n))),
            Token::Str(s) => Ok(Expr::Literal(ConfigValue::String(s))),
            Token::Ident(name) => {
                let literal = match name.as_str() {
                    "true" => Some(ConfigValue::Bool(true)),
                    "false" => Some(ConfigValue::Bool(false)),
                    "null" => Some(ConfigValue::Null),
                    _ => None,
                };
                if let Some(value) = literal {
                    Ok(Expr::Literal(value))
                } else if self.eat(&Token::LParen) {
                    let args = self.sequence(&Token::RParen)?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => Ok(Expr::List(self.sequence(&Token::RBracket)?)),
            Token::LBrace => {
                let mut entries = Vec::new();
                if self.eat(&Token::RBrace) {
                    return Ok(Expr::Map(entries));
                }
                loop {
                    let key = self.expr()?;
                    self.expect(&Token::Colon)?;
                    let value = self.expr()?;
                    entries.push((key, value));
                    if self.eat(&Token::RBrace) {
                        return Ok(Expr::Map(entries));
                    }
                    self.expect(&Token::Comma)?;
                }
            }
            other => Err(format!("unexpected '{}'", other.describe())),
        }
    }

    /// Comma-separated expressions up to `close`.
    fn sequence(&mut self, close: &Token) -> Result<Vec<Expr>, String> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.expr()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(&Token::Comma)?;
        }
    }
}
