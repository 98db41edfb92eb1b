//! Restricted arithmetic expressions for computed fields.
//!
//! Supported syntax: decimal numbers, identifiers naming numeric record
//! fields, the constants `pi` and `e` (shadowed by a field of the same name),
//! `+ - * / % ^`, unary minus, parentheses and the functions `abs`, `sqrt`,
//! `min`, `max`, `round`, `floor`, `ceil`, `pow`, `ln`, `log` and `exp`.
//! `^` is right-associative and binds tighter than unary minus.
//!
//! Expressions are limited to [`MAX_TOKENS`] tokens and [`MAX_DEPTH`] levels
//! of nesting so parsing and evaluation stay well inside a worker's stack.

use geoworker_core::models::Record;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Deepest nesting of parentheses, calls and unary signs
pub const MAX_DEPTH: usize = 256;

/// Longest accepted expression, in tokens
pub const MAX_TOKENS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    #[error("Unexpected {found} at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("Function '{name}' takes {expected} argument(s), got {found}")]
    Arity { name: String, expected: usize, found: usize },

    #[error("Unknown field '{name}'")]
    UnknownField { name: String },

    #[error("Field '{name}' is not numeric")]
    NonNumericField { name: String },

    #[error("Expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("Expression is longer than {limit} tokens")]
    TooLong { limit: usize },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Expression result is not a finite number")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Sqrt,
    Min,
    Max,
    Round,
    Floor,
    Ceil,
    Pow,
    Ln,
    Log,
    Exp,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        let function = match name {
            "abs" => Function::Abs,
            "sqrt" => Function::Sqrt,
            "min" => Function::Min,
            "max" => Function::Max,
            "round" => Function::Round,
            "floor" => Function::Floor,
            "ceil" => Function::Ceil,
            "pow" => Function::Pow,
            "ln" => Function::Ln,
            "log" => Function::Log,
            "exp" => Function::Exp,
            _ => return None,
        };
        Some(function)
    }

    /// Exact argument count, `None` for variadic (at least one)
    fn arity(&self) -> Option<usize> {
        match self {
            Function::Min | Function::Max => None,
            Function::Pow => Some(2),
            _ => Some(1),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Sqrt => "sqrt",
            Function::Min => "min",
            Function::Max => "max",
            Function::Round => "round",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Pow => "pow",
            Function::Ln => "ln",
            Function::Log => "log",
            Function::Exp => "exp",
        }
    }

    fn apply(&self, args: &[f64]) -> f64 {
        match self {
            Function::Abs => args[0].abs(),
            Function::Sqrt => args[0].sqrt(),
            Function::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Function::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Function::Round => args[0].round(),
            Function::Floor => args[0].floor(),
            Function::Ceil => args[0].ceil(),
            Function::Pow => args[0].powf(args[1]),
            Function::Ln => args[0].ln(),
            Function::Log => args[0].log10(),
            Function::Exp => args[0].exp(),
        }
    }
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Field(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

impl Expr {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(source)?;
        if tokens.len() > MAX_TOKENS {
            return Err(ExprError::TooLong { limit: MAX_TOKENS });
        }
        let mut parser = Parser { tokens, pos: 0, depth: 0 };
        let expr = parser.expression()?;
        match parser.peek() {
            None => Ok(expr),
            Some((token, position)) => {
                Err(ExprError::UnexpectedToken { found: token.to_string(), position })
            }
        }
    }

    /// Evaluate against a record's numeric fields
    pub fn eval(&self, record: &Record) -> Result<f64, ExprError> {
        let value = self.eval_inner(record)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ExprError::NonFinite)
        }
    }

    fn eval_inner(&self, record: &Record) -> Result<f64, ExprError> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Field(name) => resolve(name, record),
            Expr::Neg(inner) => Ok(-inner.eval_inner(record)?),
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval_inner(record)?;
                let b = rhs.eval_inner(record)?;
                match op {
                    BinaryOp::Add => Ok(a + b),
                    BinaryOp::Sub => Ok(a - b),
                    BinaryOp::Mul => Ok(a * b),
                    BinaryOp::Div | BinaryOp::Rem if b == 0.0 => Err(ExprError::DivisionByZero),
                    BinaryOp::Div => Ok(a / b),
                    BinaryOp::Rem => Ok(a % b),
                    BinaryOp::Pow => Ok(a.powf(b)),
                }
            }
            Expr::Call(function, args) => {
                let values =
                    args.iter().map(|arg| arg.eval_inner(record)).collect::<Result<Vec<_>, _>>()?;
                Ok(function.apply(&values))
            }
        }
    }
}

impl FromStr for Expr {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expr::parse(s)
    }
}

/// Parse and evaluate in one step
pub fn evaluate(source: &str, record: &Record) -> Result<f64, ExprError> {
    Expr::parse(source)?.eval(record)
}

fn resolve(name: &str, record: &Record) -> Result<f64, ExprError> {
    match record.get(name) {
        Some(value) => {
            value.as_f64().ok_or_else(|| ExprError::NonNumericField { name: name.to_string() })
        }
        None => match name {
            "pi" => Ok(std::f64::consts::PI),
            "e" => Ok(std::f64::consts::E),
            _ => Err(ExprError::UnknownField { name: name.to_string() }),
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::Op(op) => write!(f, "operator '{}'", op),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, ExprError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' | '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse()
                    .map_err(|_| ExprError::UnexpectedChar { ch: c, position: start })?;
                tokens.push((Token::Number(value), start));
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push((Token::Ident(chars[start..i].iter().collect()), start));
                continue;
            }
            '+' | '-' | '*' | '/' | '%' | '^' => tokens.push((Token::Op(c), start)),
            '(' => tokens.push((Token::LParen, start)),
            ')' => tokens.push((Token::RParen, start)),
            ',' => tokens.push((Token::Comma, start)),
            other => return Err(ExprError::UnexpectedChar { ch: other, position: start }),
        }
        i += 1;
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<(&Token, usize)> {
        self.tokens.get(self.pos).map(|(token, position)| (token, *position))
    }

    fn next(&mut self) -> Result<(Token, usize), ExprError> {
        let token = self.tokens.get(self.pos).cloned().ok_or(ExprError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some((Token::Op(op), _)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExprError> {
        let (token, position) = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err(ExprError::UnexpectedToken { found: token.to_string(), position })
        }
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.term()?;
            let op = if op == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.eat_op(&['*', '/', '%']) {
            let rhs = self.unary()?;
            let op = match op {
                '*' => BinaryOp::Mul,
                '/' => BinaryOp::Div,
                _ => BinaryOp::Rem,
            };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // unary := ('-' | '+') unary | power
    // Every nested sub-expression passes through here, so this is where depth is counted
    fn unary(&mut self) -> Result<Expr, ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep { limit: MAX_DEPTH });
        }
        let expr = match self.eat_op(&['-', '+']) {
            Some('-') => self.unary().map(|inner| Expr::Neg(Box::new(inner))),
            Some(_) => self.unary(),
            None => self.power(),
        };
        self.depth -= 1;
        expr
    }

    // power := primary ('^' unary)?
    fn power(&mut self) -> Result<Expr, ExprError> {
        let base = self.primary()?;
        if self.eat_op(&['^']).is_some() {
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let (token, position) = self.next()?;
        match token {
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => {
                if matches!(self.peek(), Some((Token::LParen, _))) {
                    self.pos += 1;
                    self.call(name)
                } else {
                    Ok(Expr::Field(name))
                }
            }
            other => Err(ExprError::UnexpectedToken { found: other.to_string(), position }),
        }
    }

    fn call(&mut self, name: String) -> Result<Expr, ExprError> {
        let function =
            Function::lookup(&name).ok_or_else(|| ExprError::UnknownFunction { name: name.clone() })?;

        let mut args = Vec::new();
        if matches!(self.peek(), Some((Token::RParen, _))) {
            self.pos += 1;
        } else {
            loop {
                args.push(self.expression()?);
                let (token, position) = self.next()?;
                match token {
                    Token::Comma => continue,
                    Token::RParen => break,
                    other => {
                        return Err(ExprError::UnexpectedToken {
                            found: other.to_string(),
                            position,
                        })
                    }
                }
            }
        }

        let valid = match function.arity() {
            Some(expected) => args.len() == expected,
            None => !args.is_empty(),
        };
        if !valid {
            return Err(ExprError::Arity {
                name: function.name().to_string(),
                expected: function.arity().unwrap_or(1),
                found: args.len(),
            });
        }

        Ok(Expr::Call(function, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn eval(source: &str) -> Result<f64, ExprError> {
        evaluate(source, &record(json!({"price": 20, "qty": 3, "label": "x", "e": 10})))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(eval("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(eval("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(eval("-2 ^ 2").unwrap(), -4.0);
        assert_eq!(eval("10 % 4 - 1").unwrap(), 1.0);
        assert_eq!(eval("8 / 4 / 2").unwrap(), 1.0);
    }

    #[test]
    fn test_fields_and_constants() {
        assert_eq!(eval("price * qty").unwrap(), 60.0);
        // A record field shadows the constant of the same name
        assert_eq!(eval("e").unwrap(), 10.0);
        assert!((eval("pi").unwrap() - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("max(price, qty, 50)").unwrap(), 50.0);
        assert_eq!(eval("min(price, qty)").unwrap(), 3.0);
        assert_eq!(eval("sqrt(16) + abs(-2)").unwrap(), 6.0);
        assert_eq!(eval("pow(2, 10)").unwrap(), 1024.0);
        assert_eq!(eval("round(2.5) + floor(1.9) + ceil(1.1)").unwrap(), 6.0);
        assert!((eval("log(1000)").unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval("price / 0"), Err(ExprError::DivisionByZero));
        assert_eq!(eval("missing + 1"), Err(ExprError::UnknownField { name: "missing".into() }));
        assert_eq!(eval("label * 2"), Err(ExprError::NonNumericField { name: "label".into() }));
        assert_eq!(eval("system(1)"), Err(ExprError::UnknownFunction { name: "system".into() }));
        assert_eq!(eval("sqrt(-1)"), Err(ExprError::NonFinite));
        assert!(matches!(eval("pow(2)"), Err(ExprError::Arity { expected: 2, found: 1, .. })));
        assert_eq!(eval("1 +"), Err(ExprError::UnexpectedEnd));
        assert!(matches!(eval("1 2"), Err(ExprError::UnexpectedToken { position: 2, .. })));
        assert!(matches!(eval("price; drop"), Err(ExprError::UnexpectedChar { ch: ';', .. })));
        assert!(matches!(eval("1..2"), Err(ExprError::UnexpectedChar { .. })));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |levels: usize| format!("{}1{}", "(".repeat(levels), ")".repeat(levels));
        assert_eq!(eval(&nested(100)).unwrap(), 1.0);
        assert_eq!(eval(&nested(300)), Err(ExprError::TooDeep { limit: MAX_DEPTH }));
        assert_eq!(eval(&format!("{}1", "-".repeat(400))), Err(ExprError::TooDeep { limit: MAX_DEPTH }));
    }

    #[test]
    fn test_huge_expressions_rejected_without_recursing() {
        let deep = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(Expr::parse(&deep), Err(ExprError::TooLong { limit: MAX_TOKENS }));

        let long_chain = vec!["1"; 5_000].join(" + ");
        assert_eq!(Expr::parse(&long_chain), Err(ExprError::TooLong { limit: MAX_TOKENS }));

        let within = vec!["1"; 500].join(" + ");
        assert_eq!(eval(&within).unwrap(), 500.0);
    }

    #[test]
    fn test_parse_once_eval_many() {
        let expr: Expr = "price * 1.1".parse().unwrap();
        assert!((expr.eval(&record(json!({"price": 10}))).unwrap() - 11.0).abs() < 1e-9);
        assert!((expr.eval(&record(json!({"price": 20}))).unwrap() - 22.0).abs() < 1e-9);
    }
}
