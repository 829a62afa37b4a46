//! Rule expression evaluation
//!
//! A small tokenizer and recursive-descent parser producing a tagged AST,
//! plus a pure evaluator over the AST and a metric snapshot. Grammar:
//!
//! ```text
//! expr       := term (("AND" | "OR") term)*
//! term       := ["NOT"] comparison
//! comparison := path op literal
//! op         := ">" | "<" | ">=" | "<=" | "==" | "!="
//! path       := identifier ("." identifier)*
//! ```
//!
//! Combination is strictly left-to-right in written order; there is no
//! AND-over-OR precedence. Keywords are case-insensitive.

use crate::aggregator::MetricSnapshot;
use std::fmt;
use thiserror::Error;

const EPSILON: f64 = 1e-6;

/// Expression syntax errors, surfaced at config-validation time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// Expression ended where a token was required
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// Token found where a different one was required
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    /// Left-hand side of a comparison is not a valid metric path
    #[error("invalid metric path '{0}'")]
    InvalidPath(String),
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl CmpOp {
    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Lt => lhs < rhs,
            Self::Ge => lhs >= rhs,
            Self::Le => lhs <= rhs,
            Self::Eq => (lhs - rhs).abs() < EPSILON,
            Self::Ne => (lhs - rhs).abs() >= EPSILON,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gt => write!(f, ">"),
            Self::Lt => write!(f, "<"),
            Self::Ge => write!(f, ">="),
            Self::Le => write!(f, "<="),
            Self::Eq => write!(f, "=="),
            Self::Ne => write!(f, "!="),
        }
    }
}

/// Right-hand side of a comparison
///
/// A literal that does not parse as a number is kept raw; comparing
/// against it evaluates false rather than erroring.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Raw(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Raw(s) => write!(f, "{}", s),
        }
    }
}

/// A single `path op literal` comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub path: String,
    pub op: CmpOp,
    pub literal: Literal,
}

impl Comparison {
    /// Evaluate against a snapshot.
    ///
    /// An absent path defaults to 0 so rules referencing optional providers
    /// degrade gracefully; a non-numeric literal is always false.
    pub fn evaluate(&self, snapshot: &MetricSnapshot) -> bool {
        let rhs = match self.literal {
            Literal::Number(n) => n,
            Literal::Raw(_) => return false,
        };
        let lhs = snapshot.resolve(&self.path).unwrap_or(0.0);
        self.op.apply(lhs, rhs)
    }

    /// Resolved left-hand value for rendering
    pub fn resolved(&self, snapshot: &MetricSnapshot) -> f64 {
        snapshot.resolve(&self.path).unwrap_or(0.0)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.path, self.op, self.literal)
    }
}

/// Parsed rule expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Empty expression, always false
    Empty,
    Comparison(Comparison),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parse an expression string into an AST
    pub fn parse(input: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(input);
        if tokens.is_empty() {
            return Ok(Self::Empty);
        }

        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_expr()?;
        if let Some(extra) = parser.peek() {
            return Err(ExprError::UnexpectedToken(extra.text()));
        }
        Ok(expr)
    }

    /// Evaluate against a snapshot with left-to-right short-circuiting
    pub fn evaluate(&self, snapshot: &MetricSnapshot) -> bool {
        match self {
            Self::Empty => false,
            Self::Comparison(c) => c.evaluate(snapshot),
            Self::Not(inner) => !inner.evaluate(snapshot),
            Self::And(lhs, rhs) => lhs.evaluate(snapshot) && rhs.evaluate(snapshot),
            Self::Or(lhs, rhs) => lhs.evaluate(snapshot) || rhs.evaluate(snapshot),
        }
    }

    /// Comparisons in written order
    pub fn comparisons(&self) -> Vec<&Comparison> {
        let mut out = Vec::new();
        self.collect_comparisons(&mut out);
        out
    }

    fn collect_comparisons<'a>(&'a self, out: &mut Vec<&'a Comparison>) {
        match self {
            Self::Empty => {}
            Self::Comparison(c) => out.push(c),
            Self::Not(inner) => inner.collect_comparisons(out),
            Self::And(lhs, rhs) | Self::Or(lhs, rhs) => {
                lhs.collect_comparisons(out);
                rhs.collect_comparisons(out);
            }
        }
    }

    /// Distinct metric paths referenced by the expression, in written order
    pub fn paths(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for c in self.comparisons() {
            if !out.iter().any(|p| p == &c.path) {
                out.push(c.path.clone());
            }
        }
        out
    }

    /// Render which individual comparisons are currently true.
    ///
    /// Used for `{triggered_conditions}` substitution in notification text.
    pub fn explain(&self, snapshot: &MetricSnapshot) -> String {
        let satisfied: Vec<String> = self
            .comparisons()
            .iter()
            .filter(|c| c.evaluate(snapshot))
            .map(|c| format!("{} (current: {})", c, c.resolved(snapshot)))
            .collect();

        if satisfied.is_empty() {
            "no conditions met".to_string()
        } else {
            satisfied.join(", ")
        }
    }
}

/// Evaluate an expression string against a snapshot.
///
/// Never panics: empty or unparseable input evaluates false.
pub fn evaluate(expression: &str, snapshot: &MetricSnapshot) -> bool {
    match Expr::parse(expression) {
        Ok(expr) => expr.evaluate(snapshot),
        Err(e) => {
            log::debug!("expression '{}' did not parse: {}", expression, e);
            false
        }
    }
}

/// Render the currently-true comparisons of an expression string
pub fn explain(expression: &str, snapshot: &MetricSnapshot) -> String {
    match Expr::parse(expression) {
        Ok(expr) => expr.explain(snapshot),
        Err(e) => format!("unparseable expression: {}", e),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Identifier, path, keyword, or unquoted literal
    Word(String),
    /// Quoted string literal
    Quoted(String),
    Op(CmpOp),
}

impl Token {
    fn text(&self) -> String {
        match self {
            Self::Word(w) => w.clone(),
            Self::Quoted(q) => format!("\"{}\"", q),
            Self::Op(op) => op.to_string(),
        }
    }
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '>' | '<' | '=' | '!' => {
                chars.next();
                let eq = chars.peek() == Some(&'=');
                if eq {
                    chars.next();
                }
                let op = match (c, eq) {
                    ('>', false) => CmpOp::Gt,
                    ('>', true) => CmpOp::Ge,
                    ('<', false) => CmpOp::Lt,
                    ('<', true) => CmpOp::Le,
                    ('=', true) => CmpOp::Eq,
                    ('!', true) => CmpOp::Ne,
                    // Lone '=' or '!' keeps the raw character as a word so
                    // the parser reports it instead of dropping it.
                    _ => {
                        tokens.push(Token::Word(c.to_string()));
                        continue;
                    }
                };
                tokens.push(Token::Op(op));
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut value = String::new();
                for ch in chars.by_ref() {
                    if ch == quote {
                        break;
                    }
                    value.push(ch);
                }
                tokens.push(Token::Quoted(value));
            }
            _ => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || matches!(ch, '>' | '<' | '=' | '!' | '"' | '\'') {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }

    tokens
}

fn is_valid_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("and") => Some("AND"),
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("or") => Some("OR"),
            Some(Token::Word(w)) if w.eq_ignore_ascii_case("not") => Some("NOT"),
            _ => None,
        }
    }

    // expr := term (("AND" | "OR") term)*, folded left-to-right
    fn parse_expr(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_term()?;

        while let Some(keyword) = self.peek_keyword() {
            match keyword {
                "AND" => {
                    self.next();
                    let rhs = self.parse_term()?;
                    expr = Expr::And(Box::new(expr), Box::new(rhs));
                }
                "OR" => {
                    self.next();
                    let rhs = self.parse_term()?;
                    expr = Expr::Or(Box::new(expr), Box::new(rhs));
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    // term := ["NOT"] comparison
    fn parse_term(&mut self) -> Result<Expr, ExprError> {
        if self.peek_keyword() == Some("NOT") {
            self.next();
            let comparison = self.parse_comparison()?;
            return Ok(Expr::Not(Box::new(Expr::Comparison(comparison))));
        }
        Ok(Expr::Comparison(self.parse_comparison()?))
    }

    // comparison := path op literal
    fn parse_comparison(&mut self) -> Result<Comparison, ExprError> {
        let path = match self.next() {
            Some(Token::Word(w)) => w,
            Some(other) => return Err(ExprError::UnexpectedToken(other.text())),
            None => return Err(ExprError::UnexpectedEnd),
        };
        if !is_valid_path(&path) {
            return Err(ExprError::InvalidPath(path));
        }

        let op = match self.next() {
            Some(Token::Op(op)) => op,
            Some(other) => return Err(ExprError::UnexpectedToken(other.text())),
            None => return Err(ExprError::UnexpectedEnd),
        };

        let literal = match self.next() {
            Some(Token::Word(w)) => match w.parse::<f64>() {
                Ok(n) => Literal::Number(n),
                Err(_) => Literal::Raw(w),
            },
            Some(Token::Quoted(q)) => match q.parse::<f64>() {
                Ok(n) => Literal::Number(n),
                Err(_) => Literal::Raw(q),
            },
            Some(other) => return Err(ExprError::UnexpectedToken(other.text())),
            None => return Err(ExprError::UnexpectedEnd),
        };

        Ok(Comparison { path, op, literal })
    }
}
