//! Conditional expressions attached to structured-manifest dependencies.
//!
//! A condition is a boolean expression over `$VARIABLE` references and bare
//! literals:
//!
//! ```text
//! expr       := and_expr ("or" and_expr)*
//! and_expr   := primary ("and" primary)*
//! primary    := "(" expr ")" | comparison
//! comparison := value op value
//! op         := "==" | "!=" | "<" | "<=" | ">" | ">="
//! value      := "$" IDENT | LITERAL | "'" TEXT "'" | "\"" TEXT "\""
//! ```
//!
//! Variables missing from the environment evaluate to the empty string.
//! Comparisons are string comparisons.

use anyhow::Result;
use std::collections::BTreeMap;

use crate::core::RosdepError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Variable(String),
    Literal(String),
    Op(CompareOp),
    And,
    Or,
    LParen,
    RParen,
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    fn apply(self, left: &str, right: &str) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
        }
    }
}

/// Parsed condition expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Both sides must hold
    And(Box<Condition>, Box<Condition>),
    /// Either side must hold
    Or(Box<Condition>, Box<Condition>),
    /// A single comparison
    Compare {
        /// Left operand
        left: Operand,
        /// Comparison operator
        op: CompareOp,
        /// Right operand
        right: Operand,
    },
}

/// Operand of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `$NAME`, looked up in the environment
    Variable(String),
    /// Literal text
    Literal(String),
}

impl Operand {
    fn resolve<'a>(&'a self, env: &'a BTreeMap<String, String>) -> &'a str {
        match self {
            Self::Variable(name) => env.get(name).map_or("", String::as_str),
            Self::Literal(text) => text,
        }
    }
}

impl Condition {
    /// Parse a condition expression.
    ///
    /// # Errors
    ///
    /// Returns [`RosdepError::InvalidCondition`] when the expression is malformed.
    pub fn parse(expression: &str) -> Result<Self> {
        let invalid = |reason: String| RosdepError::InvalidCondition {
            expression: expression.to_string(),
            reason,
        };

        let tokens = tokenize(expression).map_err(invalid)?;
        if tokens.is_empty() {
            return Err(invalid("empty expression".to_string()).into());
        }

        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
        };
        let condition = parser.parse_or().map_err(invalid)?;
        if parser.pos != tokens.len() {
            return Err(invalid(format!("unexpected token at position {}", parser.pos)).into());
        }
        Ok(condition)
    }

    /// Evaluate against an environment mapping. Pure: no side effects.
    pub fn evaluate(&self, env: &BTreeMap<String, String>) -> bool {
        match self {
            Self::And(left, right) => left.evaluate(env) && right.evaluate(env),
            Self::Or(left, right) => left.evaluate(env) || right.evaluate(env),
            Self::Compare {
                left,
                op,
                right,
            } => op.apply(left.resolve(env), right.resolve(env)),
        }
    }
}

/// Parse and evaluate in one step; an absent condition is true.
///
/// # Errors
///
/// Returns [`RosdepError::InvalidCondition`] when the expression is malformed.
pub fn evaluate_condition(
    expression: Option<&str>,
    env: &BTreeMap<String, String>,
) -> Result<bool> {
    match expression.map(str::trim) {
        None | Some("") => Ok(true),
        Some(expression) => Ok(Condition::parse(expression)?.evaluate(env)),
    }
}

fn parse_op(text: &str) -> Option<CompareOp> {
    match text {
        "==" => Some(CompareOp::Eq),
        "!=" => Some(CompareOp::Ne),
        "<" => Some(CompareOp::Lt),
        "<=" => Some(CompareOp::Le),
        ">" => Some(CompareOp::Gt),
        ">=" => Some(CompareOp::Ge),
        _ => None,
    }
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '=' | '!' | '<' | '>' => {
                let two: String = chars[i..chars.len().min(i + 2)].iter().collect();
                if let Some(op) = parse_op(&two) {
                    tokens.push(Token::Op(op));
                    i += 2;
                } else if let Some(op) = parse_op(&c.to_string()) {
                    tokens.push(Token::Op(op));
                    i += 1;
                } else {
                    return Err(format!("unknown operator '{two}'"));
                }
            }
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or_else(|| "unterminated quoted literal".to_string())?;
                tokens.push(Token::Literal(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            '$' => {
                let word = read_word(&chars, i + 1);
                if word.is_empty() {
                    return Err("'$' must be followed by a variable name".to_string());
                }
                i += 1 + word.chars().count();
                tokens.push(Token::Variable(word));
            }
            _ => {
                let word = read_word(&chars, i);
                if word.is_empty() {
                    return Err(format!("unexpected character '{c}'"));
                }
                i += word.chars().count();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    _ => Token::Literal(word),
                });
            }
        }
    }

    Ok(tokens)
}

fn read_word(chars: &[char], start: usize) -> String {
    chars[start..]
        .iter()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> std::result::Result<Condition, String> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> std::result::Result<Condition, String> {
        let mut left = self.parse_primary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_primary()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> std::result::Result<Condition, String> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.parse_or()?;
            return match self.next() {
                Some(Token::RParen) => Ok(inner),
                _ => Err("missing closing parenthesis".to_string()),
            };
        }

        let left = self.parse_operand()?;
        let op = match self.next() {
            Some(Token::Op(op)) => op,
            other => return Err(format!("expected comparison operator, found {other:?}")),
        };
        let right = self.parse_operand()?;
        Ok(Condition::Compare {
            left,
            op,
            right,
        })
    }

    fn parse_operand(&mut self) -> std::result::Result<Operand, String> {
        match self.next() {
            Some(Token::Variable(name)) => Ok(Operand::Variable(name)),
            Some(Token::Literal(text)) => Ok(Operand::Literal(text)),
            other => Err(format!("expected variable or literal, found {other:?}")),
        }
    }
}
