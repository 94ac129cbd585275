//! # Gate Expressions
//!
//! A deliberately small boolean language over feature-gate names, used in
//! marker arguments such as `featureGate=(alpha&beta)|gamma`.
//!
//! ## Grammar
//!
//! ```text
//! expr := term ( ('&' term)* | ('|' term)* )
//! term := name | '(' expr ')'
//! name := [A-Za-z0-9_-]+
//! ```
//!
//! One group may use `&` or `|` but never both: `a&b|c` is rejected and
//! must be written `(a&b)|c`. Whitespace is rejected rather than trimmed,
//! since these expressions live inside dense comma-separated marker text.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::GateState;

/// A parsed gate expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateExpr {
    /// A single gate name.
    Literal(String),
    /// Both sides must hold.
    And(Box<GateExpr>, Box<GateExpr>),
    /// Either side must hold.
    Or(Box<GateExpr>, Box<GateExpr>),
}

/// Errors produced while parsing a gate expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The expression text was empty.
    #[error("gate expression is empty")]
    Empty,

    /// `&` and `|` were mixed in one group without parentheses.
    #[error("mixed '&' and '|' at position {position}; group with parentheses")]
    MixedOperators {
        /// Byte offset of the offending operator.
        position: usize,
    },

    /// Whitespace is not permitted anywhere in an expression.
    #[error("whitespace is not allowed in gate expressions (position {position})")]
    Whitespace {
        /// Byte offset of the whitespace character.
        position: usize,
    },

    /// A character outside the name set and operator set.
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        ch: char,
        /// Byte offset of the character.
        position: usize,
    },

    /// A `(` without a matching `)`, or a stray `)`.
    #[error("unbalanced parenthesis at position {position}")]
    UnbalancedParen {
        /// Byte offset of the unmatched parenthesis.
        position: usize,
    },

    /// Input ended where a gate name or `(` was expected.
    #[error("unexpected end of gate expression")]
    UnexpectedEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

struct ExprParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn unexpected(&self) -> GateError {
        match self.peek() {
            None => GateError::UnexpectedEnd,
            Some(c) if c.is_whitespace() => GateError::Whitespace { position: self.pos },
            Some(')') => GateError::UnbalancedParen { position: self.pos },
            Some(ch) => GateError::UnexpectedCharacter {
                ch,
                position: self.pos,
            },
        }
    }

    fn parse_expr(&mut self) -> Result<GateExpr, GateError> {
        let mut left = self.parse_term()?;
        let mut group_op: Option<Op> = None;
        loop {
            let op = match self.peek() {
                Some('&') => Op::And,
                Some('|') => Op::Or,
                _ => break,
            };
            if group_op.is_some_and(|prev| prev != op) {
                return Err(GateError::MixedOperators { position: self.pos });
            }
            group_op = Some(op);
            self.pos += 1;
            let right = self.parse_term()?;
            left = match op {
                Op::And => GateExpr::And(Box::new(left), Box::new(right)),
                Op::Or => GateExpr::Or(Box::new(left), Box::new(right)),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<GateExpr, GateError> {
        match self.peek() {
            Some('(') => {
                let open = self.pos;
                self.pos += 1;
                let inner = self.parse_expr()?;
                match self.peek() {
                    Some(')') => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    None => Err(GateError::UnbalancedParen { position: open }),
                    Some(_) => Err(self.unexpected()),
                }
            }
            Some(c) if is_name_char(c) => {
                let start = self.pos;
                while self.peek().is_some_and(is_name_char) {
                    self.pos += 1;
                }
                Ok(GateExpr::Literal(self.src[start..self.pos].to_string()))
            }
            _ => Err(self.unexpected()),
        }
    }
}

impl GateExpr {
    /// Parse expression text.
    pub fn parse(text: &str) -> Result<Self, GateError> {
        if text.is_empty() {
            return Err(GateError::Empty);
        }
        let mut parser = ExprParser { src: text, pos: 0 };
        let expr = parser.parse_expr()?;
        if parser.pos < text.len() {
            return Err(parser.unexpected());
        }
        Ok(expr)
    }

    /// Evaluate against a gate state. Absent gates are disabled.
    pub fn evaluate(&self, state: &GateState) -> bool {
        match self {
            Self::Literal(name) => state.is_enabled(name),
            Self::And(l, r) => l.evaluate(state) && r.evaluate(state),
            Self::Or(l, r) => l.evaluate(state) || r.evaluate(state),
        }
    }

    /// Every gate name the expression mentions.
    pub fn gate_names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Self::Literal(name) => {
                names.insert(name.as_str());
            }
            Self::And(l, r) | Self::Or(l, r) => {
                l.collect_names(names);
                r.collect_names(names);
            }
        }
    }

    fn op(&self) -> Option<Op> {
        match self {
            Self::Literal(_) => None,
            Self::And(..) => Some(Op::And),
            Self::Or(..) => Some(Op::Or),
        }
    }

    fn fmt_operand(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        parent: Op,
        right: bool,
    ) -> std::fmt::Result {
        // Left-leaning chains of one operator render flat; anything else is grouped.
        let grouped = match self.op() {
            None => false,
            Some(op) => right || op != parent,
        };
        if grouped {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl std::fmt::Display for GateExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (l, r, op, sym) = match self {
            Self::Literal(name) => return f.write_str(name),
            Self::And(l, r) => (l, r, Op::And, '&'),
            Self::Or(l, r) => (l, r, Op::Or, '|'),
        };
        l.fmt_operand(f, op, false)?;
        write!(f, "{sym}")?;
        r.fmt_operand(f, op, true)
    }
}

impl std::str::FromStr for GateExpr {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Syntax-only check of expression text, independent of any gate state.
pub fn validate(text: &str) -> Result<(), GateError> {
    GateExpr::parse(text).map(|_| ())
}

/// Parse and evaluate in one step.
pub fn evaluate(text: &str, state: &GateState) -> Result<bool, GateError> {
    GateExpr::parse(text).map(|expr| expr.evaluate(state))
}
