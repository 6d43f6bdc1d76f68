// src/semantic/types.rs
use std::fmt;

use serde::Serialize;

use crate::lexer::tokens::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,
    Float,
    Bool,
}

impl Type {
    pub fn builtin(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Int => Some(Type::Int),
            TokenKind::Float => Some(Type::Float),
            TokenKind::Bool => Some(Type::Bool),
            _ => None,
        }
    }

    /// Type of a literal token. Numbers with a `.` are floats.
    pub fn of_literal(token: &Token) -> Option<Self> {
        match token.kind {
            TokenKind::True | TokenKind::False => Some(Type::Bool),
            TokenKind::Number if token.lexeme.contains('.') => Some(Type::Float),
            TokenKind::Number => Some(Type::Int),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Bool => "bool",
        })
    }
}

/// Result type of `lhs op rhs`, or `None` when the operands don't fit.
pub fn binary_result(op: TokenKind, lhs: Type, rhs: Type) -> Option<Type> {
    use TokenKind::{And, EqEq, Ge, Gt, Le, Lt, Minus, NotEq, Or, Percent, Plus, Slash, Star};
    match op {
        Plus | Minus | Star | Slash if lhs == rhs && lhs.is_numeric() => Some(lhs),
        Percent if lhs == Type::Int && rhs == Type::Int => Some(Type::Int),
        Lt | Gt | Le | Ge if lhs == rhs && lhs.is_numeric() => Some(Type::Bool),
        EqEq | NotEq if lhs == rhs => Some(Type::Bool),
        And | Or if lhs == Type::Bool && rhs == Type::Bool => Some(Type::Bool),
        _ => None,
    }
}
