// src/lexer/tokens.rs
use std::{fmt, sync::Arc};

use serde::Serialize;

/// Token kinds of the shipped grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum TokenKind {
    Ident = 0,
    Number = 1,

    // keywords
    Type,
    Var,
    Func,
    Return,
    Int,
    Float,
    Bool,
    True,
    False,
    And,
    Or,

    // punctuation
    Semi,
    Colon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Assign,

    // operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,

    Eof,
}

pub const N_KINDS: usize = 33;

pub const ALL_KINDS: [TokenKind; N_KINDS] = [
    TokenKind::Ident,
    TokenKind::Number,
    TokenKind::Type,
    TokenKind::Var,
    TokenKind::Func,
    TokenKind::Return,
    TokenKind::Int,
    TokenKind::Float,
    TokenKind::Bool,
    TokenKind::True,
    TokenKind::False,
    TokenKind::And,
    TokenKind::Or,
    TokenKind::Semi,
    TokenKind::Colon,
    TokenKind::Comma,
    TokenKind::LParen,
    TokenKind::RParen,
    TokenKind::LBrace,
    TokenKind::RBrace,
    TokenKind::Assign,
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Star,
    TokenKind::Slash,
    TokenKind::Percent,
    TokenKind::Lt,
    TokenKind::Gt,
    TokenKind::Le,
    TokenKind::Ge,
    TokenKind::EqEq,
    TokenKind::NotEq,
    TokenKind::Eof,
];

/// Reserved words, in the order they are loaded into the dictionary.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("type", TokenKind::Type),
    ("var", TokenKind::Var),
    ("func", TokenKind::Func),
    ("return", TokenKind::Return),
    ("int", TokenKind::Int),
    ("float", TokenKind::Float),
    ("bool", TokenKind::Bool),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("and", TokenKind::And),
    ("or", TokenKind::Or),
];

/// Punctuators, longest first so maximal munch is a linear scan.
pub const PUNCTUATORS: &[(&str, TokenKind)] = &[
    ("<=", TokenKind::Le),
    (">=", TokenKind::Ge),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    (";", TokenKind::Semi),
    (":", TokenKind::Colon),
    (",", TokenKind::Comma),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("=", TokenKind::Assign),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
];

impl TokenKind {
    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        ALL_KINDS.get(i).copied()
    }

    pub fn keyword(word: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(kw, _)| *kw == word)
            .map(|&(_, kind)| kind)
    }

    pub fn is_binop(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Plus | Minus | Star | Slash | Percent | Lt | Gt | Le | Ge | EqEq | NotEq | And | Or
        )
    }

    pub fn is_type_name(self) -> bool {
        matches!(
            self,
            TokenKind::Int | TokenKind::Float | TokenKind::Bool | TokenKind::Ident
        )
    }

    /// Human readable spelling used in diagnostics.
    pub fn describe(self) -> &'static str {
        use TokenKind::*;
        match self {
            Ident => "identifier",
            Number => "number",
            Eof => "end of file",
            other => KEYWORDS
                .iter()
                .chain(PUNCTUATORS.iter())
                .find(|&&(_, k)| k == other)
                .map(|&(s, _)| s)
                .unwrap_or("?"),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident | TokenKind::Number | TokenKind::Eof => f.write_str(self.describe()),
            _ => write!(f, "`{}`", self.describe()),
        }
    }
}

/// A classified, positioned unit of input. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    #[serde(skip)]
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: impl Into<String>,
        file: Arc<str>,
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            file,
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_kinds_line_up_with_discriminants() {
        for (i, k) in ALL_KINDS.iter().enumerate() {
            assert_eq!(k.idx(), i, "{k:?} out of place");
        }
        assert_eq!(TokenKind::Eof.idx() + 1, N_KINDS);
    }

    #[test]
    fn punctuators_are_longest_first() {
        let mut seen_single = false;
        for (p, _) in PUNCTUATORS {
            if p.len() == 1 {
                seen_single = true;
            } else {
                assert!(!seen_single, "{p} listed after a single-char punctuator");
            }
        }
    }

    #[test]
    fn keyword_lookup() {
        assert_eq!(TokenKind::keyword("func"), Some(TokenKind::Func));
        assert_eq!(TokenKind::keyword("funcs"), None);
        assert_eq!(TokenKind::Le.describe(), "<=");
    }
}
