// src/ir/tac.rs
// Three-address instructions: (op, arg1?, arg2?, result?).

use std::fmt;

use serde::Serialize;

use crate::{
    lexer::{
        scan::{split_int_suffix, split_radix},
        tokens::{Token, TokenKind},
    },
    semantic::types::Type,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    Name(String),
    Temp(u32),
    Int(u64),
    /// decimal text exactly as written
    Float(String),
    Bool(bool),
}

impl Operand {
    pub fn zero(ty: Type) -> Self {
        match ty {
            Type::Int => Operand::Int(0),
            Type::Float => Operand::Float("0.0".to_string()),
            Type::Bool => Operand::Bool(false),
        }
    }

    /// `None` for an integer that does not fit 64 bits, or a non-literal.
    pub fn literal(token: &Token) -> Option<Self> {
        match token.kind {
            TokenKind::True => Some(Operand::Bool(true)),
            TokenKind::False => Some(Operand::Bool(false)),
            TokenKind::Number if token.lexeme.contains('.') => {
                Some(Operand::Float(token.lexeme.clone()))
            }
            TokenKind::Number => normalize_int(&token.lexeme).map(Operand::Int),
            _ => None,
        }
    }
}

/// Value of an integer literal with its radix prefix and suffix removed.
pub fn normalize_int(text: &str) -> Option<u64> {
    let (body, _) = split_int_suffix(text);
    let (digits, radix) = split_radix(body);
    u64::from_str_radix(digits, radix).ok()
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Name(n) => f.write_str(n),
            Operand::Temp(i) => write!(f, "_t{i}"),
            Operand::Int(v) => write!(f, "{v}"),
            Operand::Float(s) => f.write_str(s),
            Operand::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        use TokenKind as K;
        Some(match kind {
            K::Plus => BinaryOp::Add,
            K::Minus => BinaryOp::Sub,
            K::Star => BinaryOp::Mul,
            K::Slash => BinaryOp::Div,
            K::Percent => BinaryOp::Rem,
            K::Lt => BinaryOp::Lt,
            K::Gt => BinaryOp::Gt,
            K::Le => BinaryOp::Le,
            K::Ge => BinaryOp::Ge,
            K::EqEq => BinaryOp::Eq,
            K::NotEq => BinaryOp::Ne,
            K::And => BinaryOp::And,
            K::Or => BinaryOp::Or,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Op {
    /// declare a global: `global x`
    Global,
    /// `x = a`
    Copy,
    /// `x = a op b`
    Binary(BinaryOp),
    /// `func f, nparams`
    Func,
    /// `param_in a`
    ParamIn,
    /// `param a`
    Param,
    /// `x = call f, n` or `call f, n`
    Call,
    /// `return a`
    Return,
    /// `endfunc f`
    EndFunc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    pub op: Op,
    pub arg1: Option<Operand>,
    pub arg2: Option<Operand>,
    pub result: Option<Operand>,
}

impl Instruction {
    pub fn new(
        op: Op,
        arg1: Option<Operand>,
        arg2: Option<Operand>,
        result: Option<Operand>,
    ) -> Self {
        Self {
            op,
            arg1,
            arg2,
            result,
        }
    }
}

struct Opt<'a>(&'a Option<Operand>);

impl fmt::Display for Opt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(o) => fmt::Display::fmt(o, f),
            None => f.write_str("_"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b, r) = (Opt(&self.arg1), Opt(&self.arg2), Opt(&self.result));
        match self.op {
            Op::Global => write!(f, "global {r}"),
            Op::Copy => write!(f, "{r} = {a}"),
            Op::Binary(op) => write!(f, "{r} = {a} {} {b}", op.symbol()),
            Op::Func => write!(f, "func {a}, {b}"),
            Op::ParamIn => write!(f, "param_in {r}"),
            Op::Param => write!(f, "param {a}"),
            Op::Call if self.result.is_some() => write!(f, "{r} = call {a}, {b}"),
            Op::Call => write!(f, "call {a}, {b}"),
            Op::Return => write!(f, "return {a}"),
            Op::EndFunc => write!(f, "endfunc {a}"),
        }
    }
}
