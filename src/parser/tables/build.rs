// src/parser/tables/build.rs
// Fills the dense (state, token kind) -> state table for the shipped grammar.

use super::{
    ERROR, TransitionTable,
    states::{N_STATES, State},
};
use crate::lexer::tokens::{N_KINDS, TokenKind};

type Rows = Vec<[u16; N_KINDS]>;

const TYPE_NAMES: &[TokenKind] = &[
    TokenKind::Int,
    TokenKind::Float,
    TokenKind::Bool,
    TokenKind::Ident,
];
const LITERALS: &[TokenKind] = &[TokenKind::Number, TokenKind::True, TokenKind::False];
const VALUES: &[TokenKind] = &[
    TokenKind::Number,
    TokenKind::True,
    TokenKind::False,
    TokenKind::Ident,
];
const BINOPS: &[TokenKind] = &[
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
    TokenKind::And,
    TokenKind::Or,
];

fn set(rows: &mut Rows, from: State, kinds: &[TokenKind], to: State) {
    for &k in kinds {
        rows[from.idx()][k.idx()] = to.idx() as u16;
    }
}

/// Gives `to` every edge of `from` that `to` does not define itself.
fn copy_edges(rows: &mut Rows, from: State, to: State) {
    for k in 0..N_KINDS {
        if rows[to.idx()][k] == ERROR {
            rows[to.idx()][k] = rows[from.idx()][k];
        }
    }
}

/// Entry into an expression: a literal or a name.
fn operand_entry(rows: &mut Rows, from: State) {
    set(rows, from, LITERALS, State::Operand);
    set(rows, from, &[TokenKind::Ident], State::OperandName);
}

pub fn build_transition_table() -> TransitionTable {
    use State::*;
    use TokenKind as K;

    let mut rows: Rows = vec![[ERROR; N_KINDS]; N_STATES];
    let r = &mut rows;

    // ---------- top level ----------
    set(r, Start, &[K::Type], TypeKw);
    set(r, Start, &[K::Var], GlobalKw);
    set(r, Start, &[K::Func], FuncKw);
    set(r, Start, &[K::Eof], Finished);

    // type NAME = typename ;
    set(r, TypeKw, &[K::Ident], TypeName);
    set(r, TypeName, &[K::Assign], TypeEq);
    set(r, TypeEq, TYPE_NAMES, TypeTarget);
    set(r, TypeTarget, &[K::Semi], TypeEnd);

    // var NAME : typename (= literal)? ;
    set(r, GlobalKw, &[K::Ident], GlobalName);
    set(r, GlobalName, &[K::Colon], GlobalColon);
    set(r, GlobalColon, TYPE_NAMES, GlobalType);
    set(r, GlobalType, &[K::Semi], GlobalEnd);
    set(r, GlobalType, &[K::Assign], GlobalEq);
    set(r, GlobalEq, LITERALS, GlobalInit);
    set(r, GlobalInit, &[K::Semi], GlobalEnd);

    // func NAME ( params ) : typename {
    set(r, FuncKw, &[K::Ident], FuncName);
    set(r, FuncName, &[K::LParen], ParamOpen);
    set(r, ParamOpen, &[K::Ident], ParamName);
    set(r, ParamOpen, &[K::RParen], NoParams);
    set(r, ParamName, &[K::Colon], ParamColon);
    set(r, ParamColon, TYPE_NAMES, ParamType);
    set(r, ParamType, &[K::Comma], ParamComma);
    set(r, ParamType, &[K::RParen], ParamClose);
    set(r, ParamComma, &[K::Ident], ParamName);
    set(r, ParamClose, &[K::Colon], RetColon);
    set(r, NoParams, &[K::Colon], RetColon);
    set(r, RetColon, TYPE_NAMES, RetType);
    set(r, RetType, &[K::LBrace], BodyOpen);

    // ---------- function body ----------
    set(r, BodyOpen, &[K::Var], LocalKw);
    set(r, BodyOpen, &[K::Ident], StmtName);
    set(r, BodyOpen, &[K::Return], ReturnKw);
    set(r, BodyOpen, &[K::RBrace], BodyClose);

    // var NAME : typename (= expr)? ;
    set(r, LocalKw, &[K::Ident], LocalName);
    set(r, LocalName, &[K::Colon], LocalColon);
    set(r, LocalColon, TYPE_NAMES, LocalType);
    set(r, LocalType, &[K::Semi], StmtEnd);
    set(r, LocalType, &[K::Assign], LocalEq);
    operand_entry(r, LocalEq);

    // NAME = expr ;   |   NAME ( args ) ;
    set(r, StmtName, &[K::Assign], AssignEq);
    set(r, StmtName, &[K::LParen], CallStmt);
    operand_entry(r, AssignEq);
    set(r, CallStmt, VALUES, CallStmtArg);
    set(r, CallStmt, &[K::RParen], CallStmtClose);
    set(r, CallStmtArg, &[K::Comma], CallStmtComma);
    set(r, CallStmtArg, &[K::RParen], CallStmtClose);
    set(r, CallStmtComma, VALUES, CallStmtArg);
    set(r, CallStmtClose, &[K::Semi], StmtEnd);

    // return expr ;
    operand_entry(r, ReturnKw);

    // ---------- expressions ----------
    set(r, OperandName, &[K::LParen], CallOpen);
    set(r, CallOpen, VALUES, CallArg);
    set(r, CallOpen, &[K::RParen], CallClose);
    set(r, CallArg, &[K::Comma], CallComma);
    set(r, CallArg, &[K::RParen], CallClose);
    set(r, CallComma, VALUES, CallArg);
    for done in [Operand, OperandName, CallClose] {
        set(r, done, BINOPS, BinOp);
        set(r, done, &[K::Semi], StmtEnd);
    }
    operand_entry(r, BinOp);

    // ---------- end states continue where their context left off ----------
    copy_edges(r, BodyOpen, StmtEnd);
    for end in [TypeEnd, GlobalEnd, BodyClose] {
        copy_edges(r, Start, end);
    }

    TransitionTable { rows }
}
