// src/parser/tables/states.rs
use std::fmt;

use serde::Serialize;

/// Parser states. A state also names the tree node it produces, so the
/// lowering table is keyed by these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum State {
    Start,

    // type NAME = typename ;
    TypeKw,
    TypeName,
    TypeEq,
    TypeTarget,
    TypeEnd,

    // var NAME : typename (= literal)? ;   (top level)
    GlobalKw,
    GlobalName,
    GlobalColon,
    GlobalType,
    GlobalEq,
    GlobalInit,
    GlobalEnd,

    // func NAME ( params ) : typename { ... }
    FuncKw,
    FuncName,
    ParamOpen,
    ParamName,
    ParamColon,
    ParamType,
    ParamComma,
    ParamClose,
    NoParams,
    RetColon,
    RetType,
    BodyOpen,
    BodyClose,

    // statements
    LocalKw,
    LocalName,
    LocalColon,
    LocalType,
    LocalEq,
    StmtName,
    AssignEq,
    CallStmt,
    CallStmtArg,
    CallStmtComma,
    CallStmtClose,
    ReturnKw,

    // expressions
    Operand,
    OperandName,
    CallOpen,
    CallArg,
    CallComma,
    CallClose,
    BinOp,
    StmtEnd,

    Finished,
}

pub const N_STATES: usize = 47;

pub const ALL_STATES: [State; N_STATES] = [
    State::Start,
    State::TypeKw,
    State::TypeName,
    State::TypeEq,
    State::TypeTarget,
    State::TypeEnd,
    State::GlobalKw,
    State::GlobalName,
    State::GlobalColon,
    State::GlobalType,
    State::GlobalEq,
    State::GlobalInit,
    State::GlobalEnd,
    State::FuncKw,
    State::FuncName,
    State::ParamOpen,
    State::ParamName,
    State::ParamColon,
    State::ParamType,
    State::ParamComma,
    State::ParamClose,
    State::NoParams,
    State::RetColon,
    State::RetType,
    State::BodyOpen,
    State::BodyClose,
    State::LocalKw,
    State::LocalName,
    State::LocalColon,
    State::LocalType,
    State::LocalEq,
    State::StmtName,
    State::AssignEq,
    State::CallStmt,
    State::CallStmtArg,
    State::CallStmtComma,
    State::CallStmtClose,
    State::ReturnKw,
    State::Operand,
    State::OperandName,
    State::CallOpen,
    State::CallArg,
    State::CallComma,
    State::CallClose,
    State::BinOp,
    State::StmtEnd,
    State::Finished,
];

/// What entering a state does to the tree under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// bookkeeping only
    Skip,
    /// record the token as a leaf
    Shift,
    /// open a construct named by this state
    Begin,
    /// open a construct and record the token
    BeginShift,
    /// open a construct around the last recorded leaf
    Wrap,
    /// rename the innermost open construct
    Retag,
    /// close the construct and keep it as an operand of its parent
    Fold,
    /// close the construct and attach it to the enclosing block
    Reduce,
    /// close the construct and make it the block statements attach to
    Open,
    /// finish the innermost block
    Close,
    /// record the end-of-file leaf
    Finish,
}

impl State {
    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        ALL_STATES.get(i).copied().filter(|s| s.idx() == i)
    }

    pub fn action(self) -> Action {
        use State::*;
        match self {
            Start | TypeEq | GlobalColon | GlobalEq | ParamOpen | ParamColon | NoParams
            | RetColon | LocalColon | LocalEq | CallStmtComma | CallStmtClose | CallComma => {
                Action::Skip
            }
            TypeName | TypeTarget | GlobalName | GlobalType | GlobalInit | FuncName
            | ParamType | RetType | LocalName | LocalType | CallStmtArg | Operand | OperandName
            | CallArg | BinOp => Action::Shift,
            TypeKw | GlobalKw | FuncKw | LocalKw | ReturnKw => Action::Begin,
            ParamName | StmtName => Action::BeginShift,
            CallOpen => Action::Wrap,
            AssignEq | CallStmt => Action::Retag,
            ParamComma | ParamClose | CallClose => Action::Fold,
            TypeEnd | GlobalEnd | StmtEnd => Action::Reduce,
            BodyOpen => Action::Open,
            BodyClose => Action::Close,
            Finished => Action::Finish,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips() {
        for (i, s) in ALL_STATES.iter().enumerate() {
            assert_eq!(s.idx(), i, "{s:?} out of place");
        }
        assert_eq!(State::Finished.idx() + 1, N_STATES);
        assert_eq!(State::from_index(N_STATES), None);
    }
}
