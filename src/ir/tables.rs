// src/ir/tables.rs
// Generation table: (generation state, tree node kind) -> generation state.

use serde::Serialize;

use crate::parser::tables::{ERROR, N_STATES, State, TableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum GenState {
    Initial,
    Declarations,
    FunctionEntry,
    FunctionBody,
    FunctionExit,
    Finished,
}

pub const N_GEN_STATES: usize = 6;

pub const ALL_GEN_STATES: [GenState; N_GEN_STATES] = [
    GenState::Initial,
    GenState::Declarations,
    GenState::FunctionEntry,
    GenState::FunctionBody,
    GenState::FunctionExit,
    GenState::Finished,
];

impl GenState {
    #[inline]
    pub fn idx(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        ALL_GEN_STATES.get(i).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTable {
    pub(crate) rows: Vec<[u16; N_STATES]>,
}

impl GenerationTable {
    pub fn from_rows(rows: Vec<[u16; N_STATES]>) -> Result<Self, TableError> {
        if rows.len() != N_GEN_STATES {
            return Err(TableError::RowCount {
                table: "generation",
                got: rows.len(),
                want: N_GEN_STATES,
            });
        }
        for (row, cells) in rows.iter().enumerate() {
            if let Some((col, &value)) = cells
                .iter()
                .enumerate()
                .find(|&(_, &v)| v != ERROR && v as usize >= N_GEN_STATES)
            {
                return Err(TableError::BadCell {
                    table: "generation",
                    row,
                    col,
                    value,
                });
            }
        }
        Ok(Self { rows })
    }

    #[inline]
    pub fn get(&self, gen_state: GenState, kind: State) -> Option<GenState> {
        match self.rows[gen_state.idx()][kind.idx()] {
            ERROR => None,
            next => GenState::from_index(next as usize),
        }
    }

    pub fn rows(&self) -> &[[u16; N_STATES]] {
        &self.rows
    }

    pub fn filled(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.iter())
            .filter(|&&c| c != ERROR)
            .count()
    }
}

const DECLS: &[State] = &[State::TypeKw, State::GlobalKw];
const STATEMENTS: &[State] = &[
    State::LocalKw,
    State::AssignEq,
    State::CallStmt,
    State::ReturnKw,
];

fn set(rows: &mut [[u16; N_STATES]], from: GenState, kinds: &[State], to: GenState) {
    for &k in kinds {
        rows[from.idx()][k.idx()] = to.idx() as u16;
    }
}

pub fn build_generation_table() -> GenerationTable {
    use GenState::*;

    let mut rows = vec![[ERROR; N_STATES]; N_GEN_STATES];
    let r = rows.as_mut_slice();

    // between top-level items
    for from in [Initial, Declarations, FunctionExit] {
        set(r, from, DECLS, Declarations);
        set(r, from, &[State::FuncKw], FunctionEntry);
        set(r, from, &[State::Finished], Finished);
    }

    // inside a function
    set(r, FunctionEntry, &[State::ParamName], FunctionEntry);
    for from in [FunctionEntry, FunctionBody] {
        set(r, from, STATEMENTS, FunctionBody);
        set(r, from, &[State::BodyClose], FunctionExit);
    }

    GenerationTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_is_terminal() {
        let t = build_generation_table();
        for s in crate::parser::tables::ALL_STATES {
            assert_eq!(t.get(GenState::Finished, s), None);
        }
    }

    #[test]
    fn statements_only_inside_functions() {
        let t = build_generation_table();
        assert_eq!(t.get(GenState::Declarations, State::ReturnKw), None);
        assert_eq!(
            t.get(GenState::FunctionEntry, State::ReturnKw),
            Some(GenState::FunctionBody)
        );
        assert_eq!(t.get(GenState::FunctionBody, State::ParamName), None);
        assert_eq!(
            t.get(GenState::FunctionExit, State::Finished),
            Some(GenState::Finished)
        );
    }

    #[test]
    fn from_rows_rejects_out_of_range_cells() {
        let mut rows = build_generation_table().rows;
        rows[0][0] = N_GEN_STATES as u16;
        assert!(matches!(
            GenerationTable::from_rows(rows),
            Err(TableError::BadCell { row: 0, col: 0, .. })
        ));
    }
}
