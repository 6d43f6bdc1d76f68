// src/parser/tables/mod.rs
pub mod build;
pub mod io;
pub mod states;

pub use build::build_transition_table;
pub use io::{TableSet, load_tables_json_bytes, save_tables_json};
pub use states::{ALL_STATES, Action, N_STATES, State};

use crate::lexer::tokens::{ALL_KINDS, N_KINDS, TokenKind};

/// Cell value for "no transition".
pub const ERROR: u16 = u16::MAX;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("{table} table has {got} rows, expected {want}")]
    RowCount {
        table: &'static str,
        got: usize,
        want: usize,
    },
    #[error("{table} table cell ({row}, {col}) = {value} is not a valid state")]
    BadCell {
        table: &'static str,
        row: usize,
        col: usize,
        value: u16,
    },
    #[error("{table} table was generated for a different {what} list")]
    Mismatch {
        table: &'static str,
        what: &'static str,
    },
    #[error("malformed table file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Dense `State x TokenKind -> State` table. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    pub(crate) rows: Vec<[u16; N_KINDS]>,
}

impl TransitionTable {
    pub fn from_rows(rows: Vec<[u16; N_KINDS]>) -> Result<Self, TableError> {
        if rows.len() != N_STATES {
            return Err(TableError::RowCount {
                table: "transition",
                got: rows.len(),
                want: N_STATES,
            });
        }
        for (row, cells) in rows.iter().enumerate() {
            for (col, &value) in cells.iter().enumerate() {
                if value != ERROR && value as usize >= N_STATES {
                    return Err(TableError::BadCell {
                        table: "transition",
                        row,
                        col,
                        value,
                    });
                }
            }
        }
        Ok(Self { rows })
    }

    #[inline]
    pub fn get(&self, state: State, kind: TokenKind) -> Option<State> {
        match self.rows[state.idx()][kind.idx()] {
            ERROR => None,
            next => State::from_index(next as usize),
        }
    }

    /// Token kinds with a transition out of `state`.
    pub fn expected(&self, state: State) -> Vec<TokenKind> {
        ALL_KINDS
            .iter()
            .copied()
            .filter(|&k| self.get(state, k).is_some())
            .collect()
    }

    pub fn rows(&self) -> &[[u16; N_KINDS]] {
        &self.rows
    }

    /// Number of filled cells.
    pub fn filled(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.iter())
            .filter(|&&c| c != ERROR)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_validates_shape_and_cells() {
        let t = build_transition_table();
        assert_eq!(TransitionTable::from_rows(t.rows.clone()).unwrap(), t);

        let short = t.rows[..3].to_vec();
        assert!(matches!(
            TransitionTable::from_rows(short),
            Err(TableError::RowCount { got: 3, .. })
        ));

        let mut bad = t.rows.clone();
        bad[1][2] = N_STATES as u16;
        assert!(matches!(
            TransitionTable::from_rows(bad),
            Err(TableError::BadCell { row: 1, col: 2, .. })
        ));
    }
}
