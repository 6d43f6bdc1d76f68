// src/parser/tables/io.rs
use std::{
    io::{BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::{ALL_STATES, N_STATES, TableError, TransitionTable, build_transition_table};
use crate::{
    ir::tables::{ALL_GEN_STATES, GenerationTable, build_generation_table},
    lexer::tokens::{ALL_KINDS, N_KINDS},
};

/// Both tables a batch runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSet {
    pub transition: TransitionTable,
    pub generation: GenerationTable,
}

impl TableSet {
    pub fn build() -> Self {
        Self {
            transition: build_transition_table(),
            generation: build_generation_table(),
        }
    }
}

// -------------------- JSON (de)serialization --------------------

// The symbol lists are stored next to the rows so a file generated for a
// different grammar is rejected instead of silently misread.
#[serde_as]
#[derive(Serialize, Deserialize)]
struct TablesDisk {
    kinds: Vec<String>,
    states: Vec<String>,
    gen_states: Vec<String>,
    #[serde_as(as = "Vec<[_; N_KINDS]>")]
    transition: Vec<[u16; N_KINDS]>,
    #[serde_as(as = "Vec<[_; N_STATES]>")]
    generation: Vec<[u16; N_STATES]>,
}

fn names<T: std::fmt::Debug>(all: &[T]) -> Vec<String> {
    all.iter().map(|x| format!("{x:?}")).collect()
}

impl From<&TableSet> for TablesDisk {
    fn from(t: &TableSet) -> Self {
        Self {
            kinds: names(&ALL_KINDS),
            states: names(&ALL_STATES),
            gen_states: names(&ALL_GEN_STATES),
            transition: t.transition.rows.clone(),
            generation: t.generation.rows.clone(),
        }
    }
}

impl TablesDisk {
    fn into_tables(self) -> Result<TableSet, TableError> {
        let checks = [
            ("transition", "token kind", &self.kinds, names(&ALL_KINDS)),
            ("transition", "state", &self.states, names(&ALL_STATES)),
            ("generation", "generation state", &self.gen_states, names(&ALL_GEN_STATES)),
        ];
        for (table, what, stored, current) in checks {
            if *stored != current {
                return Err(TableError::Mismatch { table, what });
            }
        }
        Ok(TableSet {
            transition: TransitionTable::from_rows(self.transition)?,
            generation: GenerationTable::from_rows(self.generation)?,
        })
    }
}

pub fn save_tables_json(path: &Path, t: &TableSet) -> std::io::Result<()> {
    let f = std::fs::File::create(path)?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, &TablesDisk::from(t))?;
    w.flush()
}

pub fn load_tables_json_bytes(data: &[u8]) -> Result<TableSet, TableError> {
    serde_json::from_slice::<TablesDisk>(data)?.into_tables()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_tables_load_back_identical() {
        let dir = std::env::temp_dir().join(format!("tacc_tables_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tables.json");
        let tables = TableSet::build();
        save_tables_json(&path, &tables).unwrap();
        let loaded = load_tables_json_bytes(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(loaded, tables);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn stale_symbol_lists_are_rejected() {
        let mut disk = TablesDisk::from(&TableSet::build());
        disk.states.swap(1, 2);
        let data = serde_json::to_vec(&disk).unwrap();
        assert!(matches!(
            load_tables_json_bytes(&data),
            Err(TableError::Mismatch { what: "state", .. })
        ));
    }

    #[test]
    fn garbage_is_a_json_error() {
        assert!(matches!(
            load_tables_json_bytes(b"{\"kinds\": 3"),
            Err(TableError::Json(_))
        ));
    }
}
