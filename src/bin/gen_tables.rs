// src/bin/gen_tables.rs
// Build the parser transition table and the generation table, write both to JSON.
// Usage:
//   cargo run --bin gen_tables                # writes tables/tacc_tables.json
//   cargo run --bin gen_tables -- /path/out.json
// Point TACC_TABLES at the file to run the compiler from it.

use std::{env, fs, path::Path};

use tacc::{
    ir::tables::N_GEN_STATES,
    lexer::N_KINDS,
    parser::tables::{N_STATES, TableSet, save_tables_json},
};

fn main() {
    let out = env::args()
        .nth(1)
        .unwrap_or_else(|| "tables/tacc_tables.json".to_string());
    let out_path = Path::new(&out);

    if let Some(parent) = out_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("error: failed to create {}: {e}", parent.display());
            std::process::exit(1);
        }
    }

    println!("[gen_tables] building tables…");
    let t = TableSet::build();

    println!(
        "[gen_tables] transition: {} states x {} kinds, {} entries filled",
        N_STATES,
        N_KINDS,
        t.transition.filled()
    );
    println!(
        "[gen_tables] generation: {} states x {} node kinds, {} entries filled",
        N_GEN_STATES,
        N_STATES,
        t.generation.filled()
    );

    if let Err(e) = save_tables_json(out_path, &t) {
        eprintln!("error: failed to write {}: {e}", out_path.display());
        std::process::exit(1);
    }
    println!("[gen_tables] wrote {}", out_path.display());
}
