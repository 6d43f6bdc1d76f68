// src/config.rs
// Batch configuration: defaults, then environment, then command-line flags.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};

use crate::parser::tables::{TableSet, load_tables_json_bytes};

/// Treat any value other than "0"/"false" (case-insensitive) as true.
pub fn env_flag_true(var: &str, default: bool) -> bool {
    std::env::var(var)
        .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false")))
        .unwrap_or(default)
}

fn env_u64(var: &str) -> Option<u64> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok())
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Parse tasks running at once.
    pub workers: usize,
    /// Per-file time limit, measured from the moment the task starts.
    pub task_deadline: Option<Duration>,
    /// Load both tables from this JSON file instead of building them.
    pub tables_path: Option<PathBuf>,
    pub emit_json: bool,
    pub dump_tokens: bool,
    pub dump_tree: bool,
    pub check_only: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            task_deadline: None,
            tables_path: None,
            emit_json: false,
            dump_tokens: false,
            dump_tree: false,
            check_only: false,
        }
    }
}

impl CompilerConfig {
    /// Defaults overridden by `TACC_WORKERS`, `TACC_DEADLINE_MS`,
    /// `TACC_TABLES` and `TACC_SEQUENTIAL`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(n) = env_u64("TACC_WORKERS").filter(|&n| n > 0) {
            cfg.workers = n as usize;
        }
        if env_flag_true("TACC_SEQUENTIAL", false) {
            cfg.workers = 1;
        }
        cfg.task_deadline = env_u64("TACC_DEADLINE_MS").map(Duration::from_millis);
        cfg.tables_path = std::env::var("TACC_TABLES").ok().map(PathBuf::from);
        cfg
    }

    /// Builds the shipped tables, or loads and validates the configured file.
    pub fn load_tables(&self) -> Result<TableSet> {
        let Some(path) = &self.tables_path else {
            return Ok(TableSet::build());
        };
        let data = std::fs::read(path)
            .with_context(|| format!("reading tables from {}", path.display()))?;
        let tables = load_tables_json_bytes(&data)
            .with_context(|| format!("loading tables from {}", path.display()))?;
        log::info!("[config] loaded tables from {}", path.display());
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_tables_in_memory() {
        let cfg = CompilerConfig::default();
        assert!(cfg.workers >= 1);
        assert_eq!(cfg.load_tables().unwrap(), TableSet::build());
    }

    #[test]
    fn unreadable_table_file_is_an_error() {
        let cfg = CompilerConfig {
            tables_path: Some(PathBuf::from("/nonexistent/tacc/tables.json")),
            ..CompilerConfig::default()
        };
        let err = cfg.load_tables().unwrap_err();
        assert!(format!("{err:#}").contains("reading tables"));
    }
}
