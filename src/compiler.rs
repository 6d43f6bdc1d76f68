// src/compiler.rs
// Batch pipeline: parse every file on the pool, analyze the batch as a whole,
// then lower each tree when the batch is clean.

use std::{path::PathBuf, sync::Arc, time::Instant};

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::{
    cli::Invocation,
    config::CompilerConfig,
    diagnostic::Diagnostic,
    ir::{ConfigError, Instruction, Lowering},
    scheduler::{Scheduler, Shared},
    semantic::SemanticAnalyzer,
};

/// Everything the batch produced for one input file.
#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: Arc<str>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub instructions: Vec<Instruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<String>,
}

impl FileReport {
    fn new(file: Arc<str>) -> Self {
        Self {
            file,
            diagnostics: Vec::new(),
            instructions: Vec::new(),
            tree: None,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Reports in input order, plus diagnostics that belong to no file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutput {
    pub reports: Vec<FileReport>,
    pub batch_diagnostics: Vec<Diagnostic>,
}

impl BatchOutput {
    pub fn has_errors(&self) -> bool {
        self.batch_diagnostics.iter().any(Diagnostic::is_error)
            || self.reports.iter().any(FileReport::has_errors)
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.batch_diagnostics
            .iter()
            .chain(self.reports.iter().flat_map(|r| r.diagnostics.iter()))
    }

    pub fn report(&self, file: &str) -> Option<&FileReport> {
        self.reports.iter().find(|r| r.file.as_ref() == file)
    }

    pub fn render_text(&self) -> String {
        let mut s = String::new();
        for d in &self.batch_diagnostics {
            s.push_str(&format!("{d}\n"));
        }
        for r in &self.reports {
            if let Some(tree) = &r.tree {
                s.push_str(&format!("== {} (tree) ==\n{tree}", r.file));
            }
            for d in &r.diagnostics {
                s.push_str(&format!("{d}\n"));
            }
            if !r.instructions.is_empty() {
                s.push_str(&format!("== {} ==\n", r.file));
                for ins in &r.instructions {
                    s.push_str(&format!("    {ins}\n"));
                }
            }
        }
        s
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub struct Compiler {
    config: CompilerConfig,
    scheduler: Scheduler,
}

impl Compiler {
    /// Builds or loads the tables once; every batch shares them.
    pub fn new(config: CompilerConfig) -> Result<Self> {
        let shared = Arc::new(Shared::new(config.load_tables()?));
        Self::with_shared(config, shared)
    }

    pub fn with_shared(config: CompilerConfig, shared: Arc<Shared>) -> Result<Self> {
        let scheduler = Scheduler::new(&config, shared)?;
        Ok(Self { config, scheduler })
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Per-file problems end up in the reports; only a broken table is
    /// returned as an error.
    pub fn compile(&self, paths: &[PathBuf]) -> Result<BatchOutput, ConfigError> {
        let start = Instant::now();
        let outcomes = self.scheduler.parse_all(paths);

        let mut reports: Vec<FileReport> = outcomes
            .iter()
            .map(|o| {
                let mut report = FileReport::new(o.file.clone());
                match &o.result {
                    Ok(tree) => {
                        if self.config.dump_tokens {
                            log::info!("[tokens] {}: {} tokens", o.file, o.tokens);
                        }
                        if self.config.dump_tree {
                            report.tree = Some(tree.to_string());
                        }
                    }
                    Err(d) => report.diagnostics.push(d.clone()),
                }
                report
            })
            .collect();

        let analysis = SemanticAnalyzer::analyze(&outcomes);
        let clean = analysis.is_valid();
        let mut batch_diagnostics = Vec::new();
        for (d, origin) in analysis.diagnostics.into_iter().zip(analysis.origins) {
            match reports.get_mut(origin) {
                Some(report) => report.diagnostics.push(d),
                None => batch_diagnostics.push(d),
            }
        }
        for r in &mut reports {
            r.diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        }

        if clean && !self.config.check_only {
            let generation = &self.scheduler.shared().tables.generation;
            let lowering = Lowering::new(generation, &analysis.symbols);
            let code: Vec<Option<Vec<Instruction>>> = self.scheduler.install(|| {
                outcomes
                    .par_iter()
                    .map(|o| o.result.as_ref().ok().map(|t| lowering.lower(t)).transpose())
                    .collect::<Result<Vec<_>, ConfigError>>()
            })?;
            for (report, instructions) in reports.iter_mut().zip(code) {
                report.instructions = instructions.unwrap_or_default();
            }
        } else if !clean {
            log::info!("[compiler] semantic errors, lowering skipped for the batch");
        }

        log::debug!(
            "[compiler] {} files in {:.3} ms",
            paths.len(),
            start.elapsed().as_secs_f64() * 1e3
        );
        Ok(BatchOutput {
            reports,
            batch_diagnostics,
        })
    }
}

/// Applies the invocation's flags to `base` and compiles its files. Unknown
/// flags come back as warnings in the batch diagnostics.
pub fn compile_invocation(
    invocation: &Invocation,
    base: CompilerConfig,
) -> Result<(CompilerConfig, BatchOutput)> {
    let config = invocation.configure(base);
    let compiler = Compiler::new(config.clone())?;
    let mut output = compiler.compile(&invocation.files)?;
    let mut warnings: Vec<Diagnostic> = invocation.unknown.iter().map(Diagnostic::from).collect();
    warnings.append(&mut output.batch_diagnostics);
    output.batch_diagnostics = warnings;
    Ok((config, output))
}

pub fn compile_args<S: AsRef<str>>(args: &[S], base: CompilerConfig) -> Result<BatchOutput> {
    let invocation = Invocation::from_args(args);
    compile_invocation(&invocation, base).map(|(_, output)| output)
}
