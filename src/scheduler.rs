// src/scheduler.rs
// One parse task per file on a rayon pool; results come back in input order.

use std::{
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::{
    budget::Budget,
    config::CompilerConfig,
    diagnostic::{Diagnostic, Stage},
    lexer::{KeywordDictionary, LexError, LexErrorKind, Lexer, SourceReader},
    parser::{ParseTree, Parser, SyntaxError, tables::TableSet},
};

/// Built once before any task starts; read-only afterwards.
pub struct Shared {
    pub dictionary: KeywordDictionary,
    pub tables: TableSet,
}

impl Shared {
    pub fn new(tables: TableSet) -> Self {
        Self {
            dictionary: KeywordDictionary::with_keywords(),
            tables,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub file: Arc<str>,
    pub result: Result<ParseTree, Diagnostic>,
    /// Tokens produced, `Eof` included. Zero when lexing failed.
    pub tokens: usize,
}

pub fn file_label(path: &Path) -> Arc<str> {
    Arc::from(path.display().to_string())
}

fn lex_diagnostic(e: LexError) -> Diagnostic {
    let stage = match e.kind {
        LexErrorKind::Read(_) => Stage::Io,
        _ => Stage::Lexical,
    };
    Diagnostic::error(stage, e.kind.to_string()).at_position(e.file, e.line, e.column)
}

fn syntax_diagnostic(e: SyntaxError) -> Diagnostic {
    let message = e.detail();
    match e {
        SyntaxError::Unexpected {
            file, line, column, ..
        }
        | SyntaxError::Inconsistent {
            file, line, column, ..
        } => Diagnostic::error(Stage::Syntax, message).at_position(file, line, column),
        SyntaxError::UnexpectedEnd { file } => {
            Diagnostic::error(Stage::Syntax, message).in_file(file)
        }
    }
}

/// Reader -> lexer -> parser for one file.
pub fn parse_file(
    shared: &Shared,
    path: &Path,
    budget: Budget,
) -> Result<(ParseTree, usize), Diagnostic> {
    let file = file_label(path);
    let reader = SourceReader::open(path).map_err(|e| {
        Diagnostic::error(Stage::Io, format!("cannot open source file: {e}")).in_file(file.clone())
    })?;
    let tokens = Lexer::new(reader, &shared.dictionary, file)
        .with_budget(budget)
        .tokenize()
        .map_err(lex_diagnostic)?;
    let tree = Parser::new(&shared.tables.transition)
        .parse(&tokens)
        .map_err(syntax_diagnostic)?;
    Ok((tree, tokens.len()))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

pub struct Scheduler {
    pool: rayon::ThreadPool,
    shared: Arc<Shared>,
    cancel: Arc<AtomicBool>,
    deadline: Option<Duration>,
}

impl Scheduler {
    pub fn new(config: &CompilerConfig, shared: Arc<Shared>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers.max(1))
            .thread_name(|i| format!("tacc-worker-{i}"))
            .build()
            .context("building the worker pool")?;
        Ok(Self {
            pool,
            shared,
            cancel: Arc::new(AtomicBool::new(false)),
            deadline: config.task_deadline,
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    /// Setting the flag makes every task that has not finished fail at its
    /// next checkpoint.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Runs `op` inside the pool so nested parallel iterators use its workers.
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        self.pool.install(op)
    }

    /// Runs `task(i)` for every index on the pool and waits for all of them.
    /// Output order is index order; a task that panics becomes an error for
    /// its own index only.
    pub fn run<T, F>(&self, n: usize, task: F) -> Vec<Result<T, Diagnostic>>
    where
        T: Send,
        F: Fn(usize, Budget) -> Result<T, Diagnostic> + Sync,
    {
        self.pool.install(|| {
            (0..n)
                .into_par_iter()
                .map(|i| {
                    let budget = Budget::new(self.cancel.clone(), self.deadline);
                    panic::catch_unwind(AssertUnwindSafe(|| task(i, budget))).unwrap_or_else(
                        |payload| {
                            let msg = panic_message(&*payload);
                            log::warn!("[scheduler] task {i} panicked: {msg}");
                            Err(Diagnostic::error(Stage::Task, format!("task failed: {msg}")))
                        },
                    )
                })
                .collect()
        })
    }

    pub fn parse_all(&self, paths: &[PathBuf]) -> Vec<FileOutcome> {
        let start = Instant::now();
        let shared = &self.shared;
        let results = self.run(paths.len(), |i, budget| parse_file(shared, &paths[i], budget));
        let outcomes: Vec<FileOutcome> = paths
            .iter()
            .zip(results)
            .map(|(path, result)| {
                let file = file_label(path);
                let (result, tokens) = match result {
                    Ok((tree, n)) => (Ok(tree), n),
                    Err(d) if d.file.is_none() => (Err(d.in_file(file.clone())), 0),
                    Err(d) => (Err(d), 0),
                };
                FileOutcome {
                    path: path.clone(),
                    file,
                    result,
                    tokens,
                }
            })
            .collect();
        log::debug!(
            "[scheduler] {} files on {} workers in {:.3} ms",
            paths.len(),
            self.workers(),
            start.elapsed().as_secs_f64() * 1e3
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(workers: usize) -> Scheduler {
        let cfg = CompilerConfig {
            workers,
            ..CompilerConfig::default()
        };
        Scheduler::new(&cfg, Arc::new(Shared::new(TableSet::build()))).unwrap()
    }

    #[test]
    fn results_follow_input_order() {
        let s = scheduler(4);
        let out = s.run(64, |i, _| {
            // later indices finish first
            std::thread::sleep(Duration::from_micros(((64 - i) * 50) as u64));
            Ok(i)
        });
        let got: Vec<usize> = out.into_iter().map(Result::unwrap).collect();
        assert_eq!(got, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn one_failing_task_leaves_the_rest_alone() {
        let s = scheduler(3);
        let out = s.run(10, |i, _| {
            if i == 4 {
                panic!("injected");
            }
            if i == 7 {
                return Err(Diagnostic::error(Stage::Io, "injected error"));
            }
            Ok(i * 2)
        });
        for (i, r) in out.iter().enumerate() {
            match i {
                4 => assert!(r.as_ref().unwrap_err().message.contains("injected")),
                7 => assert_eq!(r.as_ref().unwrap_err().message, "injected error"),
                _ => assert_eq!(*r.as_ref().unwrap(), i * 2),
            }
        }
    }

    #[test]
    fn missing_file_is_an_io_diagnostic() {
        let s = scheduler(2);
        let out = s.parse_all(&[PathBuf::from("/nonexistent/tacc/missing.src")]);
        let d = out[0].result.as_ref().unwrap_err();
        assert_eq!(d.stage, Stage::Io);
        assert_eq!(d.file.as_deref(), Some("/nonexistent/tacc/missing.src"));
    }

    #[test]
    fn cancellation_reaches_tasks_through_their_budget() {
        let s = scheduler(2);
        s.cancel_handle().store(true, Ordering::Relaxed);
        assert!(s.is_cancelled());
        let out = s.run(3, |_, budget| {
            budget
                .check()
                .map_err(|e| Diagnostic::error(Stage::Lexical, format!("{e:?}")))
        });
        assert!(out.iter().all(Result::is_err));
    }
}
