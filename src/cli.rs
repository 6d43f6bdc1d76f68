// src/cli.rs
// Command-line surface: arguments starting with `-` are flags, the rest are
// source files.

use std::{fmt, path::PathBuf};

use crate::{
    config::CompilerConfig,
    diagnostic::{Diagnostic, Stage},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFlag {
    EmitJson,
    DumpTokens,
    DumpTree,
    Sequential,
    Check,
}

pub const FLAGS: &[(&str, RuntimeFlag, &str)] = &[
    ("--emit-json", RuntimeFlag::EmitJson, "print the batch output as JSON"),
    ("--dump-tokens", RuntimeFlag::DumpTokens, "log each file's token count"),
    ("--dump-tree", RuntimeFlag::DumpTree, "print each parse tree"),
    ("--sequential", RuntimeFlag::Sequential, "use one worker thread"),
    ("--check", RuntimeFlag::Check, "stop after semantic analysis"),
];

impl RuntimeFlag {
    pub fn lookup(arg: &str) -> Option<Self> {
        FLAGS
            .iter()
            .find(|(text, _, _)| *text == arg)
            .map(|&(_, flag, _)| flag)
    }

    pub fn apply(self, cfg: &mut CompilerConfig) {
        match self {
            RuntimeFlag::EmitJson => cfg.emit_json = true,
            RuntimeFlag::DumpTokens => cfg.dump_tokens = true,
            RuntimeFlag::DumpTree => cfg.dump_tree = true,
            RuntimeFlag::Sequential => cfg.workers = 1,
            RuntimeFlag::Check => cfg.check_only = true,
        }
    }
}

/// An argument that looked like a flag but names none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagDiagnostic {
    pub flag: String,
}

impl fmt::Display for FlagDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flag `{}` does not exist", self.flag)
    }
}

impl From<&FlagDiagnostic> for Diagnostic {
    fn from(d: &FlagDiagnostic) -> Self {
        Diagnostic::warning(Stage::Flag, d.to_string())
    }
}

/// Resolves flag arguments. Unknown ones are logged and skipped.
pub fn raise_flags<S: AsRef<str>>(args: &[S]) -> (Vec<RuntimeFlag>, Vec<FlagDiagnostic>) {
    let mut flags = Vec::new();
    let mut unknown = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        match RuntimeFlag::lookup(arg) {
            Some(flag) => flags.push(flag),
            None => {
                let d = FlagDiagnostic {
                    flag: arg.to_string(),
                };
                log::warn!("{d}");
                unknown.push(d);
            }
        }
    }
    (flags, unknown)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    pub flags: Vec<RuntimeFlag>,
    pub files: Vec<PathBuf>,
    pub unknown: Vec<FlagDiagnostic>,
}

impl Invocation {
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let (flag_args, files): (Vec<&str>, Vec<&str>) = args
            .iter()
            .map(AsRef::as_ref)
            .partition(|a| a.starts_with('-'));
        let (flags, unknown) = raise_flags(&flag_args);
        Self {
            flags,
            files: files.into_iter().map(PathBuf::from).collect(),
            unknown,
        }
    }

    pub fn configure(&self, mut cfg: CompilerConfig) -> CompilerConfig {
        for flag in &self.flags {
            flag.apply(&mut cfg);
        }
        cfg
    }
}

pub fn usage() -> String {
    let mut s = String::from("usage: tacc [flags] <file>...\n\nflags:\n");
    for (text, _, help) in FLAGS {
        s.push_str(&format!("  {text:<14} {help}\n"));
    }
    s
}
