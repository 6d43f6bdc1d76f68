// src/diagnostic.rs
// User-facing problems, collected per batch and reported together.

use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::lexer::tokens::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Pipeline stage a diagnostic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Io,
    Lexical,
    Syntax,
    Semantic,
    Flag,
    Task,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Io => "io",
            Stage::Lexical => "lexical",
            Stage::Syntax => "syntax",
            Stage::Semantic => "semantic",
            Stage::Flag => "flag",
            Stage::Task => "task",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl From<&Token> for Location {
    fn from(t: &Token) -> Self {
        Self {
            file: t.file.clone(),
            line: t.line,
            column: t.column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub message: String,
    pub at: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    pub message: String,
    /// File the problem belongs to, when there is one.
    pub file: Option<Arc<str>>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub notes: Vec<Note>,
}

impl Diagnostic {
    pub fn error(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            stage,
            message: message.into(),
            file: None,
            line: None,
            column: None,
            notes: Vec::new(),
        }
    }

    pub fn warning(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(stage, message)
        }
    }

    pub fn in_file(mut self, file: impl Into<Arc<str>>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn at_position(mut self, file: Arc<str>, line: u32, column: u32) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn at(self, token: &Token) -> Self {
        self.at_position(token.file.clone(), token.line, token.column)
    }

    pub fn with_note(mut self, message: impl Into<String>, at: Option<Location>) -> Self {
        self.notes.push(Note {
            message: message.into(),
            at,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Sort key: file, then position. Diagnostics without a file go first.
    pub fn sort_key(&self) -> (Option<&str>, u32, u32) {
        (
            self.file.as_deref(),
            self.line.unwrap_or(0),
            self.column.unwrap_or(0),
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line, self.column) {
            (Some(file), Some(line), Some(column)) => write!(f, "{file}:{line}:{column}: ")?,
            (Some(file), _, _) => write!(f, "{file}: ")?,
            _ => {}
        }
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{severity}[{}]: {}", self.stage, self.message)?;
        for note in &self.notes {
            match &note.at {
                Some(at) => write!(f, "\n  = note: {} at {at}", note.message)?,
                None => write!(f, "\n  = note: {}", note.message)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_position_stage_and_notes() {
        let first = Location {
            file: Arc::from("a.src"),
            line: 1,
            column: 5,
        };
        let d = Diagnostic::error(Stage::Semantic, "duplicate declaration of `x`")
            .at_position(Arc::from("b.src"), 3, 5)
            .with_note("first declared", Some(first));
        assert_eq!(
            d.to_string(),
            "b.src:3:5: error[semantic]: duplicate declaration of `x`\n  = note: first declared at a.src:1:5"
        );
    }

    #[test]
    fn file_only_and_bare_forms() {
        let d = Diagnostic::error(Stage::Io, "no such file").in_file("gone.src");
        assert_eq!(d.to_string(), "gone.src: error[io]: no such file");
        let w = Diagnostic::warning(Stage::Flag, "flag `--x` does not exist");
        assert_eq!(w.to_string(), "warning[flag]: flag `--x` does not exist");
        assert!(!w.is_error());
    }
}
