// src/semantic/symbols.rs
use std::sync::Arc;

use hashbrown::{HashMap, hash_map::Entry};
use serde::Serialize;

use super::types::Type;
use crate::{diagnostic::Location, lexer::tokens::Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Type,
    Variable,
    Function,
}

impl SymbolKind {
    pub fn describe(self) -> &'static str {
        match self {
            SymbolKind::Type => "a type",
            SymbolKind::Variable => "a variable",
            SymbolKind::Function => "a function",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    /// `name` at top level, `func::name` for parameters and locals.
    pub name: String,
    pub kind: SymbolKind,
    /// Declared type, alias target or return type. `None` until resolved,
    /// and stays `None` when resolution failed.
    pub ty: Option<Type>,
    /// Parameter types of a function.
    pub params: Vec<Option<Type>>,
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl Symbol {
    pub fn new(name: String, kind: SymbolKind, site: &Token) -> Self {
        Self {
            name,
            kind,
            ty: None,
            params: Vec::new(),
            file: site.file.clone(),
            line: site.line,
            column: site.column,
        }
    }

    pub fn location(&self) -> Location {
        Location {
            file: self.file.clone(),
            line: self.line,
            column: self.column,
        }
    }

    /// Whether `site` is the token this symbol was declared by.
    pub fn is_declared_by(&self, site: &Token) -> bool {
        *self.file == *site.file && self.line == site.line && self.column == site.column
    }
}

pub fn qualified(func: &str, name: &str) -> String {
    format!("{func}::{name}")
}

/// Batch-wide declarations. Mutated only between parallel phases.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    map: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// First declaration wins; a later one gets the existing symbol back.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), &Symbol> {
        match self.map.entry(symbol.name.clone()) {
            Entry::Occupied(e) => Err(&*e.into_mut()),
            Entry::Vacant(e) => {
                e.insert(symbol);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.map.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.map.get_mut(name)
    }

    pub fn local(&self, func: &str, name: &str) -> Option<&Symbol> {
        self.map.get(&qualified(func, name))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Symbols ordered by name.
    pub fn sorted(&self) -> Vec<&Symbol> {
        let mut all: Vec<&Symbol> = self.map.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokens::TokenKind;

    fn site(file: &str, line: u32) -> Token {
        Token::new(TokenKind::Ident, "x", Arc::from(file), line, 5)
    }

    #[test]
    fn first_declaration_wins() {
        let mut table = SymbolTable::new();
        let a = site("a.src", 1);
        let b = site("b.src", 3);
        assert!(table.declare(Symbol::new("x".into(), SymbolKind::Variable, &a)).is_ok());
        let first = table
            .declare(Symbol::new("x".into(), SymbolKind::Function, &b))
            .unwrap_err();
        assert!(first.is_declared_by(&a));
        assert_eq!(table.get("x").unwrap().kind, SymbolKind::Variable);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn locals_are_qualified() {
        let mut table = SymbolTable::new();
        let s = site("a.src", 2);
        table
            .declare(Symbol::new(qualified("main", "x"), SymbolKind::Variable, &s))
            .unwrap();
        assert!(table.local("main", "x").is_some());
        assert!(table.get("x").is_none());
    }
}
