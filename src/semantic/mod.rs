// src/semantic/mod.rs
pub mod check;
pub mod symbols;
pub mod types;

pub use check::{Analysis, SemanticAnalyzer};
pub use symbols::{Symbol, SymbolKind, SymbolTable};
pub use types::Type;
