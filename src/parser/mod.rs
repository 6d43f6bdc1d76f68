// src/parser/mod.rs
pub mod driver;
pub mod tables;
pub mod tree;

pub use driver::{Parser, SyntaxError};
pub use tables::{State, TransitionTable};
pub use tree::{Expr, Item, MalformedTree, Node, ParseTree, Stmt};
