// src/lib.rs
pub mod budget;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod dev;
pub mod diagnostic;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod scheduler;
pub mod semantic;
