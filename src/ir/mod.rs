// src/ir/mod.rs
pub mod lower;
pub mod tables;
pub mod tac;

pub use lower::{ConfigError, Lowering};
pub use tables::{GenState, GenerationTable, build_generation_table};
pub use tac::{BinaryOp, Instruction, Op, Operand};
