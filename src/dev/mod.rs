// src/dev/mod.rs
// Helpers for tests and benchmarks.
pub mod generator;
