//! Hedyc — a compiler for a graduated, level-based teaching language.

pub mod config;
pub mod dsl;
pub mod level;

pub use dsl::{transpile, CompileError, CompileResult, Transpiler};
pub use level::Level;
