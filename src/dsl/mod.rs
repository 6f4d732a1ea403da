//! Compiler pipeline: source text + level → lines → tree → target code.

pub mod ast;
pub mod classify;
pub mod compile;
pub mod context;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use error::{CompileError, ParseError, ParseErrorKind};

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::level::{GrammarTable, Level, RuleRegistry};
use compile::compile_program;
use lexer::Lexer;
use parser::Parser;

/// Built-in grammar table and rule registry, validated on first use.
static BUILTIN: Lazy<Result<(GrammarTable, RuleRegistry), CompileError>> = Lazy::new(|| {
    let grammars = GrammarTable::build()?;
    let rules = RuleRegistry::build(&grammars)?;
    Ok((grammars, rules))
});

/// Generated code plus whether it drives the turtle canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileResult {
    pub code: String,
    pub uses_graphics: bool,
}

/// The compiler.
///
/// Borrows an immutable grammar table and rule registry, so one pair can
/// serve any number of concurrent compiles.
#[derive(Debug, Clone, Copy)]
pub struct Transpiler<'t> {
    grammars: &'t GrammarTable,
    rules: &'t RuleRegistry,
}

impl<'t> Transpiler<'t> {
    pub fn new(grammars: &'t GrammarTable, rules: &'t RuleRegistry) -> Self {
        Self { grammars, rules }
    }

    /// A transpiler over the process-wide built-in tables.
    pub fn builtin() -> Result<Transpiler<'static>, CompileError> {
        match &*BUILTIN {
            Ok((grammars, rules)) => Ok(Transpiler::new(grammars, rules)),
            Err(err) => Err(err.clone()),
        }
    }

    /// Parse source text into a Program at `level`.
    pub fn parse(&self, source: &str, level: Level) -> Result<Program, CompileError> {
        let grammar = self.grammars.grammar_for(level);
        let lines = Lexer::new(source, grammar.quoted_text()).lines()?;
        log::debug!("parsing {} line(s) at {level}", lines.len());
        let program = Parser::new(grammar, &lines).parse()?;
        Ok(program)
    }

    /// Parse and generate target code.
    pub fn transpile(&self, source: &str, level: u32) -> Result<CompileResult, CompileError> {
        let level = Level::new(level)?;
        let result = self.parse(source, level).and_then(|program| {
            let code = compile_program(&program, level, self.rules)?;
            Ok(CompileResult {
                code,
                uses_graphics: program.uses_graphics(),
            })
        });

        match &result {
            Ok(out) => log::debug!(
                "compiled {} line(s) at {level}, graphics: {}",
                out.code.lines().count(),
                out.uses_graphics
            ),
            Err(err) => log::debug!("compile failed at {level}: {err}"),
        }
        result
    }
}

/// Compile `source` at `level` with the built-in tables.
pub fn transpile(source: &str, level: u32) -> Result<CompileResult, CompileError> {
    Transpiler::builtin()?.transpile(source, level)
}
