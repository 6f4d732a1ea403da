//! Per-compile generation state.

use super::error::CompileError;

/// Output spaces per block depth.
const INDENT: &str = "  ";

/// What kind of block the generator is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    TopLevel,
    InsideIf,
    InsideElse,
    InsideFor,
}

/// Block stack, output buffer and name counter for one compile call.
#[derive(Debug, Default)]
pub struct GenerationContext {
    stack: Vec<BlockState>,
    lines: Vec<String>,
    counter: usize,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current block depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn state(&self) -> BlockState {
        self.stack.last().copied().unwrap_or(BlockState::TopLevel)
    }

    pub fn enter(&mut self, state: BlockState) {
        self.stack.push(state);
    }

    /// Close the innermost block.
    pub fn leave(&mut self) -> Result<BlockState, CompileError> {
        self.stack
            .pop()
            .ok_or_else(|| CompileError::undefined("block stack underflow"))
    }

    /// Append a line at the current depth.
    pub fn emit(&mut self, line: impl AsRef<str>) {
        let mut out = INDENT.repeat(self.depth());
        out.push_str(line.as_ref());
        self.lines.push(out);
    }

    /// A temporary name that has not been handed out before.
    pub fn fresh_name(&mut self, base: &str) -> String {
        self.counter += 1;
        format!("{base}_{}", self.counter)
    }

    /// The generated code; fails if any block was left open.
    pub fn finish(self) -> Result<String, CompileError> {
        if !self.stack.is_empty() {
            return Err(CompileError::undefined(format!(
                "{} block(s) left open",
                self.stack.len()
            )));
        }
        Ok(self.lines.join("\n"))
    }
}
