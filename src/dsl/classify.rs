//! Semantic classifier — value kinds and the program's assigned names.

use std::collections::HashMap;

use super::ast::{Expr, ExprKind, Program, Stmt, StmtKind, ValueKind};

/// Name level 1 `ask` stores its answer in.
pub const ANSWER: &str = "answer";

/// Derive the value kind of an expression from its shape.
pub fn classify(kind: &ExprKind) -> ValueKind {
    match kind {
        ExprKind::Text(_) => ValueKind::StringLiteral,
        ExprKind::Number(_) => ValueKind::NumericLiteral,
        ExprKind::Bool(_) => ValueKind::BooleanLiteral,
        ExprKind::Var(_) => ValueKind::VariableReference,
        ExprKind::List(_) => ValueKind::ListLiteral,
        ExprKind::RandomPick(_) => ValueKind::RandomPick,
        ExprKind::Index { .. } => ValueKind::IndexAccess,
        ExprKind::Arith { .. } => ValueKind::BinaryArithmetic,
        ExprKind::Compare { .. } => ValueKind::BinaryComparison,
        ExprKind::Logic { .. } => ValueKind::LogicalCombination,
    }
}

/// Parse a boolean spelling in any casing.
pub fn parse_bool(word: &str) -> Option<bool> {
    if word.eq_ignore_ascii_case("true") {
        Some(true)
    } else if word.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Every name the program assigns, and whether it only ever holds booleans.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    names: HashMap<String, bool>,
}

impl SymbolTable {
    /// Collect assignments from the whole program, at any depth.
    pub fn collect(program: &Program) -> Self {
        let mut table = Self::default();
        table.visit(&program.statements);
        table
    }

    fn visit(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Assign { name, value } => {
                    self.record(name, value.value_kind == ValueKind::BooleanLiteral)
                }
                StmtKind::Input { name, .. } => self.record(name, false),
                StmtKind::For { var, .. } => self.record(var, false),
                StmtKind::Ask(_) => self.record(ANSWER, false),
                _ => {}
            }
            for body in stmt.bodies() {
                self.visit(body);
            }
        }
    }

    fn record(&mut self, name: &str, boolean: bool) {
        self.names
            .entry(name.to_string())
            .and_modify(|all_bool| *all_bool &= boolean)
            .or_insert(boolean);
    }

    /// Whether the program assigns `name` anywhere.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Whether `expr` is a boolean literal or a variable only ever assigned
    /// boolean literals.
    pub fn is_boolean(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Bool(_) => true,
            ExprKind::Var(name) => self.names.get(name).copied().unwrap_or(false),
            _ => false,
        }
    }
}
