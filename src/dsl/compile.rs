//! Code generator — renders a [`Program`] as target source text.
//!
//! Every construct looks up its [`GenerationRule`] for the active level and
//! renders accordingly; the generator itself holds no per-level branching.
//! Bare words are resolved against the program's [`SymbolTable`], so the
//! same word renders as a variable or as quoted text depending on whether
//! the program ever assigns it.

use super::ast::*;
use super::classify::{SymbolTable, ANSWER};
use super::context::{BlockState, GenerationContext};
use super::error::CompileError;
use crate::level::rules::{AssignRule, EqualityRule, ListRule, PrintRule};
use crate::level::{ConstructKind, GenerationRule, Level, RuleRegistry};

use ConstructKind as K;
use GenerationRule as R;

/// Distance `forward` moves without an argument.
const DEFAULT_DISTANCE: &str = "50";
/// Angle `turn` rotates without an argument.
const DEFAULT_ANGLE: &str = "90";
/// Conventional loop step name.
const STEP: &str = "step";

/// Compile a Program into target source text.
pub fn compile_program(
    program: &Program,
    level: Level,
    rules: &RuleRegistry,
) -> Result<String, CompileError> {
    let generator = Generator {
        level,
        rules,
        symbols: SymbolTable::collect(program),
    };
    let mut ctx = GenerationContext::new();
    generator.generate(&program.statements, &mut ctx)?;
    ctx.finish()
}

struct Generator<'a> {
    level: Level,
    rules: &'a RuleRegistry,
    symbols: SymbolTable,
}

impl Generator<'_> {
    fn rule(&self, kind: ConstructKind) -> Result<GenerationRule, CompileError> {
        self.rules.rule_for(kind, self.level)
    }

    fn generate(&self, stmts: &[Stmt], ctx: &mut GenerationContext) -> Result<(), CompileError> {
        for stmt in stmts {
            self.statement(stmt, ctx)?;
        }
        Ok(())
    }

    fn body(
        &self,
        state: BlockState,
        stmts: &[Stmt],
        ctx: &mut GenerationContext,
    ) -> Result<(), CompileError> {
        ctx.enter(state);
        self.generate(stmts, ctx)?;
        ctx.leave()?;
        Ok(())
    }

    fn statement(&self, stmt: &Stmt, ctx: &mut GenerationContext) -> Result<(), CompileError> {
        match &stmt.kind {
            StmtKind::Comment(text) => match self.rule(K::Comment)? {
                R::CommentVerbatim => ctx.emit(format!("#{text}")),
                other => return Err(mismatch(K::Comment, other)),
            },
            StmtKind::Print(args) => ctx.emit(self.print(args)?),
            StmtKind::Ask(text) => match self.rule(K::Ask)? {
                R::AskImplicitAnswer => ctx.emit(format!("{ANSWER} = input({})", quote(text))),
                other => return Err(mismatch(K::Ask, other)),
            },
            StmtKind::Echo(text) => match self.rule(K::Echo)? {
                R::EchoAppendAnswer => match text {
                    Some(text) => ctx.emit(format!("print({}+{ANSWER})", quote(text))),
                    None => ctx.emit(format!("print({ANSWER})")),
                },
                other => return Err(mismatch(K::Echo, other)),
            },
            StmtKind::Forward(amount) => {
                let R::MovementAnimated { pause } = self.rule(K::Movement)? else {
                    return Err(CompileError::undefined("no movement rule"));
                };
                let amount = self.magnitude(amount.as_ref(), DEFAULT_DISTANCE)?;
                ctx.emit(format!("t.forward({amount})"));
                ctx.emit(format!("time.sleep({pause})"));
            }
            StmtKind::Turn { direction, angle } => {
                self.rule(K::Movement)?;
                let angle = self.magnitude(angle.as_ref(), DEFAULT_ANGLE)?;
                let call = match direction {
                    Direction::Left => "left",
                    Direction::Right => "right",
                };
                ctx.emit(format!("t.{call}({angle})"));
            }
            StmtKind::Assign { name, value } => ctx.emit(self.assign(name, value)?),
            StmtKind::Input { name, prompt } => {
                self.rule(K::Assign)?;
                ctx.emit(format!("{name} = input({})", quote(prompt)));
            }
            StmtKind::If {
                branches,
                otherwise,
            } => {
                let rule = self.rule(K::Conditional)?;
                if rule != R::ConditionalBlocks {
                    return Err(mismatch(K::Conditional, rule));
                }
                for (i, branch) in branches.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { "elif" };
                    ctx.emit(format!("{keyword} {}:", self.condition(&branch.condition)?));
                    self.body(BlockState::InsideIf, &branch.body, ctx)?;
                }
                if let Some(body) = otherwise {
                    ctx.emit("else:");
                    self.body(BlockState::InsideElse, body, ctx)?;
                }
            }
            StmtKind::Repeat { times, body } => match self.rule(K::Repeat)? {
                R::RepeatCounted => {
                    ctx.emit(format!("for _ in range({}):", self.int_operand(times)?));
                    self.body(BlockState::InsideFor, body, ctx)?;
                }
                other => return Err(mismatch(K::Repeat, other)),
            },
            StmtKind::For {
                var,
                start,
                end,
                body,
            } => match self.rule(K::Loop)? {
                R::LoopStepped => {
                    let step = if self.symbols.contains(STEP) {
                        ctx.fresh_name(STEP)
                    } else {
                        STEP.to_string()
                    };
                    let start = self.int_operand(start)?;
                    let end = self.int_operand(end)?;
                    ctx.emit(format!("{step} = 1 if {start} < {end} else -1"));
                    ctx.emit(format!(
                        "for {var} in range({start}, {end} + {step}, {step}):"
                    ));
                    self.body(BlockState::InsideFor, body, ctx)?;
                }
                other => return Err(mismatch(K::Loop, other)),
            },
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    fn print(&self, args: &PrintArgs) -> Result<String, CompileError> {
        let R::Print(rule) = self.rule(K::Print)? else {
            return Err(CompileError::undefined("no print rule"));
        };
        let parts = match (rule, args) {
            (PrintRule::Text, PrintArgs::Text(text)) => vec![quote(text)],
            (PrintRule::Words, PrintArgs::Pieces(pieces)) => self.print_words(pieces)?,
            (PrintRule::Pieces, PrintArgs::Pieces(pieces)) => pieces
                .iter()
                .map(|piece| self.print_piece(piece))
                .collect::<Result<_, _>>()?,
            _ => {
                return Err(CompileError::undefined(format!(
                    "{rule:?} print cannot render {args:?}"
                )))
            }
        };
        Ok(format!("print({})", parts.join("+")))
    }

    /// Substitute words naming assigned variables; everything else is text.
    fn print_words(&self, pieces: &[PrintPiece]) -> Result<Vec<String>, CompileError> {
        let mut parts = Vec::new();
        let mut literal = String::new();

        for piece in pieces {
            match piece {
                PrintPiece::Text(text) => literal.push_str(text),
                PrintPiece::Expr(expr) => match &expr.kind {
                    ExprKind::Var(name) if !self.symbols.contains(name) => literal.push_str(name),
                    _ => {
                        if !literal.is_empty() {
                            parts.push(quote(&std::mem::take(&mut literal)));
                        }
                        parts.push(format!("str({})", self.value(expr)?));
                    }
                },
            }
        }
        if !literal.is_empty() || parts.is_empty() {
            parts.push(quote(&literal));
        }
        Ok(parts)
    }

    fn print_piece(&self, piece: &PrintPiece) -> Result<String, CompileError> {
        match piece {
            PrintPiece::Text(text) => Ok(quote(text)),
            PrintPiece::Expr(Expr {
                kind: ExprKind::Number(n),
                ..
            }) => Ok(quote(n)),
            PrintPiece::Expr(expr) => Ok(format!("str({})", self.value(expr)?)),
        }
    }

    fn assign(&self, name: &str, value: &Expr) -> Result<String, CompileError> {
        let R::Assign(rule) = self.rule(K::Assign)? else {
            return Err(CompileError::undefined("no assignment rule"));
        };

        let line = match (&value.kind, rule) {
            (ExprKind::Text(raw) | ExprKind::Number(raw) | ExprKind::Var(raw), _) => {
                format!("{name} = {}", quote(raw))
            }
            (ExprKind::List(items), _) => format!("{name} = {}", self.list(items)?),
            (ExprKind::RandomPick(_), _) => format!("{name}={}", self.value(value)?),
            (ExprKind::Arith { .. }, AssignRule::Coerced | AssignRule::Typed) => {
                format!("{name} = {}", self.value(value)?)
            }
            (ExprKind::Index { .. } | ExprKind::Bool(_), AssignRule::Typed) => {
                let sep = if matches!(value.kind, ExprKind::Index { .. }) { "=" } else { " = " };
                format!("{name}{sep}{}", self.value(value)?)
            }
            _ => {
                return Err(CompileError::undefined(format!(
                    "{rule:?} assignment cannot render {:?}",
                    value.value_kind
                )))
            }
        };
        Ok(line)
    }

    fn magnitude(&self, expr: Option<&Expr>, default: &str) -> Result<String, CompileError> {
        match expr {
            None => Ok(default.to_string()),
            Some(expr) => self.value(expr),
        }
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    /// An expression in value position.
    fn value(&self, expr: &Expr) -> Result<String, CompileError> {
        match &expr.kind {
            ExprKind::Text(text) => Ok(quote(text)),
            ExprKind::Number(n) => Ok(n.clone()),
            ExprKind::Bool(b) => Ok(boolean(*b).to_string()),
            ExprKind::Var(name) => Ok(name.clone()),
            ExprKind::List(items) => self.list(items),
            ExprKind::RandomPick(list) => match self.rule(K::RandomPick)? {
                R::RandomChoice => Ok(format!("random.choice({})", self.value(list)?)),
                other => Err(mismatch(K::RandomPick, other)),
            },
            ExprKind::Index { list, index } => match self.rule(K::Index)? {
                R::IndexOneBased => Ok(format!("{}[{}-1]", self.value(list)?, self.value(index)?)),
                other => Err(mismatch(K::Index, other)),
            },
            ExprKind::Arith { op, lhs, rhs } => match self.rule(K::Arithmetic)? {
                R::ArithmeticIntCoerced => Ok(format!(
                    "{} {} {}",
                    self.int_operand(lhs)?,
                    arith_symbol(*op),
                    self.int_operand(rhs)?
                )),
                other => Err(mismatch(K::Arithmetic, other)),
            },
            ExprKind::Compare { .. } | ExprKind::Logic { .. } => Err(CompileError::undefined(
                format!("condition in value position at column {}", expr.col),
            )),
        }
    }

    /// An operand coerced to an integer; nested arithmetic is already one.
    fn int_operand(&self, expr: &Expr) -> Result<String, CompileError> {
        match &expr.kind {
            ExprKind::Arith { .. } => self.value(expr),
            ExprKind::Bool(_) => Err(CompileError::undefined("boolean arithmetic operand")),
            _ => Ok(format!("int({})", self.value(expr)?)),
        }
    }

    fn list(&self, items: &[Expr]) -> Result<String, CompileError> {
        let R::List(rule) = self.rule(K::List)? else {
            return Err(CompileError::undefined("no list rule"));
        };
        let rendered = items
            .iter()
            .map(|item| match (&item.kind, rule) {
                (
                    ExprKind::Text(raw) | ExprKind::Number(raw) | ExprKind::Var(raw),
                    ListRule::Textual,
                ) => Ok(quote(raw)),
                (ExprKind::Var(raw), ListRule::Classified) => Ok(quote(raw)),
                (_, ListRule::Classified) => self.value(item),
                (_, ListRule::Textual) => Err(CompileError::undefined(format!(
                    "textual list cannot hold {:?}",
                    item.value_kind
                ))),
            })
            .collect::<Result<Vec<_>, CompileError>>()?;
        Ok(format!("[{}]", rendered.join(", ")))
    }

    /// A bare operand inside a condition: unassigned words and numbers are text.
    fn condition_operand(&self, expr: &Expr) -> Result<String, CompileError> {
        match &expr.kind {
            ExprKind::Var(name) if self.symbols.contains(name) => Ok(name.clone()),
            ExprKind::Var(raw) | ExprKind::Number(raw) => Ok(quote(raw)),
            _ => self.value(expr),
        }
    }

    fn condition(&self, expr: &Expr) -> Result<String, CompileError> {
        match &expr.kind {
            ExprKind::Logic { op, lhs, rhs } => match self.rule(K::Logical)? {
                R::LogicalShortCircuit => {
                    let op = match op {
                        LogicOp::And => "and",
                        LogicOp::Or => "or",
                    };
                    Ok(format!("{} {op} {}", self.condition(lhs)?, self.condition(rhs)?))
                }
                other => Err(mismatch(K::Logical, other)),
            },
            ExprKind::Compare { op, lhs, rhs } => self.comparison(*op, lhs, rhs),
            _ => Err(CompileError::undefined(format!(
                "{:?} is not a condition",
                expr.value_kind
            ))),
        }
    }

    fn comparison(&self, op: CompareOp, lhs: &Expr, rhs: &Expr) -> Result<String, CompileError> {
        let left = self.condition_operand(lhs)?;
        let right = self.condition_operand(rhs)?;

        let symbol = match op {
            CompareOp::Eq => {
                let R::Equality(rule) = self.rule(K::Equality)? else {
                    return Err(CompileError::undefined("no equality rule"));
                };
                let stringify = match rule {
                    EqualityRule::Plain => false,
                    EqualityRule::Stringified => true,
                    EqualityRule::BoolAware => {
                        !(self.symbols.is_boolean(lhs) && self.symbols.is_boolean(rhs))
                    }
                };
                return Ok(if stringify {
                    format!("str({left}) == str({right})")
                } else {
                    format!("{left} == {right}")
                });
            }
            CompareOp::In => {
                return match self.rule(K::Membership)? {
                    R::MembershipContains => Ok(format!("{left} in {}", self.value(rhs)?)),
                    other => Err(mismatch(K::Membership, other)),
                };
            }
            CompareOp::Less => "<",
            CompareOp::Greater => ">",
            CompareOp::LessEq => "<=",
            CompareOp::GreaterEq => ">=",
        };

        match self.rule(K::Relational)? {
            R::RelationalIntCoerced => Ok(format!("int({left}) {symbol} int({right})")),
            other => Err(mismatch(K::Relational, other)),
        }
    }
}

fn mismatch(kind: ConstructKind, rule: GenerationRule) -> CompileError {
    CompileError::undefined(format!("{rule:?} cannot render {kind:?}"))
}

fn arith_symbol(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "+",
        ArithOp::Sub => "-",
        ArithOp::Mul => "*",
        ArithOp::Div => "//",
    }
}

fn boolean(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Single-quoted target string literal.
pub(crate) fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
