//! Parse tree for the teaching language.
//!
//! Both block styles (inline clauses and indented bodies) parse into the
//! same shapes: every conditional and loop carries an explicit ordered body.

use super::classify::classify;

/// A complete program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// A statement with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
    pub col: usize,
}

/// The kind of statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Text after `#`, verbatim.
    Comment(String),
    Print(PrintArgs),
    /// Level 1 `ask`: the answer lands in `answer`.
    Ask(String),
    /// Level 1 `echo`, with optional leading text.
    Echo(Option<String>),
    /// `forward <amount>`; no amount means the default distance.
    Forward(Option<Expr>),
    Turn {
        direction: Direction,
        angle: Option<Expr>,
    },
    Assign {
        name: String,
        value: Expr,
    },
    /// `name is ask 'prompt'` / `name is input('prompt')`.
    Input {
        name: String,
        prompt: String,
    },
    If {
        /// The `if` branch followed by any `elif` branches.
        branches: Vec<Branch>,
        otherwise: Option<Vec<Stmt>>,
    },
    Repeat {
        times: Expr,
        body: Vec<Stmt>,
    },
    For {
        var: String,
        start: Expr,
        end: Expr,
        body: Vec<Stmt>,
    },
}

/// Arguments to `print`.
#[derive(Debug, Clone, PartialEq)]
pub enum PrintArgs {
    /// Everything after `print` as literal text.
    Text(String),
    /// An ordered mixture of literal text and expressions.
    Pieces(Vec<PrintPiece>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrintPiece {
    Text(String),
    Expr(Expr),
}

/// A guarded body of an `if` or `elif`.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// An expression, carrying the value kind derived from its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub value_kind: ValueKind,
    pub col: usize,
}

impl Expr {
    pub fn new(kind: ExprKind, col: usize) -> Self {
        let value_kind = classify(&kind);
        Self {
            kind,
            value_kind,
            col,
        }
    }
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Text(String),
    /// Digits with an optional leading `-`.
    Number(String),
    Bool(bool),
    Var(String),
    List(Vec<Expr>),
    RandomPick(Box<Expr>),
    Index {
        list: Box<Expr>,
        index: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logic {
        op: LogicOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Closed set of value kinds used to pick coercions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    StringLiteral,
    NumericLiteral,
    BooleanLiteral,
    VariableReference,
    ListLiteral,
    RandomPick,
    IndexAccess,
    BinaryArithmetic,
    BinaryComparison,
    LogicalCombination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    /// List membership.
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

impl Stmt {
    /// Whether this statement opens a block.
    pub fn is_block(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::If { .. } | StmtKind::Repeat { .. } | StmtKind::For { .. }
        )
    }

    /// Nested statement bodies, in source order.
    pub fn bodies(&self) -> Vec<&[Stmt]> {
        match &self.kind {
            StmtKind::If {
                branches,
                otherwise,
            } => branches
                .iter()
                .map(|b| b.body.as_slice())
                .chain(otherwise.as_deref())
                .collect(),
            StmtKind::Repeat { body, .. } | StmtKind::For { body, .. } => vec![body.as_slice()],
            _ => Vec::new(),
        }
    }
}

impl Program {
    /// Whether any statement, at any depth, moves or turns the turtle.
    pub fn uses_graphics(&self) -> bool {
        fn any_movement(stmts: &[Stmt]) -> bool {
            stmts.iter().any(|s| {
                matches!(s.kind, StmtKind::Forward(_) | StmtKind::Turn { .. })
                    || s.bodies().into_iter().any(any_movement)
            })
        }
        any_movement(&self.statements)
    }
}
