//! Level Rule Registry — maps `(construct, level)` to a generation rule.
//!
//! Rules are declared at the level that introduces or changes them. A lookup
//! walks down from the requested level and returns the nearest declaration;
//! a declaration at a higher level replaces the inherited rule outright.

use std::collections::BTreeMap;

use super::grammar::Production;
use super::{GrammarTable, Level};
use crate::dsl::error::CompileError;

/// The kinds of construct the generator emits code for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstructKind {
    Print,
    Ask,
    Echo,
    Movement,
    Comment,
    Assign,
    RandomPick,
    List,
    Equality,
    Membership,
    Arithmetic,
    Relational,
    Logical,
    Conditional,
    Repeat,
    Loop,
    Index,
}

/// How `print` arguments become a target `print(...)` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintRule {
    /// The whole argument is literal text.
    Text,
    /// Words naming an assigned variable are substituted, the rest is text.
    Words,
    /// Quoted pieces are text, every other piece is an expression.
    Pieces,
}

/// How an assigned value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignRule {
    /// Scalars as quoted text, lists, input and random picks.
    Literal,
    /// `Literal` plus integer-coerced arithmetic.
    Coerced,
    /// `Coerced` plus booleans and index access.
    Typed,
}

/// How an equality test is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualityRule {
    /// `a == 'b'`.
    Plain,
    /// `str(a) == str('b')`.
    Stringified,
    /// Stringified unless both sides are boolean-valued.
    BoolAware,
}

/// How list literal elements are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListRule {
    /// Every element quoted as text.
    Textual,
    /// Each element rendered by its own value kind.
    Classified,
}

/// A generation rule, one variant per construct kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationRule {
    Print(PrintRule),
    /// `answer = input('...')`.
    AskImplicitAnswer,
    /// `print('...'+answer)`.
    EchoAppendAnswer,
    /// Movement call followed by a pause of `pause` seconds.
    MovementAnimated { pause: &'static str },
    CommentVerbatim,
    Assign(AssignRule),
    /// `name=random.choice(list)`.
    RandomChoice,
    List(ListRule),
    Equality(EqualityRule),
    /// `a in list`.
    MembershipContains,
    /// `int(a) + int(b)`, `/` as floor division.
    ArithmeticIntCoerced,
    /// `int(a) < int(b)`.
    RelationalIntCoerced,
    /// `and` / `or` short-circuit operators.
    LogicalShortCircuit,
    /// `if:` / `elif:` / `else:` blocks.
    ConditionalBlocks,
    /// `for _ in range(int(n)):`.
    RepeatCounted,
    /// Runtime step computation, inclusive end bound.
    LoopStepped,
    /// `list[i-1]`.
    IndexOneBased,
}

use ConstructKind as K;
use GenerationRule as R;

/// Rule declarations: `(construct, level, rule)`.
const DECLARATIONS: &[(ConstructKind, u8, GenerationRule)] = &[
    (K::Print, 1, R::Print(PrintRule::Text)),
    (K::Print, 2, R::Print(PrintRule::Words)),
    (K::Print, 3, R::Print(PrintRule::Pieces)),
    (K::Ask, 1, R::AskImplicitAnswer),
    (K::Echo, 1, R::EchoAppendAnswer),
    (K::Movement, 1, R::MovementAnimated { pause: "0.1" }),
    (K::Comment, 1, R::CommentVerbatim),
    (K::Assign, 2, R::Assign(AssignRule::Literal)),
    (K::Assign, 5, R::Assign(AssignRule::Coerced)),
    (K::Assign, 14, R::Assign(AssignRule::Typed)),
    (K::RandomPick, 2, R::RandomChoice),
    (K::List, 2, R::List(ListRule::Textual)),
    (K::List, 14, R::List(ListRule::Classified)),
    (K::Equality, 4, R::Equality(EqualityRule::Plain)),
    (K::Equality, 5, R::Equality(EqualityRule::Stringified)),
    (K::Equality, 15, R::Equality(EqualityRule::BoolAware)),
    (K::Membership, 4, R::MembershipContains),
    (K::Conditional, 4, R::ConditionalBlocks),
    (K::Arithmetic, 5, R::ArithmeticIntCoerced),
    (K::Repeat, 6, R::RepeatCounted),
    (K::Loop, 9, R::LoopStepped),
    (K::Relational, 10, R::RelationalIntCoerced),
    (K::Index, 14, R::IndexOneBased),
    (K::Logical, 16, R::LogicalShortCircuit),
];

impl Production {
    /// Constructs that need a generation rule once this production is enabled.
    pub fn constructs(self) -> &'static [ConstructKind] {
        match self {
            Production::Comment => &[K::Comment],
            Production::PrintText
            | Production::PrintWords
            | Production::PrintPieces
            | Production::PrintCall => &[K::Print],
            Production::Ask => &[K::Ask],
            Production::Echo => &[K::Echo],
            Production::Forward | Production::Turn => &[K::Movement],
            Production::Assign
            | Production::AskAssign
            | Production::AskQuoted
            | Production::InputCall => &[K::Assign],
            Production::CommaList | Production::BracketList => &[K::List],
            Production::AtRandom => &[K::RandomPick],
            Production::If => &[K::Conditional, K::Equality],
            Production::InList => &[K::Membership],
            Production::Arithmetic => &[K::Arithmetic],
            Production::Repeat => &[K::Repeat],
            Production::ForRangeTo | Production::ForRangeCall => &[K::Loop],
            Production::Relational => &[K::Relational],
            Production::Elif => &[K::Conditional],
            Production::IndexAccess => &[K::Index, K::RandomPick],
            Production::BooleanLiteral | Production::DoubleEquals => &[K::Equality],
            Production::LogicalOperators => &[K::Logical],
            Production::QuotedText
            | Production::IndentedBlocks
            | Production::NestedBlocks
            | Production::ColonBlocks => &[],
        }
    }
}

/// Inheritance-with-override lookup over the rule declarations.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: BTreeMap<(ConstructKind, u8), GenerationRule>,
}

impl RuleRegistry {
    /// Build the registry and check that no enabled construct lacks a rule.
    pub fn build(grammars: &GrammarTable) -> Result<Self, CompileError> {
        let mut rules = BTreeMap::new();
        for &(kind, level, rule) in DECLARATIONS {
            if rules.insert((kind, level), rule).is_some() {
                return Err(CompileError::undefined(format!(
                    "{kind:?} declared twice at level {level}"
                )));
            }
        }
        let registry = Self { rules };

        for level in Level::all() {
            for production in grammars.grammar_for(level).productions() {
                for &kind in production.constructs() {
                    registry.rule_for(kind, level)?;
                }
            }
        }
        Ok(registry)
    }

    /// The rule for `kind` at `level`, inherited from the nearest lower level
    /// that declares one.
    pub fn rule_for(
        &self,
        kind: ConstructKind,
        level: Level,
    ) -> Result<GenerationRule, CompileError> {
        self.rules
            .range((kind, Level::MIN.number())..=(kind, level.number()))
            .next_back()
            .map(|(_, rule)| *rule)
            .ok_or_else(|| CompileError::undefined(format!("no {kind:?} rule at {level}")))
    }
}
