//! Level Grammar Table — cumulative per-level grammars.
//!
//! Level N's grammar is level N-1's grammar plus a declared [`GrammarDelta`].
//! Narrowing only happens through the delta's explicit `overridden` and
//! `removed` lists, so every breaking change between two levels can be
//! read straight off [`LEVEL_DELTAS`].

use std::collections::BTreeSet;

use super::Level;
use crate::dsl::error::CompileError;

/// A production (or terminal pattern) a grammar may enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Production {
    /// `# free text` on its own line.
    Comment,
    /// `print <free text>`.
    PrintText,
    /// `print <free text>` with assigned variable names substituted.
    PrintWords,
    /// `print 'text' var 'text'`.
    PrintPieces,
    /// `print('text' var)`.
    PrintCall,
    /// `ask <free text>`, answer stored in `answer`.
    Ask,
    /// `echo <free text>`.
    Echo,
    /// `forward <amount>`.
    Forward,
    /// `turn [left|right] [<angle>]`.
    Turn,
    /// `name is <value>`.
    Assign,
    /// `name is ask <free text>`.
    AskAssign,
    /// `name is ask 'prompt'`.
    AskQuoted,
    /// `name is input('prompt')`.
    InputCall,
    /// `a, b, c` as a list value.
    CommaList,
    /// `['a', 'b']` as a list value.
    BracketList,
    /// `list at random`.
    AtRandom,
    /// `'quoted text'` terminals.
    QuotedText,
    /// `if a is b <command> [else <command>]`.
    If,
    /// `if a in list`.
    InList,
    /// `+ - * /` over values.
    Arithmetic,
    /// `repeat n times <command>`.
    Repeat,
    /// Block headers followed by an indented body.
    IndentedBlocks,
    /// Block constructs inside block bodies.
    NestedBlocks,
    /// `for i in range a to b`.
    ForRangeTo,
    /// `<`, `>`, `<=`, `>=` in conditions.
    Relational,
    /// `elif <condition>`.
    Elif,
    /// Block headers end in `:`.
    ColonBlocks,
    /// `list[i]` and `list[random]`.
    IndexAccess,
    /// `true` / `false` in any casing.
    BooleanLiteral,
    /// `==` as an equality operator.
    DoubleEquals,
    /// `and` / `or` between conditions.
    LogicalOperators,
    /// `for i in range(a, b)`.
    ForRangeCall,
}

/// The change a level makes to the grammar of the level below it.
#[derive(Debug, Clone, Copy)]
pub struct GrammarDelta {
    /// Productions new at this level.
    pub added: &'static [Production],
    /// Total replacements: the first production is dropped and the second
    /// takes its place.
    pub overridden: &'static [(Production, Production)],
    /// Productions no longer accepted at this level.
    pub removed: &'static [Production],
}

impl GrammarDelta {
    const fn add(added: &'static [Production]) -> Self {
        Self {
            added,
            overridden: &[],
            removed: &[],
        }
    }

    /// Productions whose programs may stop parsing at this level.
    pub fn breaking(&self) -> impl Iterator<Item = Production> + '_ {
        self.overridden
            .iter()
            .map(|(old, _)| *old)
            .chain(self.removed.iter().copied())
    }
}

use Production::*;

/// The declared delta for every level, indexed by `level - 1`.
pub const LEVEL_DELTAS: [GrammarDelta; 16] = [
    // 1
    GrammarDelta::add(&[Comment, PrintText, Ask, Echo, Forward, Turn]),
    // 2
    GrammarDelta {
        added: &[Assign, AskAssign, CommaList, AtRandom],
        overridden: &[(PrintText, PrintWords)],
        removed: &[Ask, Echo],
    },
    // 3
    GrammarDelta {
        added: &[QuotedText],
        overridden: &[(PrintWords, PrintPieces), (AskAssign, AskQuoted)],
        removed: &[],
    },
    // 4
    GrammarDelta::add(&[If, InList]),
    // 5
    GrammarDelta::add(&[Arithmetic]),
    // 6
    GrammarDelta::add(&[Repeat]),
    // 7
    GrammarDelta::add(&[IndentedBlocks]),
    // 8
    GrammarDelta::add(&[NestedBlocks]),
    // 9
    GrammarDelta::add(&[ForRangeTo]),
    // 10
    GrammarDelta::add(&[Relational]),
    // 11
    GrammarDelta::add(&[Elif]),
    // 12
    GrammarDelta {
        added: &[],
        overridden: &[(IndentedBlocks, ColonBlocks)],
        removed: &[],
    },
    // 13
    GrammarDelta {
        added: &[],
        overridden: &[(PrintPieces, PrintCall), (AskQuoted, InputCall)],
        removed: &[],
    },
    // 14
    GrammarDelta {
        added: &[IndexAccess],
        overridden: &[(CommaList, BracketList)],
        removed: &[],
    },
    // 15
    GrammarDelta::add(&[BooleanLiteral, DoubleEquals]),
    // 16
    GrammarDelta::add(&[LogicalOperators, ForRangeCall]),
];

/// The immutable grammar of a single level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    level: Level,
    productions: BTreeSet<Production>,
}

impl Grammar {
    /// The level this grammar belongs to.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Whether the grammar accepts `production`.
    pub fn allows(&self, production: Production) -> bool {
        self.productions.contains(&production)
    }

    /// All enabled productions, in declaration order.
    pub fn productions(&self) -> impl Iterator<Item = Production> + '_ {
        self.productions.iter().copied()
    }

    /// Whether source indentation opens and closes blocks.
    pub fn indentation_significant(&self) -> bool {
        self.allows(IndentedBlocks) || self.allows(ColonBlocks)
    }

    /// Whether quotes delimit text terminals instead of being plain characters.
    pub fn quoted_text(&self) -> bool {
        self.allows(QuotedText)
    }
}

/// Every level's grammar, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct GrammarTable {
    grammars: Vec<Grammar>,
}

impl GrammarTable {
    /// Revision of the level definitions in [`LEVEL_DELTAS`].
    pub const VERSION: u32 = 1;

    /// Compose every level's grammar from the declared deltas.
    pub fn build() -> Result<Self, CompileError> {
        let mut grammars: Vec<Grammar> = Vec::with_capacity(LEVEL_DELTAS.len());
        let mut productions = BTreeSet::new();

        for (level, delta) in Level::all().zip(LEVEL_DELTAS.iter()) {
            apply_delta(&mut productions, level, delta)?;
            grammars.push(Grammar {
                level,
                productions: productions.clone(),
            });
        }

        log::debug!(
            "built grammar table v{} with {} levels",
            Self::VERSION,
            grammars.len()
        );
        Ok(Self { grammars })
    }

    /// The grammar for `level`.
    pub fn grammar_for(&self, level: Level) -> &Grammar {
        &self.grammars[level.index()]
    }

    /// Productions declared as breaking at `level`.
    pub fn breaking_changes(level: Level) -> Vec<Production> {
        LEVEL_DELTAS[level.index()].breaking().collect()
    }
}

fn apply_delta(
    productions: &mut BTreeSet<Production>,
    level: Level,
    delta: &GrammarDelta,
) -> Result<(), CompileError> {
    for (old, new) in delta.overridden {
        if !productions.remove(old) {
            return Err(CompileError::undefined(format!(
                "{level} overrides {old:?}, which is not defined below it"
            )));
        }
        if !productions.insert(*new) {
            return Err(CompileError::undefined(format!(
                "{level} overrides {old:?} with already defined {new:?}"
            )));
        }
    }
    for removed in delta.removed {
        if !productions.remove(removed) {
            return Err(CompileError::undefined(format!(
                "{level} removes {removed:?}, which is not defined below it"
            )));
        }
    }
    for added in delta.added {
        if !productions.insert(*added) {
            return Err(CompileError::undefined(format!(
                "{level} adds {added:?}, which is already defined"
            )));
        }
    }
    Ok(())
}
