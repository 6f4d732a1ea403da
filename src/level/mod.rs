//! Levels — the numbered grammar supersets of the teaching language.
//!
//! A [`Level`] selects both the grammar the parser accepts
//! ([`grammar::GrammarTable`]) and the generation rules the code generator
//! applies ([`rules::RuleRegistry`]).

pub mod grammar;
pub mod rules;

use std::fmt;

use crate::dsl::error::CompileError;

pub use grammar::{Grammar, GrammarDelta, GrammarTable, Production};
pub use rules::{ConstructKind, GenerationRule, RuleRegistry};

/// A validated level in `[Level::MIN, Level::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u8);

impl Level {
    /// The lowest supported level.
    pub const MIN: Level = Level(1);
    /// The highest supported level.
    pub const MAX: Level = Level(16);

    /// Validate a raw level number.
    pub fn new(raw: u32) -> Result<Self, CompileError> {
        if raw < Self::MIN.0 as u32 || raw > Self::MAX.0 as u32 {
            return Err(CompileError::UnsupportedLevel { level: raw });
        }
        Ok(Level(raw as u8))
    }

    /// The level number.
    pub fn number(self) -> u8 {
        self.0
    }

    /// The level directly below this one, if any.
    pub fn previous(self) -> Option<Level> {
        (self.0 > Self::MIN.0).then(|| Level(self.0 - 1))
    }

    /// Every supported level in ascending order.
    pub fn all() -> impl Iterator<Item = Level> {
        (Self::MIN.0..=Self::MAX.0).map(Level)
    }

    /// Zero-based position of this level in per-level tables.
    pub(crate) fn index(self) -> usize {
        (self.0 - Self::MIN.0) as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}", self.0)
    }
}

impl TryFrom<u32> for Level {
    type Error = CompileError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Level::new(raw)
    }
}
