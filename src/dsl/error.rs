//! Error types for the compiler.

use std::fmt;

use thiserror::Error;

/// Why a line failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The first word of a line is not a command at this level.
    UnknownCommand,
    /// A token that does not fit the construct being parsed.
    UnexpectedToken,
    /// A command ended before a required argument.
    MissingArgument,
    /// A quote was opened but never closed on the same line.
    UnterminatedText,
    /// A line is indented where no block was opened.
    UnexpectedIndentation,
    /// A dedent that does not return to any enclosing block's indentation.
    InconsistentIndentation,
    /// A block header without a body.
    MissingBlock,
    /// `else` or `elif` without a preceding `if`.
    ElseWithoutIf,
    /// A block construct inside a block body below the nesting level.
    NestingNotAllowed,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UnknownCommand => "unknown command",
            Self::UnexpectedToken => "unexpected token",
            Self::MissingArgument => "missing argument",
            Self::UnterminatedText => "unterminated text",
            Self::UnexpectedIndentation => "unexpected indentation",
            Self::InconsistentIndentation => "inconsistent indentation",
            Self::MissingBlock => "missing block",
            Self::ElseWithoutIf => "else without if",
            Self::NestingNotAllowed => "nesting not allowed",
        };
        f.write_str(text)
    }
}

/// Source text that does not match the active level's grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{line}:{column}] {kind}: '{text}'{}", hint(.expected))]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub kind: ParseErrorKind,
    /// The offending source text.
    pub text: String,
    /// The construct that was expected, where known.
    pub expected: Option<&'static str>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, column: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            column,
            kind,
            text: text.into(),
            expected: None,
        }
    }

    /// Attach the construct that was expected.
    pub fn expecting(mut self, construct: &'static str) -> Self {
        self.expected = Some(construct);
        self
    }
}

fn hint(expected: &Option<&'static str>) -> String {
    expected.map_or_else(String::new, |e| format!(" (expected {e})"))
}

/// An error returned by [`crate::transpile`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The requested level is outside the supported range.
    #[error("unsupported level {level}")]
    UnsupportedLevel { level: u32 },
    /// The source does not parse at the requested level.
    #[error("parse error {0}")]
    Parse(#[from] ParseError),
    /// An internal invariant was violated; a defect, not a user error.
    #[error("internal error: {detail}")]
    UndefinedBehavior { detail: String },
}

impl CompileError {
    pub(crate) fn undefined(detail: impl Into<String>) -> Self {
        Self::UndefinedBehavior {
            detail: detail.into(),
        }
    }

    /// The source line the error points at, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse(err) => Some(err.line),
            _ => None,
        }
    }
}
