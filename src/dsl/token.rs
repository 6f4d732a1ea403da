//! Token types for the per-line lexer.

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based column in the source line.
    pub col: usize,
    /// Byte offset of the token in the line's content.
    pub start: usize,
    /// Byte offset one past the token in the line's content.
    pub end: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Word(String),
    Number(String),
    Text(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    EqEq,

    // Delimiters
    Comma,
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,

    /// Any other character; meaningful only inside free text.
    Other(char),
}

impl Token {
    /// Whether this token is the bare word `word`.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Word(w) if w == word)
    }
}

impl TokenKind {
    /// Source spelling, used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Word(w) | Self::Number(w) => w.clone(),
            Self::Text(t) => format!("'{t}'"),
            Self::Plus => "+".into(),
            Self::Minus => "-".into(),
            Self::Star => "*".into(),
            Self::Slash => "/".into(),
            Self::Less => "<".into(),
            Self::Greater => ">".into(),
            Self::LessEq => "<=".into(),
            Self::GreaterEq => ">=".into(),
            Self::EqEq => "==".into(),
            Self::Comma => ",".into(),
            Self::Colon => ":".into(),
            Self::LParen => "(".into(),
            Self::RParen => ")".into(),
            Self::LBracket => "[".into(),
            Self::RBracket => "]".into(),
            Self::Other(c) => c.to_string(),
        }
    }
}
