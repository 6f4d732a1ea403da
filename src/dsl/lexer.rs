//! Lexer for the teaching language.
//!
//! Splits source text into [`SourceLine`]s, measuring indentation and
//! tokenizing each line on its own. Whether `'` delimits text depends on the
//! level, so the lexer is configured from the active grammar.

use super::error::{ParseError, ParseErrorKind};
use super::token::{Token, TokenKind};

/// Columns a tab advances indentation by.
const TAB_WIDTH: usize = 4;

/// One non-blank source line.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    /// 1-based line number.
    pub number: usize,
    /// Width of the leading whitespace.
    pub indent: usize,
    /// The line without indentation and trailing whitespace.
    pub content: String,
    pub body: LineBody,
}

/// What a line holds.
#[derive(Debug, Clone, PartialEq)]
pub enum LineBody {
    /// Text following `#`, verbatim.
    Comment(String),
    Code(Vec<Token>),
}

impl SourceLine {
    pub fn is_comment(&self) -> bool {
        matches!(self.body, LineBody::Comment(_))
    }

    pub fn tokens(&self) -> &[Token] {
        match &self.body {
            LineBody::Code(tokens) => tokens,
            LineBody::Comment(_) => &[],
        }
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    quoted_text: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, quoted_text: bool) -> Self {
        Self {
            source,
            quoted_text,
        }
    }

    /// Split the source into non-blank lines.
    pub fn lines(&self) -> Result<Vec<SourceLine>, ParseError> {
        let mut lines = Vec::new();

        for (idx, raw) in self.source.lines().enumerate() {
            let number = idx + 1;
            let trimmed = raw.trim_end();
            let content = trimmed.trim_start();
            if content.is_empty() {
                continue;
            }

            let indent = measure_indent(&trimmed[..trimmed.len() - content.len()]);
            let body = match content.strip_prefix('#') {
                Some(comment) => LineBody::Comment(comment.to_string()),
                None => LineBody::Code(self.tokenize(content, number, indent)?),
            };

            lines.push(SourceLine {
                number,
                indent,
                content: content.to_string(),
                body,
            });
        }

        Ok(lines)
    }

    fn tokenize(
        &self,
        content: &str,
        line: usize,
        indent: usize,
    ) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut chars = content.char_indices().peekable();

        while let Some(&(start, ch)) = chars.peek() {
            let col = indent + content[..start].chars().count() + 1;

            if ch.is_whitespace() {
                chars.next();
                continue;
            }

            let kind = if ch == '\'' && self.quoted_text {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '\'' {
                        closed = true;
                        break;
                    }
                    text.push(c);
                }
                if !closed {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedText,
                        line,
                        col,
                        &content[start..],
                    ));
                }
                TokenKind::Text(text)
            } else if is_word_char(ch) {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !is_word_char(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                if word.chars().all(|c| c.is_ascii_digit()) {
                    TokenKind::Number(word)
                } else {
                    TokenKind::Word(word)
                }
            } else {
                chars.next();
                let next = chars.peek().map(|&(_, c)| c);
                match (ch, next) {
                    ('<', Some('=')) => {
                        chars.next();
                        TokenKind::LessEq
                    }
                    ('>', Some('=')) => {
                        chars.next();
                        TokenKind::GreaterEq
                    }
                    ('=', Some('=')) => {
                        chars.next();
                        TokenKind::EqEq
                    }
                    ('<', _) => TokenKind::Less,
                    ('>', _) => TokenKind::Greater,
                    ('+', _) => TokenKind::Plus,
                    ('-', _) => TokenKind::Minus,
                    ('*', _) => TokenKind::Star,
                    ('/', _) => TokenKind::Slash,
                    (',', _) => TokenKind::Comma,
                    (':', _) => TokenKind::Colon,
                    ('(', _) => TokenKind::LParen,
                    (')', _) => TokenKind::RParen,
                    ('[', _) => TokenKind::LBracket,
                    (']', _) => TokenKind::RBracket,
                    (other, _) => TokenKind::Other(other),
                }
            };

            let end = chars.peek().map_or(content.len(), |&(i, _)| i);
            tokens.push(Token {
                kind,
                col,
                start,
                end,
            });
        }

        Ok(tokens)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn measure_indent(whitespace: &str) -> usize {
    whitespace
        .chars()
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str, quoted: bool) -> Vec<TokenKind> {
        let lines = Lexer::new(source, quoted).lines().unwrap();
        lines[0].tokens().iter().map(|t| t.kind.clone()).collect()
    }

    #[test]
    fn lex_assignment_with_arithmetic() {
        assert_eq!(
            kinds("nummer is 4+5", true),
            vec![
                TokenKind::Word("nummer".into()),
                TokenKind::Word("is".into()),
                TokenKind::Number("4".into()),
                TokenKind::Plus,
                TokenKind::Number("5".into()),
            ]
        );
    }

    #[test]
    fn lex_quoted_text_when_enabled() {
        assert_eq!(
            kinds("print 'ik heet' naam", true),
            vec![
                TokenKind::Word("print".into()),
                TokenKind::Text("ik heet".into()),
                TokenKind::Word("naam".into()),
            ]
        );
    }

    #[test]
    fn quotes_are_plain_characters_when_disabled() {
        assert_eq!(
            kinds("print it's", false),
            vec![
                TokenKind::Word("print".into()),
                TokenKind::Word("it".into()),
                TokenKind::Other('\''),
                TokenKind::Word("s".into()),
            ]
        );
    }

    #[test]
    fn lex_comparators_and_brackets() {
        assert_eq!(
            kinds("if a <= b[1] == c", true),
            vec![
                TokenKind::Word("if".into()),
                TokenKind::Word("a".into()),
                TokenKind::LessEq,
                TokenKind::Word("b".into()),
                TokenKind::LBracket,
                TokenKind::Number("1".into()),
                TokenKind::RBracket,
                TokenKind::EqEq,
                TokenKind::Word("c".into()),
            ]
        );
    }

    #[test]
    fn unterminated_text_is_an_error() {
        let err = Lexer::new("print 'hallo", true).lines().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedText);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 7);
    }

    #[test]
    fn measures_indent_and_skips_blank_lines() {
        let lines = Lexer::new("if a is b:\n\n    print(a)   \n\t# note", true)
            .lines()
            .unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].number, 3);
        assert_eq!(lines[1].indent, 4);
        assert_eq!(lines[1].content, "print(a)");
        assert_eq!(lines[2].indent, 4);
        assert_eq!(lines[2].body, LineBody::Comment(" note".into()));
    }

    #[test]
    fn token_offsets_slice_the_content() {
        let lines = Lexer::new("naam is Hedy de Robot", false).lines().unwrap();
        let tokens = lines[0].tokens();
        assert_eq!(&lines[0].content[tokens[2].start..], "Hedy de Robot");
        assert_eq!(tokens[2].col, 9);
    }
}
