//! Parser for the teaching language.
//!
//! Parses lexed lines into the [`Program`] tree under the active level's
//! [`Grammar`]. Inline clauses (`if a is b print a else print b`) and
//! indented bodies produce the same shapes, so the generator never sees
//! which block style the source used.

use super::ast::*;
use super::classify::parse_bool;
use super::error::{ParseError, ParseErrorKind};
use super::lexer::{LineBody, SourceLine};
use super::token::{Token, TokenKind};
use crate::level::{Grammar, Production};

/// Deepest block or expression nesting a program may use.
pub const MAX_NESTING: usize = 64;

const NUMBER: &str = "number";
const NESTING_LIMIT: &str = "at most 64 nested levels";

/// Position within the tokens of one line.
struct Cursor<'s> {
    line: &'s SourceLine,
    tokens: &'s [Token],
    pos: usize,
    /// Treat a bare `else` as the end of the line (inline `if` clauses).
    stop_at_else: bool,
}

impl<'s> Cursor<'s> {
    fn new(line: &'s SourceLine) -> Self {
        Self {
            line,
            tokens: line.tokens(),
            pos: 0,
            stop_at_else: false,
        }
    }

    fn peek(&self) -> Option<&'s Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'s Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&'s Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(t) => self.stop_at_else && t.is_word("else"),
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        !self.at_end() && self.peek().is_some_and(|t| &t.kind == kind)
    }

    fn check_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_word(word))
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if !self.at_end() && self.check_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Raw source text from the current token to the end of the clause.
    fn rest_text(&mut self) -> String {
        let start = self.peek().map_or(self.line.content.len(), |t| t.start);
        while !self.at_end() {
            self.pos += 1;
        }
        let end = self.peek().map_or(self.line.content.len(), |t| t.start);
        self.line.content[start..end].trim().to_string()
    }

    fn col(&self) -> usize {
        self.peek()
            .map_or(self.line.indent + self.line.content.chars().count() + 1, |t| t.col)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        let text = match self.peek() {
            Some(t) if !self.at_end() => t.kind.describe(),
            _ => self.line.content.clone(),
        };
        let kind = match (kind, self.at_end()) {
            (ParseErrorKind::UnexpectedToken, true) => ParseErrorKind::MissingArgument,
            (kind, _) => kind,
        };
        ParseError::new(kind, self.line.number, self.col(), text)
    }

    fn expect(&mut self, kind: TokenKind, construct: &'static str) -> Result<(), ParseError> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.error(ParseErrorKind::UnexpectedToken).expecting(construct))
        }
    }

    fn expect_word(&mut self, word: &str, construct: &'static str) -> Result<(), ParseError> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(self.error(ParseErrorKind::UnexpectedToken).expecting(construct))
        }
    }

    fn expect_name(&mut self, construct: &'static str) -> Result<String, ParseError> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Word(name)) if !self.at_end() => {
                self.pos += 1;
                Ok(name.clone())
            }
            _ => Err(self.error(ParseErrorKind::UnexpectedToken).expecting(construct)),
        }
    }

    fn expect_text(&mut self, construct: &'static str) -> Result<String, ParseError> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Text(text)) if !self.at_end() => {
                self.pos += 1;
                Ok(text.clone())
            }
            _ => Err(self.error(ParseErrorKind::UnexpectedToken).expecting(construct)),
        }
    }
}

pub struct Parser<'s> {
    grammar: &'s Grammar,
    lines: &'s [SourceLine],
    pos: usize,
    /// Depth of the expression currently being built.
    nesting: usize,
}

impl<'s> Parser<'s> {
    pub fn new(grammar: &'s Grammar, lines: &'s [SourceLine]) -> Self {
        Self {
            grammar,
            lines,
            pos: 0,
            nesting: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let statements = self.parse_block(0, 0)?;
        Ok(Program { statements })
    }

    fn allows(&self, production: Production) -> bool {
        self.grammar.allows(production)
    }

    /// Count one more level of expression nesting.
    fn descend(&mut self, cur: &Cursor<'s>) -> Result<(), ParseError> {
        if self.nesting >= MAX_NESTING {
            return Err(cur.error(ParseErrorKind::NestingNotAllowed).expecting(NESTING_LIMIT));
        }
        self.nesting += 1;
        Ok(())
    }

    /// Parse an expression used as a number: counts, bounds, indexes and
    /// relational operands.
    fn numeric_operand(&mut self, cur: &mut Cursor<'s>) -> Result<Expr, ParseError> {
        let expr = self.parse_expr(cur)?;
        reject_boolean(&expr, cur.line.number)?;
        Ok(expr)
    }

    /// Index of the next non-comment line at or after `self.pos`.
    fn next_code_line(&self) -> Option<usize> {
        (self.pos..self.lines.len()).find(|&i| !self.lines[i].is_comment())
    }

    /// Consume comment lines up to `until` as statements.
    fn take_comments(&mut self, until: usize, into: &mut Vec<Stmt>) {
        let lines = self.lines;
        while self.pos < until {
            let line = &lines[self.pos];
            if let LineBody::Comment(text) = &line.body {
                into.push(Stmt {
                    kind: StmtKind::Comment(text.clone()),
                    line: line.number,
                    col: line.indent + 1,
                });
            }
            self.pos += 1;
        }
    }

    /// Parse the statements of a block whose lines sit at `indent`.
    fn parse_block(&mut self, indent: usize, depth: usize) -> Result<Vec<Stmt>, ParseError> {
        let lines = self.lines;
        let mut stmts: Vec<Stmt> = Vec::new();

        loop {
            let Some(next) = self.next_code_line() else {
                // Trailing comments belong to the innermost block they reach.
                while self.pos < lines.len() && (depth == 0 || lines[self.pos].indent >= indent) {
                    self.take_comments(self.pos + 1, &mut stmts);
                }
                return Ok(stmts);
            };

            let line = &lines[next];
            if line.indent < indent {
                return Ok(stmts);
            }
            if line.indent > indent {
                let kind = if stmts.last().is_some_and(Stmt::is_block) {
                    ParseErrorKind::InconsistentIndentation
                } else {
                    ParseErrorKind::UnexpectedIndentation
                };
                return Err(ParseError::new(kind, line.number, line.indent + 1, &line.content));
            }

            self.take_comments(next, &mut stmts);
            self.pos = next + 1;
            let stmt = self.parse_line(line, depth)?;
            log::trace!("line {}: {:?}", line.number, stmt.kind);
            stmts.push(stmt);
        }
    }

    fn parse_line(&mut self, line: &'s SourceLine, depth: usize) -> Result<Stmt, ParseError> {
        let mut cur = Cursor::new(line);
        let stmt = self.parse_command(&mut cur, depth)?;
        if cur.peek().is_some() {
            return Err(cur.error(ParseErrorKind::UnexpectedToken));
        }
        Ok(stmt)
    }

    fn parse_command(&mut self, cur: &mut Cursor<'s>, depth: usize) -> Result<Stmt, ParseError> {
        let Some(first) = cur.peek().filter(|_| !cur.at_end()) else {
            return Err(cur.error(ParseErrorKind::MissingArgument).expecting("command"));
        };
        let line = cur.line.number;
        let col = first.col;
        let word = match &first.kind {
            TokenKind::Word(w) => w.as_str(),
            _ => return Err(cur.error(ParseErrorKind::UnknownCommand)),
        };

        let is_block = match word {
            "if" => self.allows(Production::If),
            "repeat" => self.allows(Production::Repeat),
            "for" => self.allows(Production::ForRangeTo) || self.allows(Production::ForRangeCall),
            _ => false,
        };
        if is_block && depth > 0 && !self.allows(Production::NestedBlocks) {
            return Err(cur.error(ParseErrorKind::NestingNotAllowed));
        }

        let kind = match word {
            "print" => {
                cur.advance();
                StmtKind::Print(self.parse_print(cur)?)
            }
            "ask" if self.allows(Production::Ask) => {
                cur.advance();
                StmtKind::Ask(cur.rest_text())
            }
            "echo" if self.allows(Production::Echo) => {
                cur.advance();
                let text = cur.rest_text();
                StmtKind::Echo((!text.is_empty()).then_some(text))
            }
            "forward" => {
                cur.advance();
                let amount = if cur.at_end() {
                    None
                } else {
                    Some(self.parse_movement_amount(cur)?)
                };
                StmtKind::Forward(amount)
            }
            "turn" => {
                cur.advance();
                self.parse_turn(cur)?
            }
            "if" if is_block => self.parse_if(cur, depth)?,
            "repeat" if is_block => self.parse_repeat(cur, depth)?,
            "for" if is_block => self.parse_for(cur, depth)?,
            "else" | "elif" if self.allows(Production::If) => {
                return Err(cur.error(ParseErrorKind::ElseWithoutIf));
            }
            _ if self.allows(Production::Assign)
                && cur.peek_at(1).is_some_and(|t| t.is_word("is")) =>
            {
                self.parse_assignment(cur)?
            }
            _ => return Err(cur.error(ParseErrorKind::UnknownCommand)),
        };

        Ok(Stmt { kind, line, col })
    }

    // ---------------------------------------------------------------------
    // Output, input and movement
    // ---------------------------------------------------------------------

    fn parse_print(&mut self, cur: &mut Cursor<'s>) -> Result<PrintArgs, ParseError> {
        if self.allows(Production::PrintText) {
            return Ok(PrintArgs::Text(cur.rest_text()));
        }
        if self.allows(Production::PrintWords) {
            let col = cur.col();
            let text = cur.rest_text();
            return Ok(PrintArgs::Pieces(self.split_words(&text, col)));
        }
        if self.allows(Production::PrintCall) {
            cur.expect(TokenKind::LParen, "print(...)")?;
            let pieces = self.parse_print_pieces(cur, true)?;
            cur.expect(TokenKind::RParen, ")")?;
            return Ok(PrintArgs::Pieces(pieces));
        }
        Ok(PrintArgs::Pieces(self.parse_print_pieces(cur, false)?))
    }

    fn parse_print_pieces(
        &mut self,
        cur: &mut Cursor<'s>,
        parenthesized: bool,
    ) -> Result<Vec<PrintPiece>, ParseError> {
        let mut pieces = Vec::new();
        while !cur.at_end() && !(parenthesized && cur.check(&TokenKind::RParen)) {
            if let Some(TokenKind::Text(text)) = cur.peek().map(|t| &t.kind) {
                cur.advance();
                pieces.push(PrintPiece::Text(text.clone()));
            } else {
                pieces.push(PrintPiece::Expr(self.parse_expr(cur)?));
            }
        }
        Ok(pieces)
    }

    /// Split free text into literal runs and candidate variable names.
    fn split_words(&self, text: &str, col: usize) -> Vec<PrintPiece> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(ch) = rest.chars().next() {
            if !(ch.is_alphanumeric() || ch == '_') {
                literal.push(ch);
                rest = &rest[ch.len_utf8()..];
                continue;
            }
            let len = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            let word = &rest[..len];
            rest = &rest[len..];

            if word.chars().all(|c| c.is_ascii_digit()) {
                literal.push_str(word);
                continue;
            }
            if !literal.is_empty() {
                pieces.push(PrintPiece::Text(std::mem::take(&mut literal)));
            }
            let var = Expr::new(ExprKind::Var(word.to_string()), col);
            match strip_at_random(rest).filter(|_| self.allows(Production::AtRandom)) {
                Some(after) => {
                    rest = after;
                    let pick = ExprKind::RandomPick(Box::new(var));
                    pieces.push(PrintPiece::Expr(Expr::new(pick, col)));
                }
                None => pieces.push(PrintPiece::Expr(var)),
            }
        }
        if !literal.is_empty() {
            pieces.push(PrintPiece::Text(literal));
        }
        pieces
    }

    fn parse_movement_amount(&mut self, cur: &mut Cursor<'s>) -> Result<Expr, ParseError> {
        let amount = self.numeric_operand(cur)?;
        if amount.value_kind == ValueKind::VariableReference && !self.allows(Production::Assign) {
            return Err(not_a_number(&amount, cur.line.number));
        }
        Ok(amount)
    }

    fn parse_turn(&mut self, cur: &mut Cursor<'s>) -> Result<StmtKind, ParseError> {
        let direction = if cur.eat_word("left") {
            Direction::Left
        } else {
            cur.eat_word("right");
            Direction::Right
        };
        let angle = if cur.at_end() {
            None
        } else {
            Some(self.parse_movement_amount(cur)?)
        };
        Ok(StmtKind::Turn { direction, angle })
    }

    // ---------------------------------------------------------------------
    // Assignment
    // ---------------------------------------------------------------------

    fn parse_assignment(&mut self, cur: &mut Cursor<'s>) -> Result<StmtKind, ParseError> {
        let name = cur.expect_name("variable name")?;
        cur.expect_word("is", "is")?;
        if cur.at_end() {
            return Err(cur.error(ParseErrorKind::MissingArgument).expecting("value"));
        }

        if cur.check_word("ask") {
            if self.allows(Production::AskAssign) {
                cur.advance();
                return Ok(StmtKind::Input {
                    name,
                    prompt: cur.rest_text(),
                });
            }
            if self.allows(Production::AskQuoted) {
                cur.advance();
                let prompt = cur.expect_text("'prompt'")?;
                return Ok(StmtKind::Input { name, prompt });
            }
            return Err(cur.error(ParseErrorKind::UnexpectedToken).expecting("input(...)"));
        }
        if self.allows(Production::InputCall)
            && cur.check_word("input")
            && cur.peek_at(1).is_some_and(|t| t.kind == TokenKind::LParen)
        {
            cur.advance();
            cur.advance();
            let prompt = cur.expect_text("'prompt'")?;
            cur.expect(TokenKind::RParen, ")")?;
            return Ok(StmtKind::Input { name, prompt });
        }

        let value = self.parse_value(cur)?;
        Ok(StmtKind::Assign { name, value })
    }

    /// A structured value where the clause forms one, otherwise free text.
    fn parse_value(&mut self, cur: &mut Cursor<'s>) -> Result<Expr, ParseError> {
        let col = cur.col();
        let start = cur.pos;
        let tokens = cur.tokens;
        let clause_end = (start..tokens.len())
            .find(|&i| cur.stop_at_else && tokens[i].is_word("else"))
            .unwrap_or(tokens.len());
        let clause = &tokens[start..clause_end];

        if self.allows(Production::CommaList) && clause.iter().any(|t| t.kind == TokenKind::Comma) {
            let text = cur.rest_text();
            return self.comma_list(&text, cur, col);
        }
        if self.allows(Production::BracketList) && !cur.check(&TokenKind::LBracket) {
            if let Some(offset) = clause.iter().position(|t| t.kind == TokenKind::Comma) {
                cur.pos = start + offset;
                return Err(cur.error(ParseErrorKind::UnexpectedToken).expecting("[...]"));
            }
        }
        if self.allows(Production::BracketList) && cur.check(&TokenKind::LBracket) {
            let value = self.parse_expr(cur)?;
            if !cur.at_end() {
                return Err(cur.error(ParseErrorKind::UnexpectedToken));
            }
            return Ok(value);
        }

        match self.parse_expr(cur) {
            Ok(value) if cur.at_end() => return Ok(value),
            Err(e) if e.expected == Some(NUMBER) || e.kind == ParseErrorKind::NestingNotAllowed => {
                return Err(e)
            }
            _ => {}
        }
        cur.pos = start;
        Ok(Expr::new(ExprKind::Text(cur.rest_text()), col))
    }

    fn comma_list(&self, text: &str, cur: &Cursor<'s>, col: usize) -> Result<Expr, ParseError> {
        let mut items = Vec::new();
        for raw in text.split(',') {
            let item = raw.trim();
            if item.is_empty() {
                return Err(ParseError::new(
                    ParseErrorKind::MissingArgument,
                    cur.line.number,
                    col,
                    text,
                )
                .expecting("list item"));
            }
            let kind = if item.chars().all(|c| c.is_ascii_digit()) {
                ExprKind::Number(item.to_string())
            } else if item.chars().all(|c| c.is_alphanumeric() || c == '_') {
                ExprKind::Var(item.to_string())
            } else {
                ExprKind::Text(item.to_string())
            };
            items.push(Expr::new(kind, col));
        }
        Ok(Expr::new(ExprKind::List(items), col))
    }

    // ---------------------------------------------------------------------
    // Blocks
    // ---------------------------------------------------------------------

    fn parse_if(&mut self, cur: &mut Cursor<'s>, depth: usize) -> Result<StmtKind, ParseError> {
        let header_indent = cur.line.indent;
        cur.advance();
        let condition = self.parse_condition(cur)?;
        let body = self.parse_clause_body(cur, depth, "if")?;
        let mut branches = vec![Branch { condition, body }];
        let mut otherwise = None;

        // An inline `else` belongs to the nearest `if`, even inside a clause.
        if cur.check_word("else") {
            cur.advance();
            otherwise = Some(self.parse_clause_body(cur, depth, "else")?);
            return Ok(StmtKind::If {
                branches,
                otherwise,
            });
        }

        let lines = self.lines;
        while let Some(next) = self.next_code_line() {
            let line = &lines[next];
            let starts_with = |w: &str| line.tokens().first().is_some_and(|t| t.is_word(w));
            let is_elif = starts_with("elif") && self.allows(Production::Elif);
            if line.indent != header_indent || !(is_elif || starts_with("else")) {
                break;
            }

            if let Some(last) = branches.last_mut() {
                self.take_comments(next, &mut last.body);
            }
            self.pos = next + 1;
            let mut clause = Cursor::new(line);
            clause.advance();

            if is_elif {
                let condition = self.parse_condition(&mut clause)?;
                let body = self.parse_clause_body(&mut clause, depth, "elif")?;
                branches.push(Branch { condition, body });
            } else {
                otherwise = Some(self.parse_clause_body(&mut clause, depth, "else")?);
            }
            if clause.peek().is_some() {
                return Err(clause.error(ParseErrorKind::UnexpectedToken));
            }
            if otherwise.is_some() {
                break;
            }
        }

        Ok(StmtKind::If {
            branches,
            otherwise,
        })
    }

    fn parse_repeat(&mut self, cur: &mut Cursor<'s>, depth: usize) -> Result<StmtKind, ParseError> {
        cur.advance();
        let times = self.numeric_operand(cur)?;
        cur.expect_word("times", "times")?;
        let body = self.parse_clause_body(cur, depth, "repeat")?;
        Ok(StmtKind::Repeat { times, body })
    }

    fn parse_for(&mut self, cur: &mut Cursor<'s>, depth: usize) -> Result<StmtKind, ParseError> {
        cur.advance();
        let var = cur.expect_name("loop variable")?;
        cur.expect_word("in", "in")?;
        cur.expect_word("range", "range")?;

        let (start, end) =
            if self.allows(Production::ForRangeCall) && cur.eat(&TokenKind::LParen) {
                let start = self.numeric_operand(cur)?;
                cur.expect(TokenKind::Comma, ",")?;
                let end = self.numeric_operand(cur)?;
                cur.expect(TokenKind::RParen, ")")?;
                (start, end)
            } else if self.allows(Production::ForRangeTo) {
                let start = self.numeric_operand(cur)?;
                cur.expect_word("to", "to")?;
                (start, self.numeric_operand(cur)?)
            } else {
                return Err(cur.error(ParseErrorKind::UnexpectedToken).expecting("range(...)"));
            };

        let body = self.parse_clause_body(cur, depth, "for")?;
        Ok(StmtKind::For {
            var,
            start,
            end,
            body,
        })
    }

    /// The body following a block header: inline on the same line, or an
    /// indented block on the lines below.
    fn parse_clause_body(
        &mut self,
        cur: &mut Cursor<'s>,
        depth: usize,
        construct: &'static str,
    ) -> Result<Vec<Stmt>, ParseError> {
        if self.allows(Production::ColonBlocks) {
            cur.expect(TokenKind::Colon, ":")?;
        }

        if depth + 1 >= MAX_NESTING {
            return Err(cur.error(ParseErrorKind::NestingNotAllowed).expecting(NESTING_LIMIT));
        }

        if cur.peek().is_some() {
            let outer = cur.stop_at_else;
            cur.stop_at_else = true;
            let stmt = self.parse_command(cur, depth + 1);
            cur.stop_at_else = outer;
            return Ok(vec![stmt?]);
        }

        let header = cur.line;
        if !self.grammar.indentation_significant() {
            return Err(cur.error(ParseErrorKind::MissingArgument).expecting("command"));
        }
        let missing = || {
            ParseError::new(
                ParseErrorKind::MissingBlock,
                header.number,
                header.indent + 1,
                &header.content,
            )
            .expecting(construct)
        };
        let next = self.next_code_line().ok_or_else(missing)?;
        let indent = self.lines[next].indent;
        if indent <= header.indent {
            return Err(missing());
        }
        self.parse_block(indent, depth + 1)
    }

    // ---------------------------------------------------------------------
    // Conditions and expressions
    // ---------------------------------------------------------------------

    fn parse_condition(&mut self, cur: &mut Cursor<'s>) -> Result<Expr, ParseError> {
        let saved = self.nesting;
        let condition = self.parse_disjunction(cur);
        self.nesting = saved;
        condition
    }

    fn parse_disjunction(&mut self, cur: &mut Cursor<'s>) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_conjunction(cur)?;
        while self.allows(Production::LogicalOperators) && cur.eat_word("or") {
            self.descend(cur)?;
            let rhs = self.parse_conjunction(cur)?;
            lhs = logic(LogicOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_conjunction(&mut self, cur: &mut Cursor<'s>) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_comparison(cur)?;
        while self.allows(Production::LogicalOperators) && cur.eat_word("and") {
            self.descend(cur)?;
            let rhs = self.parse_comparison(cur)?;
            lhs = logic(LogicOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self, cur: &mut Cursor<'s>) -> Result<Expr, ParseError> {
        let lhs = self.parse_expr(cur)?;
        let relational = self.allows(Production::Relational);

        let op = match cur.peek().map(|t| &t.kind) {
            Some(TokenKind::Word(w)) if w == "is" => CompareOp::Eq,
            Some(TokenKind::Word(w)) if w == "in" && self.allows(Production::InList) => {
                CompareOp::In
            }
            Some(TokenKind::EqEq) if self.allows(Production::DoubleEquals) => CompareOp::Eq,
            Some(TokenKind::Less) if relational => CompareOp::Less,
            Some(TokenKind::Greater) if relational => CompareOp::Greater,
            Some(TokenKind::LessEq) if relational => CompareOp::LessEq,
            Some(TokenKind::GreaterEq) if relational => CompareOp::GreaterEq,
            _ => return Err(cur.error(ParseErrorKind::UnexpectedToken).expecting("comparison")),
        };
        cur.advance();

        let rhs = match op {
            CompareOp::In => {
                let col = cur.col();
                let name = cur.expect_name("list name")?;
                Expr::new(ExprKind::Var(name), col)
            }
            CompareOp::Eq => self.parse_expr(cur)?,
            _ => {
                reject_boolean(&lhs, cur.line.number)?;
                self.numeric_operand(cur)?
            }
        };

        let col = lhs.col;
        Ok(Expr::new(
            ExprKind::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            col,
        ))
    }

    fn parse_expr(&mut self, cur: &mut Cursor<'s>) -> Result<Expr, ParseError> {
        let saved = self.nesting;
        let expr = self.parse_arith(cur, 1);
        self.nesting = saved;
        expr
    }

    /// Precedence climbing over `+ - * /`.
    fn parse_arith(&mut self, cur: &mut Cursor<'s>, min_prec: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_postfix(cur)?;
        if !self.allows(Production::Arithmetic) {
            return Ok(lhs);
        }

        while let Some(op) = cur.peek().filter(|_| !cur.at_end()).and_then(arith_op) {
            if op.precedence() < min_prec {
                break;
            }
            cur.advance();
            self.descend(cur)?;
            let rhs = self.parse_arith(cur, op.precedence() + 1)?;
            reject_boolean(&lhs, cur.line.number)?;
            reject_boolean(&rhs, cur.line.number)?;
            let col = lhs.col;
            lhs = Expr::new(
                ExprKind::Arith {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                col,
            );
        }
        Ok(lhs)
    }

    /// A primary followed by any chain of `at random`, `[random]` and
    /// `[index]` suffixes.
    fn parse_postfix(&mut self, cur: &mut Cursor<'s>) -> Result<Expr, ParseError> {
        let saved = self.nesting;
        let expr = self.parse_postfix_chain(cur);
        self.nesting = saved;
        expr
    }

    fn parse_postfix_chain(&mut self, cur: &mut Cursor<'s>) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary(cur)?;

        loop {
            let col = expr.col;
            if self.allows(Production::AtRandom)
                && cur.check_word("at")
                && cur.peek_at(1).is_some_and(|t| t.is_word("random"))
            {
                self.descend(cur)?;
                cur.advance();
                cur.advance();
                expr = Expr::new(ExprKind::RandomPick(Box::new(expr)), col);
            } else if self.allows(Production::IndexAccess) && cur.eat(&TokenKind::LBracket) {
                self.descend(cur)?;
                let random_marker = cur.check_word("random")
                    && cur.peek_at(1).is_some_and(|t| t.kind == TokenKind::RBracket);
                if random_marker {
                    cur.advance();
                    cur.advance();
                    expr = Expr::new(ExprKind::RandomPick(Box::new(expr)), col);
                    continue;
                }
                let index = self.numeric_operand(cur)?;
                cur.expect(TokenKind::RBracket, "]")?;
                expr = Expr::new(
                    ExprKind::Index {
                        list: Box::new(expr),
                        index: Box::new(index),
                    },
                    col,
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self, cur: &mut Cursor<'s>) -> Result<Expr, ParseError> {
        if cur.at_end() {
            return Err(cur.error(ParseErrorKind::MissingArgument).expecting("value"));
        }
        let col = cur.col();

        let kind = match cur.peek().map(|t| &t.kind) {
            Some(TokenKind::Number(n)) => {
                cur.advance();
                ExprKind::Number(n.clone())
            }
            Some(TokenKind::Minus)
                if matches!(cur.peek_at(1).map(|t| &t.kind), Some(TokenKind::Number(_))) =>
            {
                cur.advance();
                let digits = match cur.advance().map(|t| &t.kind) {
                    Some(TokenKind::Number(n)) => n.clone(),
                    _ => return Err(cur.error(ParseErrorKind::UnexpectedToken)),
                };
                ExprKind::Number(format!("-{digits}"))
            }
            Some(TokenKind::Text(text)) => {
                cur.advance();
                ExprKind::Text(text.clone())
            }
            Some(TokenKind::Word(word)) => {
                cur.advance();
                match parse_bool(word).filter(|_| self.allows(Production::BooleanLiteral)) {
                    Some(value) => ExprKind::Bool(value),
                    None => ExprKind::Var(word.clone()),
                }
            }
            Some(TokenKind::LBracket) if self.allows(Production::BracketList) => {
                self.descend(cur)?;
                cur.advance();
                let mut items = Vec::new();
                if !cur.eat(&TokenKind::RBracket) {
                    loop {
                        items.push(self.parse_expr(cur)?);
                        if cur.eat(&TokenKind::RBracket) {
                            break;
                        }
                        cur.expect(TokenKind::Comma, ", or ]")?;
                    }
                }
                ExprKind::List(items)
            }
            _ => return Err(cur.error(ParseErrorKind::UnexpectedToken).expecting("value")),
        };

        Ok(Expr::new(kind, col))
    }
}

fn arith_op(token: &Token) -> Option<ArithOp> {
    match token.kind {
        TokenKind::Plus => Some(ArithOp::Add),
        TokenKind::Minus => Some(ArithOp::Sub),
        TokenKind::Star => Some(ArithOp::Mul),
        TokenKind::Slash => Some(ArithOp::Div),
        _ => None,
    }
}

fn logic(op: LogicOp, lhs: Expr, rhs: Expr) -> Expr {
    let col = lhs.col;
    Expr::new(
        ExprKind::Logic {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        col,
    )
}

/// The text after a leading ` at random`, if `text` starts with one.
fn strip_at_random(text: &str) -> Option<&str> {
    let rest = text.trim_start().strip_prefix("at")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start().strip_prefix("random")?;
    match rest.chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => None,
        _ => Some(rest),
    }
}

fn not_a_number(expr: &Expr, line: usize) -> ParseError {
    ParseError::new(ParseErrorKind::UnexpectedToken, line, expr.col, describe_expr(expr))
        .expecting(NUMBER)
}

/// Booleans have no numeric meaning.
fn reject_boolean(expr: &Expr, line: usize) -> Result<(), ParseError> {
    if expr.value_kind == ValueKind::BooleanLiteral {
        return Err(not_a_number(expr, line));
    }
    Ok(())
}

fn describe_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Var(name) | ExprKind::Text(name) | ExprKind::Number(name) => name.clone(),
        ExprKind::Bool(true) => "True".into(),
        ExprKind::Bool(false) => "False".into(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::lexer::Lexer;
    use crate::level::{GrammarTable, Level};

    fn parse_at(src: &str, level: u32) -> Result<Program, ParseError> {
        let table = GrammarTable::build().unwrap();
        let grammar = table.grammar_for(Level::new(level).unwrap());
        let lines = Lexer::new(src, grammar.quoted_text()).lines()?;
        Parser::new(grammar, &lines).parse()
    }

    fn parse(src: &str, level: u32) -> Vec<Stmt> {
        parse_at(src, level).unwrap().statements
    }

    fn var(name: &str) -> ExprKind {
        ExprKind::Var(name.into())
    }

    #[test]
    fn level_one_print_keeps_free_text() {
        let stmts = parse("print hallo wereld!", 1);
        assert_eq!(
            stmts[0].kind,
            StmtKind::Print(PrintArgs::Text("hallo wereld!".into()))
        );
    }

    #[test]
    fn level_one_rejects_unknown_command() {
        let err = parse_at("prnt hallo", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownCommand);
        assert_eq!(err.text, "prnt");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn level_two_splits_print_words() {
        let stmts = parse("print hallo naam!", 2);
        let StmtKind::Print(PrintArgs::Pieces(pieces)) = &stmts[0].kind else {
            panic!("expected pieces");
        };
        assert_eq!(pieces.len(), 4);
        assert_eq!(pieces[1], PrintPiece::Text(" ".into()));
        assert!(matches!(&pieces[2], PrintPiece::Expr(e) if e.kind == var("naam")));
        assert_eq!(pieces[3], PrintPiece::Text("!".into()));
    }

    #[test]
    fn level_two_free_text_assignment() {
        let stmts = parse("naam is Hedy de Robot", 2);
        let StmtKind::Assign { name, value } = &stmts[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(name, "naam");
        assert_eq!(value.kind, ExprKind::Text("Hedy de Robot".into()));
    }

    #[test]
    fn level_two_comma_list_and_random() {
        let stmts = parse("dieren is hond, kat\nkeuze is dieren at random", 2);
        let StmtKind::Assign { value, .. } = &stmts[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(value.value_kind, ValueKind::ListLiteral);
        let StmtKind::Assign { value, .. } = &stmts[1].kind else {
            panic!("expected assignment");
        };
        assert_eq!(value.value_kind, ValueKind::RandomPick);
    }

    #[test]
    fn level_three_requires_quoted_prompt() {
        let err = parse_at("kleur is ask wat?", 3).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(err.expected, Some("'prompt'"));
    }

    #[test]
    fn inline_if_with_else_on_same_line() {
        let stmts = parse("if kleur is groen antwoord is ok else antwoord is stom", 5);
        let StmtKind::If {
            branches,
            otherwise,
        } = &stmts[0].kind
        else {
            panic!("expected if");
        };
        assert_eq!(branches.len(), 1);
        let StmtKind::Assign { value, .. } = &branches[0].body[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(value.kind, var("ok"));
        assert_eq!(otherwise.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn inline_if_with_else_on_next_line() {
        let stmts = parse("a is 2\nif a is 1 print a \nelse print 'nee'", 5);
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[1].kind, StmtKind::If { otherwise: Some(_), .. }));
    }

    #[test]
    fn arithmetic_respects_precedence() {
        let stmts = parse("x is 2 + 3 * 4", 5);
        let StmtKind::Assign { value, .. } = &stmts[0].kind else {
            panic!("expected assignment");
        };
        let ExprKind::Arith { op, rhs, .. } = &value.kind else {
            panic!("expected arithmetic");
        };
        assert_eq!(*op, ArithOp::Add);
        assert_eq!(rhs.value_kind, ValueKind::BinaryArithmetic);
    }

    #[test]
    fn indentation_rejected_below_block_levels() {
        let err = parse_at("print 'a'\n  print 'b'", 6).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedIndentation);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn indented_blocks_at_seven() {
        let stmts = parse("repeat 3 times\n    print 'a'\n    print 'b'\nprint 'c'", 7);
        assert_eq!(stmts.len(), 2);
        let StmtKind::Repeat { body, .. } = &stmts[0].kind else {
            panic!("expected repeat");
        };
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn nesting_requires_level_eight() {
        let src = "repeat 3 times\n    if a is b\n        print 'x'";
        let err = parse_at(src, 7).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestingNotAllowed);
        assert_eq!(err.line, 2);
        assert!(parse_at(src, 8).is_ok());
    }

    #[test]
    fn missing_block_is_reported_on_header() {
        let err = parse_at("if a is b\nprint 'x'", 7).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingBlock);
        assert_eq!(err.line, 1);
        assert_eq!(err.expected, Some("if"));
    }

    #[test]
    fn colon_required_from_twelve() {
        assert!(parse_at("if a is b\n    print 'x'", 11).is_ok());
        let err = parse_at("if a is b\n    print 'x'", 12).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingArgument);
        assert_eq!(err.expected, Some(":"));
        assert!(parse_at("if a is b:\n    print 'x'", 12).is_ok());
    }

    #[test]
    fn inline_body_after_colon() {
        let stmts = parse("for i in range(1, 10): print(i)", 16);
        let StmtKind::For { var, body, .. } = &stmts[0].kind else {
            panic!("expected for");
        };
        assert_eq!(var, "i");
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn elif_and_else_chain() {
        let src = "if a < 12:\n    print('a')\nelif a > 12:\n    print('b')\nelse:\n    print('c')";
        let stmts = parse(src, 16);
        let StmtKind::If {
            branches,
            otherwise,
        } = &stmts[0].kind
        else {
            panic!("expected if");
        };
        assert_eq!(branches.len(), 2);
        assert!(otherwise.is_some());
    }

    #[test]
    fn else_without_if() {
        let err = parse_at("else:\n    print('x')", 16).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ElseWithoutIf);
    }

    #[test]
    fn dedent_to_unknown_level() {
        let err = parse_at("if a is b:\n    print('x')\n  print('y')", 16).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InconsistentIndentation);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn index_random_and_booleans() {
        let stmts = parse("a is fruit[1]\nb is fruit[random]\nc is TRUE", 16);
        let kinds: Vec<ValueKind> = stmts
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Assign { value, .. } => value.value_kind,
                _ => panic!("expected assignment"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ValueKind::IndexAccess,
                ValueKind::RandomPick,
                ValueKind::BooleanLiteral
            ]
        );
    }

    #[test]
    fn booleans_are_words_below_fifteen() {
        let stmts = parse("c is true", 14);
        let StmtKind::Assign { value, .. } = &stmts[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(value.kind, var("true"));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let stmts = parse("if a is 1 or b is 2 and c is 3:\n    print('x')", 16);
        let StmtKind::If { branches, .. } = &stmts[0].kind else {
            panic!("expected if");
        };
        let ExprKind::Logic { op, rhs, .. } = &branches[0].condition.kind else {
            panic!("expected logic");
        };
        assert_eq!(*op, LogicOp::Or);
        assert_eq!(rhs.value_kind, ValueKind::LogicalCombination);
    }

    #[test]
    fn comments_attach_to_following_block() {
        let src = "# start\nif a is b:\n    print('x')\n    # inside\n# after";
        let stmts = parse(src, 16);
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0].kind, StmtKind::Comment(" start".into()));
        let StmtKind::If { branches, .. } = &stmts[1].kind else {
            panic!("expected if");
        };
        assert_eq!(branches[0].body[1].kind, StmtKind::Comment(" inside".into()));
        assert_eq!(stmts[2].kind, StmtKind::Comment(" after".into()));
    }

    #[test]
    fn comment_before_else_stays_in_branch() {
        let src = "if a is b:\n    print('x')\n# note\nelse:\n    print('y')";
        let stmts = parse(src, 16);
        assert_eq!(stmts.len(), 1);
        let StmtKind::If { branches, otherwise } = &stmts[0].kind else {
            panic!("expected if");
        };
        assert_eq!(branches[0].body.len(), 2);
        assert_eq!(otherwise.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn print_call_needs_closing_paren() {
        let err = parse_at("print('x'", 13).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingArgument);
        assert_eq!(err.expected, Some(")"));
    }

    #[test]
    fn bare_comma_list_rejected_from_fourteen() {
        let err = parse_at("dieren is hond, kat", 14).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(err.text, ",");
        assert_eq!(err.expected, Some("[...]"));
        assert!(parse_at("dieren is 'hond, kat'", 14).is_ok());
    }

    #[test]
    fn boolean_arithmetic_is_rejected() {
        let err = parse_at("print(true + 1)", 15).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(err.text, "True");
        assert_eq!(err.expected, Some("number"));
    }

    #[test]
    fn forward_needs_number_at_level_one() {
        let err = parse_at("forward abc", 1).unwrap_err();
        assert_eq!(err.expected, Some("number"));
        assert!(parse_at("afstand is 5\nforward afstand", 2).is_ok());
    }

    #[test]
    fn booleans_rejected_where_numbers_are_required() {
        let cases = [
            ("for i in range(true, 3): print(i)", 16),
            ("for i in range(1, False): print(i)", 16),
            ("repeat true times: forward 1", 15),
            ("fruit is [1, 2]\nx is fruit[true]", 16),
            ("a is 1\nif a < true: print('x')", 15),
            ("if false >= 2: print('x')", 16),
            ("forward true", 15),
        ];
        for (src, level) in cases {
            let err = parse_at(src, level).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::UnexpectedToken, "{src}");
            assert_eq!(err.expected, Some("number"), "{src}");
        }
    }

    #[test]
    fn boolean_equality_still_parses() {
        assert!(parse_at("ja is true\nif ja is True: print('ja')", 15).is_ok());
        assert!(parse_at("ja is true\nif ja == false: print('nee')", 15).is_ok());
    }

    #[test]
    fn inline_else_binds_to_nearest_if() {
        let stmts = parse("if a is 1 if b is 2 print 'x' else print 'y'", 8);
        let StmtKind::If { branches, otherwise } = &stmts[0].kind else {
            panic!("expected if");
        };
        assert!(otherwise.is_none());
        let StmtKind::If { otherwise: inner, .. } = &branches[0].body[0].kind else {
            panic!("expected nested if");
        };
        assert_eq!(inner.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn else_if_chain_nests() {
        let stmts = parse("if x is 1 print 'a' else if x is 2 print 'b' else print 'c'", 8);
        let StmtKind::If { otherwise, .. } = &stmts[0].kind else {
            panic!("expected if");
        };
        let chained = &otherwise.as_ref().unwrap()[0];
        let StmtKind::If { otherwise: last, .. } = &chained.kind else {
            panic!("expected if after else");
        };
        assert!(last.is_some());
    }

    #[test]
    fn deep_bracket_nesting_is_an_error() {
        let src = format!("x is {}1{}", "[".repeat(200_000), "]".repeat(200_000));
        let err = parse_at(&src, 16).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestingNotAllowed);
        assert_eq!(err.line, 1);

        let shallow = format!("x is {}1{}", "[".repeat(8), "]".repeat(8));
        assert!(parse_at(&shallow, 16).is_ok());
    }

    #[test]
    fn deep_block_nesting_is_an_error() {
        let src = format!("{}print 'x'", "repeat 1 times ".repeat(MAX_NESTING + 10));
        let err = parse_at(&src, 8).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestingNotAllowed);

        let indented: String = (0..MAX_NESTING + 10)
            .map(|d| format!("{}repeat 1 times\n", " ".repeat(d * 2)))
            .collect();
        let err = parse_at(&format!("{indented}print 'x'"), 8).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestingNotAllowed);
    }

    #[test]
    fn long_operator_chain_is_bounded() {
        let src = format!("x is 1{}", " + 1".repeat(10_000));
        let err = parse_at(&src, 5).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NestingNotAllowed);
        assert!(parse_at("x is 1 + 2 * 3 - 4 / 5", 5).is_ok());
    }

    #[test]
    fn postfixes_chain() {
        let stmts = parse("x is fruit[1] at random", 14);
        let StmtKind::Assign { value, .. } = &stmts[0].kind else {
            panic!("expected assignment");
        };
        let ExprKind::RandomPick(inner) = &value.kind else {
            panic!("expected random pick, got {:?}", value.kind);
        };
        assert_eq!(inner.value_kind, ValueKind::IndexAccess);
    }
}
