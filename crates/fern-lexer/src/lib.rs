//! Fern lexer -- layout-sensitive tokenizer for the Fern programming language.
//!
//! Fern uses Python-style significant indentation. The lexer maintains a
//! stack of indentation widths and synthesizes `Newline`, `Indent`, and
//! `Dedent` tokens at logical line boundaries; blank lines and
//! comment-only lines are transparent to layout. At end of input the
//! stack is flushed with `Dedent` tokens before the final `Eof`.
//!
//! The lexer exposes `next`/`peek` plus `save`/`restore` snapshots at the
//! token layer so the parser can backtrack over a bounded region (used to
//! disambiguate lambdas from parenthesized expressions).

mod cursor;

use std::collections::VecDeque;
use std::fmt;

use cursor::{Cursor, CursorState};
use fern_common::{keyword_from_str, Arena, Interner, Pos, Token, TokenKind};

/// Maximum indentation stack depth. Deeper nesting is a lex error.
const MAX_INDENT_DEPTH: usize = 256;

/// A lexical error with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub pos: Pos,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.message)
    }
}

/// Snapshot of lexer state for bounded backtracking.
///
/// Produced by [`Lexer::save`] and consumed by [`Lexer::restore`].
#[derive(Clone)]
pub struct LexerState<'a> {
    cursor: CursorState,
    indents: Vec<u32>,
    pending: VecDeque<Token<'a>>,
    at_line_start: bool,
    peeked: Option<Token<'a>>,
    eof_done: bool,
    error_count: usize,
}

/// The Fern lexer. Converts source text into a stream of tokens.
pub struct Lexer<'a> {
    arena: &'a Arena,
    cursor: Cursor<'a>,
    interner: Interner<'a>,
    /// Stack of indentation widths; the bottom entry is always 0.
    indents: Vec<u32>,
    /// Tokens queued for emission (layout bursts, EOF flush).
    pending: VecDeque<Token<'a>>,
    /// Whether the next token starts a logical line (layout applies).
    at_line_start: bool,
    /// One-token lookahead buffer for `peek`.
    peeked: Option<Token<'a>>,
    /// Whether the final `Eof` has been queued.
    eof_done: bool,
    /// Accumulated lexical errors.
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer over `source`. String literal contents and
    /// identifiers are allocated in `arena`.
    pub fn new(arena: &'a Arena, source: &'a str) -> Self {
        Lexer {
            arena,
            cursor: Cursor::new(source),
            interner: Interner::new(arena),
            indents: vec![0],
            pending: VecDeque::new(),
            at_line_start: true,
            peeked: None,
            eof_done: false,
            errors: Vec::new(),
        }
    }

    /// Convenience: tokenize the entire source into a `Vec<Token>`,
    /// including the final `Eof`.
    pub fn tokenize(arena: &'a Arena, source: &'a str) -> Vec<Token<'a>> {
        let mut lexer = Lexer::new(arena, source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    /// Return the next token, advancing the lexer.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Token<'a> {
        if let Some(token) = self.peeked.take() {
            return token;
        }
        self.produce()
    }

    /// Return the next token without advancing.
    pub fn peek(&mut self) -> Token<'a> {
        if self.peeked.is_none() {
            let token = self.produce();
            self.peeked = Some(token);
        }
        self.peeked.unwrap()
    }

    /// Whether the next token is `Eof`.
    pub fn is_eof(&mut self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Snapshot the current position (including layout state and the
    /// lookahead buffer) for later [`restore`](Self::restore).
    pub fn save(&self) -> LexerState<'a> {
        LexerState {
            cursor: self.cursor.snapshot(),
            indents: self.indents.clone(),
            pending: self.pending.clone(),
            at_line_start: self.at_line_start,
            peeked: self.peeked,
            eof_done: self.eof_done,
            error_count: self.errors.len(),
        }
    }

    /// Rewind to a previously saved state. Errors recorded after the
    /// snapshot are discarded.
    pub fn restore(&mut self, state: LexerState<'a>) {
        self.cursor.rewind(state.cursor);
        self.indents = state.indents;
        self.pending = state.pending;
        self.at_line_start = state.at_line_start;
        self.peeked = state.peeked;
        self.eof_done = state.eof_done;
        self.errors.truncate(state.error_count);
    }

    /// Lexical errors recorded so far.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    // ── Token production ───────────────────────────────────────────────

    fn produce(&mut self) -> Token<'a> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return token;
            }
            if self.eof_done {
                return Token::new(TokenKind::Eof, "", self.cursor.line(), self.cursor.col());
            }
            if self.at_line_start {
                self.handle_line_start();
                continue;
            }

            // Inline whitespace between tokens.
            self.cursor.eat_while(|c| c == ' ' || c == '\t');

            let start = self.cursor.pos();
            let Some(c) = self.cursor.peek() else {
                self.flush_eof();
                continue;
            };

            match c {
                '\n' | '\r' => {
                    let col = self.cursor.col_of(start);
                    let line = self.cursor.line();
                    self.eat_line_break();
                    self.at_line_start = true;
                    return Token::new(TokenKind::Newline, "", line, col);
                }
                '#' => {
                    self.cursor.eat_while(|ch| ch != '\n' && ch != '\r');
                    continue;
                }
                _ => return self.scan_token(start, c),
            }
        }
    }

    // ── Layout ─────────────────────────────────────────────────────────

    /// At the start of a logical line: measure leading whitespace, skip
    /// blank and comment-only lines, and synthesize `Indent`/`Dedent`
    /// tokens into the pending queue.
    fn handle_line_start(&mut self) {
        loop {
            let mut width = 0u32;
            while let Some(c) = self.cursor.peek() {
                match c {
                    ' ' => width += 1,
                    '\t' => width += 4,
                    _ => break,
                }
                self.cursor.advance();
            }

            match self.cursor.peek() {
                None => {
                    self.at_line_start = false;
                    self.flush_eof();
                    return;
                }
                Some('\n') | Some('\r') => {
                    // Blank line: no layout effect.
                    self.eat_line_break();
                }
                Some('#') => {
                    // Comment-only line: no layout effect.
                    self.cursor.eat_while(|ch| ch != '\n' && ch != '\r');
                    if self.cursor.peek().is_none() {
                        self.at_line_start = false;
                        self.flush_eof();
                        return;
                    }
                    self.eat_line_break();
                }
                Some(_) => {
                    self.at_line_start = false;
                    self.apply_layout(width);
                    return;
                }
            }
        }
    }

    /// Compare the measured width against the indent stack, queueing
    /// `Indent`/`Dedent` tokens.
    fn apply_layout(&mut self, width: u32) {
        let col = self.cursor.col();
        let line = self.cursor.line();
        let top = *self.indents.last().expect("indent stack is never empty");

        if width > top {
            if self.indents.len() >= MAX_INDENT_DEPTH {
                self.push_error("indentation nested too deeply", line, col);
                self.pending
                    .push_back(Token::new(TokenKind::Error, "", line, col));
            } else {
                self.indents.push(width);
                self.pending
                    .push_back(Token::new(TokenKind::Indent, "", line, col));
            }
        } else if width < top {
            while width < *self.indents.last().expect("indent stack is never empty") {
                self.indents.pop();
                self.pending
                    .push_back(Token::new(TokenKind::Dedent, "", line, col));
            }
            if width != *self.indents.last().expect("indent stack is never empty") {
                self.push_error(
                    "unindent does not match any outer indentation level",
                    line,
                    col,
                );
                self.pending
                    .push_back(Token::new(TokenKind::Error, "", line, col));
                // Resynchronize on the observed width.
                self.indents.push(width);
            }
        }
    }

    /// Queue the dedents for every open indent level, then `Eof`.
    fn flush_eof(&mut self) {
        let line = self.cursor.line();
        let col = self.cursor.col();
        while self.indents.len() > 1 {
            self.indents.pop();
            self.pending
                .push_back(Token::new(TokenKind::Dedent, "", line, col));
        }
        self.pending
            .push_back(Token::new(TokenKind::Eof, "", line, col));
        self.eof_done = true;
    }

    // ── Scanning ───────────────────────────────────────────────────────

    fn scan_token(&mut self, start: u32, c: char) -> Token<'a> {
        match c {
            '(' => self.single(TokenKind::LParen, start),
            ')' => self.single(TokenKind::RParen, start),
            '[' => self.single(TokenKind::LBracket, start),
            ']' => self.single(TokenKind::RBracket, start),
            '{' => self.single(TokenKind::LBrace, start),
            '}' => self.single(TokenKind::RBrace, start),
            ',' => self.single(TokenKind::Comma, start),
            ';' => self.single(TokenKind::Semicolon, start),
            ':' => self.single(TokenKind::Colon, start),
            '.' => self.single(TokenKind::Dot, start),
            '|' => self.single(TokenKind::Bar, start),
            '+' => self.single(TokenKind::Plus, start),
            '/' => self.single(TokenKind::Slash, start),
            '%' => self.single(TokenKind::Percent, start),

            '-' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('>') {
                    self.cursor.advance();
                    self.make(TokenKind::Arrow, start)
                } else {
                    self.make(TokenKind::Minus, start)
                }
            }
            '*' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('*') {
                    self.cursor.advance();
                    self.make(TokenKind::StarStar, start)
                } else {
                    self.make(TokenKind::Star, start)
                }
            }
            '=' => {
                self.cursor.advance();
                match self.cursor.peek() {
                    Some('=') => {
                        self.cursor.advance();
                        self.make(TokenKind::EqEq, start)
                    }
                    Some('>') => {
                        self.cursor.advance();
                        self.make(TokenKind::FatArrow, start)
                    }
                    _ => self.make(TokenKind::Eq, start),
                }
            }
            '!' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.make(TokenKind::NotEq, start)
                } else {
                    let col = self.cursor.col_of(start);
                    self.push_error("unexpected character `!` (use `not`)", self.cursor.line(), col);
                    self.make(TokenKind::Error, start)
                }
            }
            '<' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.make(TokenKind::LtEq, start)
                } else {
                    self.make(TokenKind::Lt, start)
                }
            }
            '>' => {
                self.cursor.advance();
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.make(TokenKind::GtEq, start)
                } else {
                    self.make(TokenKind::Gt, start)
                }
            }

            '"' => self.scan_string(start),
            '0'..='9' => self.scan_number(start),
            c if is_ident_start(c) => self.scan_ident(start),

            other => {
                self.cursor.advance();
                let col = self.cursor.col_of(start);
                self.push_error(
                    &format!("unexpected character `{other}`"),
                    self.cursor.line(),
                    col,
                );
                self.make(TokenKind::Error, start)
            }
        }
    }

    /// Scan a double-quoted string literal, resolving escape sequences.
    /// The token text is the unescaped contents, arena-allocated.
    fn scan_string(&mut self, start: u32) -> Token<'a> {
        let col = self.cursor.col_of(start);
        let line = self.cursor.line();
        self.cursor.advance(); // opening quote

        let mut buf = String::new();
        loop {
            match self.cursor.peek() {
                None => {
                    self.push_error("unterminated string literal", line, col);
                    return self.make(TokenKind::Error, start);
                }
                Some('\n') | Some('\r') => {
                    // Continue at the newline; layout takes over there.
                    self.push_error("newline in string literal", line, col);
                    return self.make(TokenKind::Error, start);
                }
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some('\\') => {
                    self.cursor.advance();
                    match self.cursor.advance() {
                        Some('n') => buf.push('\n'),
                        Some('t') => buf.push('\t'),
                        Some('r') => buf.push('\r'),
                        Some('\\') => buf.push('\\'),
                        Some('"') => buf.push('"'),
                        Some('0') => buf.push('\0'),
                        Some(other) => {
                            self.push_error(
                                &format!("invalid escape sequence `\\{other}`"),
                                line,
                                col,
                            );
                            // Skip to the closing quote or line end.
                            self.cursor
                                .eat_while(|ch| ch != '"' && ch != '\n' && ch != '\r');
                            if self.cursor.peek() == Some('"') {
                                self.cursor.advance();
                            }
                            return self.make(TokenKind::Error, start);
                        }
                        None => {
                            self.push_error("unterminated string literal", line, col);
                            return self.make(TokenKind::Error, start);
                        }
                    }
                }
                Some(ch) => {
                    buf.push(ch);
                    self.cursor.advance();
                }
            }
        }

        let text = self.arena.alloc_str(&buf);
        Token::new(TokenKind::StringLiteral, text, line, col)
    }

    /// Scan a numeric literal. `[0-9]+` is an integer; a dotted form
    /// `[0-9]+.[0-9]+` (with optional exponent) is a float. Integer
    /// literals that overflow `i64` are a lex error.
    fn scan_number(&mut self, start: u32) -> Token<'a> {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance(); // '.'
            self.cursor.eat_while(|c| c.is_ascii_digit());
            if matches!(self.cursor.peek(), Some('e' | 'E')) {
                self.cursor.advance();
                if matches!(self.cursor.peek(), Some('+' | '-')) {
                    self.cursor.advance();
                }
                self.cursor.eat_while(|c| c.is_ascii_digit());
            }
            return self.make(TokenKind::FloatLiteral, start);
        }

        let text = self.cursor.slice(start, self.cursor.pos());
        if text.parse::<i64>().is_err() {
            let col = self.cursor.col_of(start);
            self.push_error(
                &format!("integer literal `{text}` overflows 64 bits"),
                self.cursor.line(),
                col,
            );
            return self.make(TokenKind::Error, start);
        }
        self.make(TokenKind::IntLiteral, start)
    }

    /// Scan an identifier, keyword, or the `_` wildcard.
    fn scan_ident(&mut self, start: u32) -> Token<'a> {
        self.cursor.advance();
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());
        let line = self.cursor.line();
        let col = self.cursor.col_of(start);

        if text == "_" {
            return Token::new(TokenKind::Underscore, text, line, col);
        }
        if let Some(kind) = keyword_from_str(text) {
            return Token::new(kind, text, line, col);
        }
        let interned = self.interner.intern(text);
        Token::new(TokenKind::Ident, interned, line, col)
    }

    // ── Helpers ────────────────────────────────────────────────────────

    fn single(&mut self, kind: TokenKind, start: u32) -> Token<'a> {
        self.cursor.advance();
        self.make(kind, start)
    }

    fn make(&self, kind: TokenKind, start: u32) -> Token<'a> {
        let text = self.cursor.slice(start, self.cursor.pos());
        Token::new(kind, text, self.cursor.line(), self.cursor.col_of(start))
    }

    /// Consume one physical line break (`\n`, `\r`, or `\r\n`); the
    /// cursor does the line bookkeeping.
    fn eat_line_break(&mut self) {
        if self.cursor.advance() == Some('\r') && self.cursor.peek() == Some('\n') {
            self.cursor.advance();
        }
    }

    fn push_error(&mut self, message: &str, line: u32, column: u32) {
        self.errors.push(LexError {
            message: message.to_string(),
            pos: Pos::new(line, column),
        });
    }
}

/// Whether a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Whether a character can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
