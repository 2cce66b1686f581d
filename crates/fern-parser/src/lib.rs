//! Fern parser -- recursive descent with Pratt-style operator precedence.
//!
//! The parser drives the layout-sensitive lexer directly, using its
//! token-layer `save`/`restore` for the bounded backtracking that
//! disambiguates lambdas from parenthesized expressions. It produces the
//! arena-allocated AST defined in [`ast`].
//!
//! Error handling follows the result-and-diagnostics pattern: errors are
//! recorded in a list, the parser synchronizes to the next statement
//! boundary (a significant newline at the enclosing indent), and parsing
//! continues. A parse attempt that fails without consuming any tokens is
//! fatal and yields an empty statement sequence.

pub mod ast;
pub mod error;

mod expr;
mod pattern;
mod stmt;
mod types;

use fern_common::{Arena, Pos, Token, TokenKind};
use fern_lexer::{LexError, Lexer};

use ast::{Expr, ExprKind, NodeId, Pattern, PatternKind, Stmt, TypeExpr};
use error::ParseError;

/// The Fern parser. Owns the lexer and the arena reference all AST
/// nodes are allocated into.
pub struct Parser<'a> {
    pub(crate) arena: &'a Arena,
    pub(crate) lexer: Lexer<'a>,
    pub(crate) errors: Vec<ParseError>,
    pub(crate) had_error: bool,
    next_id: u32,
    /// Tokens consumed so far; used to detect zero-progress failures.
    pub(crate) consumed: u32,
}

impl<'a> Parser<'a> {
    /// Create a parser over `source`, allocating into `arena`.
    pub fn new(arena: &'a Arena, source: &'a str) -> Self {
        Parser {
            arena,
            lexer: Lexer::new(arena, source),
            errors: Vec::new(),
            had_error: false,
            next_id: 0,
            consumed: 0,
        }
    }

    /// Parse a statement sequence until end of input.
    ///
    /// Errors are recorded and recovery continues at the next statement
    /// boundary; a failure that consumed no tokens aborts and returns an
    /// empty sequence.
    pub fn parse_stmts(&mut self) -> &'a [Stmt<'a>] {
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            // Stray layout tokens at the top level come from earlier
            // layout errors; drop them and keep going.
            if self.at(TokenKind::Dedent) || self.at(TokenKind::Indent) {
                self.bump();
                continue;
            }
            if self.at(TokenKind::Eof) {
                break;
            }
            let before = self.consumed;
            match self.stmt() {
                Some(s) => stmts.push(s),
                None => {
                    if self.consumed == before {
                        return self.arena.alloc_slice(Vec::<Stmt>::new());
                    }
                    self.sync();
                }
            }
        }
        self.arena.alloc_slice(stmts)
    }

    /// Parse a single expression (REPL and test entry point).
    pub fn parse_expr(&mut self) -> Option<&'a Expr<'a>> {
        let e = self.expr()?;
        Some(self.arena.alloc(e))
    }

    /// Whether any parse error has been recorded.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Parse errors recorded so far.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Lexical errors recorded by the underlying lexer.
    pub fn lex_errors(&self) -> &[LexError] {
        self.lexer.errors()
    }

    // ── Token helpers ──────────────────────────────────────────────────

    pub(crate) fn peek(&mut self) -> Token<'a> {
        self.lexer.peek()
    }

    pub(crate) fn at(&mut self, kind: TokenKind) -> bool {
        self.lexer.peek().kind == kind
    }

    pub(crate) fn bump(&mut self) -> Token<'a> {
        self.consumed += 1;
        self.lexer.next()
    }

    /// Consume the current token if it matches.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it matches, otherwise record an
    /// error describing what was expected.
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.eat(kind) {
            true
        } else {
            let found = self.peek();
            let found_desc = if found.text.is_empty() {
                format!("{:?}", found.kind)
            } else {
                format!("`{}`", found.text)
            };
            self.error_here(&format!("expected {what}, found {found_desc}"));
            false
        }
    }

    // ── Error handling ─────────────────────────────────────────────────

    pub(crate) fn error_here(&mut self, message: &str) {
        let pos = self.peek().pos();
        self.error_at(pos, message);
    }

    pub(crate) fn error_at(&mut self, pos: Pos, message: &str) {
        self.errors.push(ParseError::new(message, pos));
        self.had_error = true;
    }

    /// Skip to the next statement boundary (newline, semicolon, dedent,
    /// or end of file). The boundary token itself is left for
    /// [`skip_separators`](Self::skip_separators).
    pub(crate) fn sync(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Newline
                | TokenKind::Semicolon
                | TokenKind::Dedent
                | TokenKind::Eof => break,
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Consume statement separators (newlines and semicolons).
    pub(crate) fn skip_separators(&mut self) {
        while self.at(TokenKind::Newline) || self.at(TokenKind::Semicolon) {
            self.bump();
        }
    }

    /// Consume layout tokens inside bracketed contexts, where newlines
    /// and indentation are not significant.
    pub(crate) fn skip_layout(&mut self) {
        while matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
        ) {
            self.bump();
        }
    }

    /// Run a speculative parse. On `None` the lexer position, error
    /// list, and progress counter are rolled back.
    pub(crate) fn speculate<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Option<T> {
        let lex_state = self.lexer.save();
        let err_len = self.errors.len();
        let had_error = self.had_error;
        let consumed = self.consumed;
        match f(self) {
            Some(value) => Some(value),
            None => {
                self.lexer.restore(lex_state);
                self.errors.truncate(err_len);
                self.had_error = had_error;
                self.consumed = consumed;
                None
            }
        }
    }

    // ── Node construction ──────────────────────────────────────────────

    pub(crate) fn new_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn mk_expr(&mut self, kind: ExprKind<'a>, pos: Pos) -> Expr<'a> {
        Expr {
            kind,
            pos,
            id: self.new_id(),
        }
    }

    pub(crate) fn mk_pattern(&mut self, kind: PatternKind<'a>, pos: Pos) -> Pattern<'a> {
        Pattern {
            kind,
            pos,
            id: self.new_id(),
        }
    }

    pub(crate) fn alloc_expr(&mut self, e: Expr<'a>) -> &'a Expr<'a> {
        self.arena.alloc(e)
    }

    pub(crate) fn alloc_pattern(&mut self, p: Pattern<'a>) -> &'a Pattern<'a> {
        self.arena.alloc(p)
    }

    pub(crate) fn alloc_type(&mut self, t: TypeExpr<'a>) -> &'a TypeExpr<'a> {
        self.arena.alloc(t)
    }
}
