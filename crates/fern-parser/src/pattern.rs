//! Pattern parsing for match arms and `let` bindings.

use fern_common::TokenKind;

use crate::ast::{Ctor, Pattern, PatternKind};
use crate::Parser;

/// Token kinds that can begin a pattern (used for juxtaposed
/// constructor payloads like `Some x`).
fn starts_pattern(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Underscore
            | TokenKind::Ident
            | TokenKind::IntLiteral
            | TokenKind::Minus
            | TokenKind::True
            | TokenKind::False
            | TokenKind::StringLiteral
            | TokenKind::LParen
            | TokenKind::OkCtor
            | TokenKind::ErrCtor
            | TokenKind::SomeCtor
            | TokenKind::NoneCtor
    )
}

impl<'a> Parser<'a> {
    pub(crate) fn pattern(&mut self) -> Option<Pattern<'a>> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Underscore => {
                self.bump();
                Some(self.mk_pattern(PatternKind::Wildcard, tok.pos()))
            }
            TokenKind::Ident => {
                self.bump();
                Some(self.mk_pattern(PatternKind::Binding(tok.text), tok.pos()))
            }
            TokenKind::IntLiteral => {
                self.bump();
                let value = tok.text.parse::<i64>().unwrap_or(0);
                Some(self.mk_pattern(PatternKind::Int(value), tok.pos()))
            }
            TokenKind::Minus => {
                self.bump();
                let lit = self.peek();
                if lit.kind != TokenKind::IntLiteral {
                    self.error_here("expected integer literal after `-` in pattern");
                    return None;
                }
                self.bump();
                let value = lit.text.parse::<i64>().unwrap_or(0);
                Some(self.mk_pattern(PatternKind::Int(-value), tok.pos()))
            }
            TokenKind::True => {
                self.bump();
                Some(self.mk_pattern(PatternKind::Bool(true), tok.pos()))
            }
            TokenKind::False => {
                self.bump();
                Some(self.mk_pattern(PatternKind::Bool(false), tok.pos()))
            }
            TokenKind::StringLiteral => {
                self.bump();
                Some(self.mk_pattern(PatternKind::Str(tok.text), tok.pos()))
            }
            TokenKind::LParen => self.tuple_pattern(),
            TokenKind::OkCtor => self.ctor_pattern(Ctor::Ok),
            TokenKind::ErrCtor => self.ctor_pattern(Ctor::Err),
            TokenKind::SomeCtor => self.ctor_pattern(Ctor::Some),
            TokenKind::NoneCtor => {
                self.bump();
                Some(self.mk_pattern(
                    PatternKind::Ctor {
                        ctor: Ctor::None,
                        arg: None,
                    },
                    tok.pos(),
                ))
            }
            _ => {
                self.error_here("expected pattern");
                None
            }
        }
    }

    /// `(p1, p2, ...)`; a single parenthesized pattern is grouping, the
    /// empty form `()` matches unit.
    fn tuple_pattern(&mut self) -> Option<Pattern<'a>> {
        let open = self.bump(); // (
        if self.eat(TokenKind::RParen) {
            let empty: Vec<Pattern> = Vec::new();
            return Some(
                self.mk_pattern(PatternKind::Tuple(self.arena.alloc_slice(empty)), open.pos()),
            );
        }

        let first = self.pattern()?;
        if self.at(TokenKind::Comma) {
            let mut elems = vec![first];
            while self.eat(TokenKind::Comma) {
                if self.at(TokenKind::RParen) {
                    break; // trailing comma
                }
                elems.push(self.pattern()?);
            }
            self.expect(TokenKind::RParen, "`)`");
            Some(self.mk_pattern(PatternKind::Tuple(self.arena.alloc_slice(elems)), open.pos()))
        } else {
            self.expect(TokenKind::RParen, "`)`");
            Some(first)
        }
    }

    /// `Ok p`, `Err p`, `Some p` -- the payload pattern may be
    /// juxtaposed or parenthesized.
    fn ctor_pattern(&mut self, ctor: Ctor) -> Option<Pattern<'a>> {
        let tok = self.bump();
        let arg = if starts_pattern(self.peek().kind) {
            let p = self.pattern()?;
            Some(self.alloc_pattern(p))
        } else {
            None
        };
        Some(self.mk_pattern(PatternKind::Ctor { ctor, arg }, tok.pos()))
    }
}
