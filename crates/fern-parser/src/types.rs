//! Type expression parsing.
//!
//! Type syntax: named types (`Int`, `Float`, user names), function types
//! `T1 -> T2` (right-associative, with a parenthesized tuple on the left
//! supplying multiple parameters), tuples `(T1, T2)`, lists `[T]`, and
//! lowercase type variables.

use fern_common::TokenKind;

use crate::ast::{TypeExpr, TypeExprKind};
use crate::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn type_expr(&mut self) -> Option<TypeExpr<'a>> {
        let lhs = self.type_primary()?;

        if self.eat(TokenKind::Arrow) {
            let ret = self.type_expr()?; // right-associative
            let ret = self.alloc_type(ret);
            let params = match lhs.kind {
                TypeExprKind::Tuple(elems) => elems,
                _ => self.arena.alloc_slice(vec![lhs]),
            };
            return Some(TypeExpr {
                kind: TypeExprKind::Fun(params, ret),
                pos: lhs.pos,
            });
        }

        Some(lhs)
    }

    fn type_primary(&mut self) -> Option<TypeExpr<'a>> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Ident => {
                self.bump();
                let kind = if tok.text.starts_with(|c: char| c.is_ascii_uppercase()) {
                    TypeExprKind::Named(tok.text)
                } else {
                    TypeExprKind::Var(tok.text)
                };
                Some(TypeExpr {
                    kind,
                    pos: tok.pos(),
                })
            }
            TokenKind::LParen => {
                self.bump();
                if self.eat(TokenKind::RParen) {
                    let empty: Vec<TypeExpr> = Vec::new();
                    return Some(TypeExpr {
                        kind: TypeExprKind::Tuple(self.arena.alloc_slice(empty)),
                        pos: tok.pos(),
                    });
                }
                let first = self.type_expr()?;
                if self.at(TokenKind::Comma) {
                    let mut elems = vec![first];
                    while self.eat(TokenKind::Comma) {
                        if self.at(TokenKind::RParen) {
                            break; // trailing comma
                        }
                        elems.push(self.type_expr()?);
                    }
                    self.expect(TokenKind::RParen, "`)`");
                    Some(TypeExpr {
                        kind: TypeExprKind::Tuple(self.arena.alloc_slice(elems)),
                        pos: tok.pos(),
                    })
                } else {
                    self.expect(TokenKind::RParen, "`)`");
                    Some(first)
                }
            }
            TokenKind::LBracket => {
                self.bump();
                let elem = self.type_expr()?;
                let elem = self.alloc_type(elem);
                self.expect(TokenKind::RBracket, "`]`");
                Some(TypeExpr {
                    kind: TypeExprKind::List(elem),
                    pos: tok.pos(),
                })
            }
            _ => {
                self.error_here("expected type");
                None
            }
        }
    }
}
