//! Pratt expression parser.
//!
//! Binding powers, low to high: `or`; `and`; comparisons (non-
//! associative); `+ -`; `* / %`; `**` (right-associative); unary
//! `-`/`not`; call and index postfix. `if` and `match` are parsed as
//! prefix expression forms.

use fern_common::TokenKind;

use crate::ast::{BinOp, Ctor, Expr, ExprKind, MatchArm, UnOp};
use crate::Parser;

/// Returns `(op, left_bp, right_bp)` for infix operators.
///
/// Left < right is left-associative; left > right is right-associative.
fn infix_binding_power(kind: TokenKind) -> Option<(BinOp, u8, u8)> {
    match kind {
        TokenKind::Or => Some((BinOp::Or, 1, 2)),
        TokenKind::And => Some((BinOp::And, 3, 4)),
        TokenKind::EqEq => Some((BinOp::Eq, 5, 6)),
        TokenKind::NotEq => Some((BinOp::Ne, 5, 6)),
        TokenKind::Lt => Some((BinOp::Lt, 5, 6)),
        TokenKind::LtEq => Some((BinOp::Le, 5, 6)),
        TokenKind::Gt => Some((BinOp::Gt, 5, 6)),
        TokenKind::GtEq => Some((BinOp::Ge, 5, 6)),
        TokenKind::Plus => Some((BinOp::Add, 7, 8)),
        TokenKind::Minus => Some((BinOp::Sub, 7, 8)),
        TokenKind::Star => Some((BinOp::Mul, 9, 10)),
        TokenKind::Slash => Some((BinOp::Div, 9, 10)),
        TokenKind::Percent => Some((BinOp::Rem, 9, 10)),
        TokenKind::StarStar => Some((BinOp::Pow, 12, 11)),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    /// Parse an expression at the lowest binding power.
    pub(crate) fn expr(&mut self) -> Option<Expr<'a>> {
        match self.peek().kind {
            TokenKind::If => self.if_expr(),
            TokenKind::Match => self.match_expr(),
            _ => self.binary_expr(0),
        }
    }

    // ── Binary operators ───────────────────────────────────────────────

    fn binary_expr(&mut self, min_bp: u8) -> Option<Expr<'a>> {
        let mut lhs = self.unary_expr()?;

        loop {
            let Some((op, l_bp, r_bp)) = infix_binding_power(self.peek().kind) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            self.bump();

            let rhs = self.binary_expr(r_bp)?;
            let pos = lhs.pos;
            let lhs_ref = self.alloc_expr(lhs);
            let rhs_ref = self.alloc_expr(rhs);
            lhs = self.mk_expr(
                ExprKind::Binary {
                    op,
                    lhs: lhs_ref,
                    rhs: rhs_ref,
                },
                pos,
            );

            // Comparisons are non-associative: `a < b < c` is rejected.
            if op.is_comparison() {
                if let Some((next, ..)) = infix_binding_power(self.peek().kind) {
                    if next.is_comparison() {
                        self.error_here("comparison operators cannot be chained");
                        break;
                    }
                }
            }
        }

        Some(lhs)
    }

    // ── Unary operators ────────────────────────────────────────────────

    fn unary_expr(&mut self) -> Option<Expr<'a>> {
        let tok = self.peek();
        let op = match tok.kind {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Not => Some(UnOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.unary_expr()?;
            let operand = self.alloc_expr(operand);
            return Some(self.mk_expr(ExprKind::Unary { op, operand }, tok.pos()));
        }
        self.postfix_expr()
    }

    // ── Postfix: call and index ────────────────────────────────────────

    fn postfix_expr(&mut self) -> Option<Expr<'a>> {
        let mut e = self.primary_expr()?;

        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    let args = self.call_args()?;
                    let pos = e.pos;
                    let callee = self.alloc_expr(e);
                    e = self.mk_expr(
                        ExprKind::Call {
                            callee,
                            args: self.arena.alloc_slice(args),
                        },
                        pos,
                    );
                }
                TokenKind::LBracket => {
                    // Indexing is sugar for the `list_get` builtin.
                    let pos = e.pos;
                    self.bump();
                    self.skip_layout();
                    let index = self.expr()?;
                    self.skip_layout();
                    self.expect(TokenKind::RBracket, "`]`");
                    let callee = self.mk_expr(ExprKind::Ident("list_get"), pos);
                    let callee = self.alloc_expr(callee);
                    let args = self.arena.alloc_slice(vec![e, index]);
                    e = self.mk_expr(ExprKind::Call { callee, args }, pos);
                }
                _ => break,
            }
        }

        Some(e)
    }

    /// Parse a parenthesized argument list. Layout tokens inside the
    /// parentheses are not significant.
    fn call_args(&mut self) -> Option<Vec<Expr<'a>>> {
        self.bump(); // (
        let mut args = Vec::new();
        self.skip_layout();
        if self.eat(TokenKind::RParen) {
            return Some(args);
        }
        loop {
            args.push(self.expr()?);
            self.skip_layout();
            if self.eat(TokenKind::Comma) {
                self.skip_layout();
                if self.eat(TokenKind::RParen) {
                    return Some(args); // trailing comma
                }
                continue;
            }
            break;
        }
        if !self.expect(TokenKind::RParen, "`)`") {
            return None;
        }
        Some(args)
    }

    // ── Primary expressions ────────────────────────────────────────────

    fn primary_expr(&mut self) -> Option<Expr<'a>> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::IntLiteral => {
                self.bump();
                let value = tok.text.parse::<i64>().unwrap_or(0);
                Some(self.mk_expr(ExprKind::Int(value), tok.pos()))
            }
            TokenKind::FloatLiteral => {
                self.bump();
                let value = tok.text.parse::<f64>().unwrap_or(0.0);
                Some(self.mk_expr(ExprKind::Float(value), tok.pos()))
            }
            TokenKind::StringLiteral => {
                self.bump();
                Some(self.mk_expr(ExprKind::Str(tok.text), tok.pos()))
            }
            TokenKind::True => {
                self.bump();
                Some(self.mk_expr(ExprKind::Bool(true), tok.pos()))
            }
            TokenKind::False => {
                self.bump();
                Some(self.mk_expr(ExprKind::Bool(false), tok.pos()))
            }
            TokenKind::Ident => {
                self.bump();
                Some(self.mk_expr(ExprKind::Ident(tok.text), tok.pos()))
            }

            TokenKind::OkCtor => self.ctor_expr(Ctor::Ok),
            TokenKind::ErrCtor => self.ctor_expr(Ctor::Err),
            TokenKind::SomeCtor => self.ctor_expr(Ctor::Some),
            TokenKind::NoneCtor => {
                self.bump();
                Some(self.mk_expr(
                    ExprKind::Ctor {
                        ctor: Ctor::None,
                        arg: None,
                    },
                    tok.pos(),
                ))
            }

            TokenKind::LParen => self.paren_expr(),
            TokenKind::LBracket => self.list_expr(),

            TokenKind::If => self.if_expr(),
            TokenKind::Match => self.match_expr(),

            TokenKind::Error => {
                self.bump();
                self.error_at(tok.pos(), "invalid token");
                None
            }
            _ => {
                let found = if tok.text.is_empty() {
                    format!("{:?}", tok.kind)
                } else {
                    format!("`{}`", tok.text)
                };
                self.error_here(&format!("expected expression, found {found}"));
                None
            }
        }
    }

    /// `Ok(e)`, `Err(e)`, `Some(e)` -- the payload is parenthesized in
    /// expression position.
    fn ctor_expr(&mut self, ctor: Ctor) -> Option<Expr<'a>> {
        let tok = self.bump();
        let arg = if self.at(TokenKind::LParen) {
            self.bump();
            self.skip_layout();
            let value = self.expr()?;
            self.skip_layout();
            self.expect(TokenKind::RParen, "`)`");
            Some(self.alloc_expr(value))
        } else {
            None
        };
        Some(self.mk_expr(ExprKind::Ctor { ctor, arg }, tok.pos()))
    }

    /// `(` starts a lambda, the unit value `()`, a tuple, or a grouped
    /// expression. Lambdas are recognized by speculative parsing: a
    /// parameter list followed by `->`.
    fn paren_expr(&mut self) -> Option<Expr<'a>> {
        if let Some(lambda) = self.speculate(|p| p.lambda_expr()) {
            return Some(lambda);
        }

        let open = self.bump(); // (
        self.skip_layout();
        if self.eat(TokenKind::RParen) {
            let empty: Vec<Expr> = Vec::new();
            return Some(self.mk_expr(ExprKind::Tuple(self.arena.alloc_slice(empty)), open.pos()));
        }

        let first = self.expr()?;
        self.skip_layout();

        if self.at(TokenKind::Comma) {
            let mut elems = vec![first];
            while self.eat(TokenKind::Comma) {
                self.skip_layout();
                if self.at(TokenKind::RParen) {
                    break; // trailing comma
                }
                elems.push(self.expr()?);
                self.skip_layout();
            }
            self.expect(TokenKind::RParen, "`)`");
            Some(self.mk_expr(ExprKind::Tuple(self.arena.alloc_slice(elems)), open.pos()))
        } else {
            // Plain grouping; no wrapper node.
            self.expect(TokenKind::RParen, "`)`");
            Some(first)
        }
    }

    /// Speculative lambda parse: `(params) -> expr`. Returns `None`
    /// without committing if the shape does not match.
    fn lambda_expr(&mut self) -> Option<Expr<'a>> {
        let open = self.peek();
        if open.kind != TokenKind::LParen {
            return None;
        }
        self.bump();
        let params = self.param_list()?;
        if !self.at(TokenKind::Arrow) {
            return None;
        }
        self.bump();
        let body = self.expr()?;
        let body = self.alloc_expr(body);
        Some(self.mk_expr(
            ExprKind::Lambda {
                params: self.arena.alloc_slice(params),
                body,
            },
            open.pos(),
        ))
    }

    /// `[e1, e2, ...]` list literal.
    fn list_expr(&mut self) -> Option<Expr<'a>> {
        let open = self.bump(); // [
        let mut elems = Vec::new();
        self.skip_layout();
        if self.eat(TokenKind::RBracket) {
            return Some(self.mk_expr(ExprKind::List(self.arena.alloc_slice(elems)), open.pos()));
        }
        loop {
            elems.push(self.expr()?);
            self.skip_layout();
            if self.eat(TokenKind::Comma) {
                self.skip_layout();
                if self.eat(TokenKind::RBracket) {
                    return Some(
                        self.mk_expr(ExprKind::List(self.arena.alloc_slice(elems)), open.pos()),
                    );
                }
                continue;
            }
            break;
        }
        self.expect(TokenKind::RBracket, "`]`");
        Some(self.mk_expr(ExprKind::List(self.arena.alloc_slice(elems)), open.pos()))
    }

    // ── Control flow ───────────────────────────────────────────────────

    /// `if expr: body [else: body]`. Without `else` the whole form has
    /// type Unit.
    fn if_expr(&mut self) -> Option<Expr<'a>> {
        let kw = self.bump(); // if
        let cond = self.expr()?;
        let cond = self.alloc_expr(cond);
        self.expect(TokenKind::Colon, "`:`");
        let then_branch = self.body()?;
        let then_branch = self.alloc_expr(then_branch);

        // `else` may sit on the line after a block body.
        if self.at(TokenKind::Newline) {
            let _ = self.speculate(|p| {
                p.bump();
                if p.at(TokenKind::Else) {
                    Some(())
                } else {
                    None
                }
            });
        }

        let else_branch = if self.eat(TokenKind::Else) {
            self.expect(TokenKind::Colon, "`:`");
            let body = self.body()?;
            Some(self.alloc_expr(body))
        } else {
            None
        };

        Some(self.mk_expr(
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            },
            kw.pos(),
        ))
    }

    /// `match expr: arm, arm, ...` -- arms inline separated by commas,
    /// or one per line in an indented block.
    fn match_expr(&mut self) -> Option<Expr<'a>> {
        let kw = self.bump(); // match
        let scrutinee = self.expr()?;
        let scrutinee = self.alloc_expr(scrutinee);
        self.expect(TokenKind::Colon, "`:`");

        let mut arms = Vec::new();
        if self.at(TokenKind::Newline) {
            self.bump();
            self.expect(TokenKind::Indent, "an indented block of match arms");
            loop {
                self.skip_separators();
                if self.eat(TokenKind::Dedent) || self.at(TokenKind::Eof) {
                    break;
                }
                arms.push(self.match_arm()?);
                self.eat(TokenKind::Comma);
            }
        } else {
            loop {
                arms.push(self.match_arm()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        if arms.is_empty() {
            self.error_at(kw.pos(), "match expression has no arms");
        }

        Some(self.mk_expr(
            ExprKind::Match {
                scrutinee,
                arms: self.arena.alloc_slice(arms),
            },
            kw.pos(),
        ))
    }

    fn match_arm(&mut self) -> Option<MatchArm<'a>> {
        let pattern = self.pattern()?;
        let pattern = self.alloc_pattern(pattern);
        self.expect(TokenKind::Arrow, "`->` after match pattern");
        let body = self.expr()?;
        let body = self.alloc_expr(body);
        Some(MatchArm { pattern, body })
    }
}
