//! Statement and item parsing.
//!
//! A statement is a `let` binding, a function definition, a type alias,
//! an import, or a bare expression. Function and control-flow bodies are
//! either a single inline expression or an indented layout block.

use fern_common::TokenKind;

use crate::ast::{Expr, ExprKind, Param, Stmt, StmtKind};
use crate::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn stmt(&mut self) -> Option<Stmt<'a>> {
        match self.peek().kind {
            TokenKind::Let => self.let_stmt(),
            TokenKind::Fn | TokenKind::Pub => self.fn_stmt(),
            TokenKind::Type => self.type_stmt(),
            TokenKind::Import => self.import_stmt(),
            _ => {
                let e = self.expr()?;
                let pos = e.pos;
                let value = self.alloc_expr(e);
                Some(Stmt {
                    kind: StmtKind::Expr(value),
                    pos,
                    id: self.new_id(),
                })
            }
        }
    }

    /// `let pattern [: type] = expr`
    fn let_stmt(&mut self) -> Option<Stmt<'a>> {
        let kw = self.bump(); // let
        let pattern = self.pattern()?;
        let pattern = self.alloc_pattern(pattern);

        let ty = if self.eat(TokenKind::Colon) {
            let t = self.type_expr()?;
            Some(self.alloc_type(t))
        } else {
            None
        };

        if !self.expect(TokenKind::Eq, "`=` in let binding") {
            return None;
        }
        let value = self.expr()?;
        let value = self.alloc_expr(value);

        Some(Stmt {
            kind: StmtKind::Let { pattern, ty, value },
            pos: kw.pos(),
            id: self.new_id(),
        })
    }

    /// `["pub"] fn name(params) [-> type]: body`
    fn fn_stmt(&mut self) -> Option<Stmt<'a>> {
        let kw = self.peek();
        let is_pub = self.eat(TokenKind::Pub);
        if !self.expect(TokenKind::Fn, "`fn`") {
            return None;
        }

        let name_tok = self.peek();
        if !self.expect(TokenKind::Ident, "function name") {
            return None;
        }

        if !self.expect(TokenKind::LParen, "`(`") {
            return None;
        }
        let params = self.param_list()?;

        let ret = if self.eat(TokenKind::Arrow) {
            let t = self.type_expr()?;
            Some(self.alloc_type(t))
        } else {
            None
        };

        if !self.expect(TokenKind::Colon, "`:` before function body") {
            return None;
        }
        let body = self.body()?;
        let body = self.alloc_expr(body);

        Some(Stmt {
            kind: StmtKind::Fn {
                name: name_tok.text,
                params: self.arena.alloc_slice(params),
                ret,
                body,
                is_pub,
            },
            pos: kw.pos(),
            id: self.new_id(),
        })
    }

    /// `type Name = typeexpr`
    fn type_stmt(&mut self) -> Option<Stmt<'a>> {
        let kw = self.bump(); // type
        let name_tok = self.peek();
        if !self.expect(TokenKind::Ident, "type alias name") {
            return None;
        }
        if !self.expect(TokenKind::Eq, "`=` in type alias") {
            return None;
        }
        let ty = self.type_expr()?;
        let ty = self.alloc_type(ty);
        Some(Stmt {
            kind: StmtKind::TypeAlias {
                name: name_tok.text,
                ty,
            },
            pos: kw.pos(),
            id: self.new_id(),
        })
    }

    /// `import a.b.c`
    fn import_stmt(&mut self) -> Option<Stmt<'a>> {
        let kw = self.bump(); // import
        let first = self.peek();
        if !self.expect(TokenKind::Ident, "module path") {
            return None;
        }
        let mut path = String::from(first.text);
        while self.eat(TokenKind::Dot) {
            let seg = self.peek();
            if !self.expect(TokenKind::Ident, "module path segment") {
                return None;
            }
            path.push('.');
            path.push_str(seg.text);
        }
        Some(Stmt {
            kind: StmtKind::Import {
                path: self.arena.alloc_str(&path),
            },
            pos: kw.pos(),
            id: self.new_id(),
        })
    }

    // ── Bodies ─────────────────────────────────────────────────────────

    /// A body after `:` -- either a single inline expression, or an
    /// indented block when the `:` ends the line.
    pub(crate) fn body(&mut self) -> Option<Expr<'a>> {
        if self.at(TokenKind::Newline) {
            let pos = self.peek().pos();
            self.bump(); // newline
            if !self.expect(TokenKind::Indent, "an indented block") {
                return None;
            }
            let stmts = self.block_stmts();
            return Some(self.mk_expr(ExprKind::Block(stmts), pos));
        }
        self.expr()
    }

    /// Statements inside an indented block, up to and including the
    /// closing dedent. Recovery stays inside the block.
    fn block_stmts(&mut self) -> &'a [Stmt<'a>] {
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(TokenKind::Dedent) || self.at(TokenKind::Eof) {
                break;
            }
            let before = self.consumed;
            match self.stmt() {
                Some(s) => stmts.push(s),
                None => {
                    if self.consumed == before {
                        self.bump();
                    }
                    self.sync();
                }
            }
        }
        self.arena.alloc_slice(stmts)
    }

    /// A parameter list after the opening `(`, up to and including the
    /// closing `)`. Each parameter is `name [: type]`.
    pub(crate) fn param_list(&mut self) -> Option<Vec<Param<'a>>> {
        let mut params = Vec::new();
        self.skip_layout();
        if self.eat(TokenKind::RParen) {
            return Some(params);
        }
        loop {
            let name_tok = self.peek();
            if name_tok.kind != TokenKind::Ident {
                self.error_here("expected parameter name");
                return None;
            }
            self.bump();

            let ty = if self.eat(TokenKind::Colon) {
                let t = self.type_expr()?;
                Some(self.alloc_type(t))
            } else {
                None
            };

            params.push(Param {
                name: name_tok.text,
                ty,
                pos: name_tok.pos(),
            });

            self.skip_layout();
            if self.eat(TokenKind::Comma) {
                self.skip_layout();
                if self.eat(TokenKind::RParen) {
                    return Some(params); // trailing comma
                }
                continue;
            }
            break;
        }
        if !self.expect(TokenKind::RParen, "`)`") {
            return None;
        }
        Some(params)
    }
}
