//! Match compilation.
//!
//! A match lowers to a sequential cascade: each arm gets a block of
//! tests that either falls through into the arm body or jumps to the
//! next arm's tests. Literal arms compare values, constructor arms
//! compare the tag word (packed into the low 32 bits of the scrutinee),
//! binder arms copy the scrutinee. A match that exhausts its arms calls
//! the runtime panic.
//!
//! The join block selects the result with a `phi` over every arm body's
//! final block.

use fern_parser::ast::{Ctor, Expr, MatchArm, Pattern, PatternKind};

use super::types::{value_ty, QbeTy, Value};
use super::Codegen;

impl<'t> Codegen<'t> {
    pub(crate) fn emit_match(
        &mut self,
        e: &Expr<'_>,
        scrutinee: &Expr<'_>,
        arms: &[MatchArm<'_>],
    ) -> Option<Value> {
        let scrut = self
            .emit_expr(scrutinee)
            .expect("scrutinee yields a value");

        // The join's phi type comes from the checked match type; arm
        // values widen to it inside their own blocks.
        let target = self.ty_of(e.id).and_then(value_ty);
        let want_value = match self.ty_of(e.id) {
            Some(ty) => value_ty(ty).is_some(),
            None => true,
        };

        let join = self.new_label();
        let mut incomings: Vec<(String, Value)> = Vec::new();
        let mut all_arms_produce = true;

        for arm in arms {
            let next_arm = self.new_label();
            self.push_scope();
            self.emit_pattern_test(arm.pattern, &scrut, &next_arm);
            let body_value = self.emit_expr(arm.body);
            self.pop_scope();
            let body_value = match (target, body_value) {
                (Some(t), Some(v)) => Some(self.coerce(&v, t)),
                (_, v) => v,
            };
            let end_block = self.cur_block.clone();
            self.body.push_str(&format!("\tjmp {join}\n"));
            match body_value {
                Some(v) => incomings.push((end_block, v)),
                None => all_arms_produce = false,
            }
            self.place_label(next_arm);
        }

        // No arm matched: abort with a runtime panic.
        let message = self.string_data("non-exhaustive match");
        self.body
            .push_str(&format!("\tcall $fern_panic(l {message})\n"));
        self.body.push_str("\thlt\n");

        self.place_label(join);

        if want_value && all_arms_produce && !incomings.is_empty() {
            let ty = target.unwrap_or(incomings[0].1.ty);
            // Without checker information, mixed widths fall back to a
            // word phi (an `l` argument narrows implicitly).
            let ty = if incomings.iter().all(|(_, v)| v.ty == ty) {
                ty
            } else {
                QbeTy::W
            };
            let rendered: Vec<String> = incomings
                .iter()
                .map(|(block, v)| format!("{block} {}", v.repr))
                .collect();
            let t = self.new_tmp();
            self.body
                .push_str(&format!("\t{t} ={ty} phi {}\n", rendered.join(", ")));
            Some(Value::new(t, ty))
        } else {
            None
        }
    }

    /// Emit the tests for one pattern against `scrut`. Control falls
    /// through on a successful match (with binders bound) and jumps to
    /// `fail` otherwise.
    fn emit_pattern_test(&mut self, pattern: &Pattern<'_>, scrut: &Value, fail: &str) {
        match pattern.kind {
            PatternKind::Wildcard => {}

            PatternKind::Binding(_) => {
                self.bind_pattern(pattern, scrut);
            }

            PatternKind::Int(n) => {
                let c = self.new_tmp();
                self.body
                    .push_str(&format!("\t{c} =w ceqw {}, {n}\n", scrut.repr));
                self.branch_on(&c, fail);
            }

            PatternKind::Bool(b) => {
                let c = self.new_tmp();
                self.body.push_str(&format!(
                    "\t{c} =w ceqw {}, {}\n",
                    scrut.repr,
                    if b { 1 } else { 0 }
                ));
                self.branch_on(&c, fail);
            }

            PatternKind::Str(text) => {
                let symbol = self.string_data(text);
                let c = self.new_tmp();
                self.body.push_str(&format!(
                    "\t{c} =l call $fern_str_eq(l {}, l {symbol})\n",
                    scrut.repr
                ));
                self.branch_on(&c, fail);
            }

            PatternKind::Tuple(elems) => {
                for (i, elem) in elems.iter().enumerate() {
                    let elem_qbe = self
                        .ty_of(elem.id)
                        .and_then(value_ty)
                        .unwrap_or(QbeTy::L);
                    let addr = self.new_tmp();
                    self.body
                        .push_str(&format!("\t{addr} =l add {}, {}\n", scrut.repr, 8 * i));
                    let field = self.new_tmp();
                    let (ins, ty) = if elem_qbe == QbeTy::D {
                        ("loadd", QbeTy::D)
                    } else {
                        ("loadl", QbeTy::L)
                    };
                    self.body.push_str(&format!("\t{field} ={ty} {ins} {addr}\n"));
                    let field_value = Value::new(field, ty);
                    self.emit_pattern_test(elem, &field_value, fail);
                }
            }

            PatternKind::Ctor { ctor, arg } => {
                // Tag lives in the low 32 bits of the packed word.
                let tag = match ctor {
                    Ctor::None => 0,
                    Ctor::Some => 1,
                    Ctor::Ok => 0,
                    Ctor::Err => 1,
                };
                let tag_word = self.new_tmp();
                self.body
                    .push_str(&format!("\t{tag_word} =w copy {}\n", scrut.repr));
                let c = self.new_tmp();
                self.body
                    .push_str(&format!("\t{c} =w ceqw {tag_word}, {tag}\n"));
                self.branch_on(&c, fail);

                if let Some(inner) = arg {
                    // Sign-extended payload from the high 32 bits.
                    let payload = self.new_tmp();
                    self.body
                        .push_str(&format!("\t{payload} =l sar {}, 32\n", scrut.repr));
                    let payload_value = Value::new(payload, QbeTy::L);
                    self.emit_pattern_test(inner, &payload_value, fail);
                }
            }
        }
    }

    /// Continue when `cond` is non-zero, jump to `fail` otherwise.
    fn branch_on(&mut self, cond: &str, fail: &str) {
        let ok = self.new_label();
        self.body.push_str(&format!("\tjnz {cond}, {ok}, {fail}\n"));
        self.place_label(ok);
    }
}
