//! Expression lowering.
//!
//! Every function here appends instructions to the current body buffer
//! and returns the [`Value`] (temporary + QBE type) holding the result,
//! or `None` for unit-typed expressions.

use fern_parser::ast::{BinOp, Ctor, Expr, ExprKind, Param, StmtKind, UnOp};
use fern_typeck::builtins::is_runtime_builtin;
use fern_typeck::Ty;

use super::types::{abi_ty, QbeTy, Value};
use super::Codegen;

impl<'t> Codegen<'t> {
    pub(crate) fn emit_expr(&mut self, e: &Expr<'_>) -> Option<Value> {
        match e.kind {
            ExprKind::Int(n) => {
                let t = self.new_tmp();
                self.body.push_str(&format!("\t{t} =w copy {n}\n"));
                Some(Value::new(t, QbeTy::W))
            }

            ExprKind::Float(x) => {
                let t = self.new_tmp();
                self.body
                    .push_str(&format!("\t{t} =d copy d_{}\n", float_text(x)));
                Some(Value::new(t, QbeTy::D))
            }

            ExprKind::Bool(b) => {
                let t = self.new_tmp();
                self.body
                    .push_str(&format!("\t{t} =w copy {}\n", if b { 1 } else { 0 }));
                Some(Value::new(t, QbeTy::W))
            }

            ExprKind::Str(text) => {
                let symbol = self.string_data(text);
                let t = self.new_tmp();
                self.body.push_str(&format!("\t{t} =l copy {symbol}\n"));
                Some(Value::new(t, QbeTy::L))
            }

            ExprKind::Ident(name) => {
                if let Some(local) = self.lookup_local(name) {
                    return Some(Value::new(local.qbe_name.clone(), local.ty));
                }
                // A function used as a value: load its symbol.
                let symbol = if self.fn_names.contains(name) || !is_runtime_builtin(name) {
                    format!("${name}")
                } else {
                    runtime_symbol(name)
                };
                let t = self.new_tmp();
                self.body.push_str(&format!("\t{t} =l copy {symbol}\n"));
                Some(Value::new(t, QbeTy::L))
            }

            ExprKind::Unary { op, operand } => {
                let v = self
                    .emit_expr(operand)
                    .expect("unary operand yields a value");
                let t = self.new_tmp();
                match op {
                    UnOp::Neg if v.ty == QbeTy::D => {
                        self.body.push_str(&format!("\t{t} =d neg {}\n", v.repr));
                        Some(Value::new(t, QbeTy::D))
                    }
                    UnOp::Neg => {
                        self.body.push_str(&format!("\t{t} =w sub 0, {}\n", v.repr));
                        Some(Value::new(t, QbeTy::W))
                    }
                    UnOp::Not => {
                        self.body.push_str(&format!("\t{t} =w xor {}, 1\n", v.repr));
                        Some(Value::new(t, QbeTy::W))
                    }
                }
            }

            ExprKind::Binary { op, lhs, rhs } => match op {
                BinOp::And | BinOp::Or => self.emit_logical(op, lhs, rhs),
                _ => self.emit_arith_or_cmp(op, lhs, rhs),
            },

            ExprKind::Call { callee, args } => self.emit_call(e, callee, args),

            ExprKind::Lambda { params, body } => {
                let symbol = self.new_lambda_symbol();
                let fn_ty = self.ty_of(e.id).cloned();
                self.emit_function(&symbol, params, body, fn_ty, false);
                let t = self.new_tmp();
                self.body.push_str(&format!("\t{t} =l copy {symbol}\n"));
                Some(Value::new(t, QbeTy::L))
            }

            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.emit_if(cond, then_branch, else_branch),

            ExprKind::Match { scrutinee, arms } => self.emit_match(e, scrutinee, arms),

            ExprKind::Tuple(elems) => {
                if elems.is_empty() {
                    return None; // unit
                }
                let t = self.new_tmp();
                self.body.push_str(&format!(
                    "\t{t} =l call $fern_alloc(l {})\n",
                    8 * elems.len()
                ));
                for (i, elem) in elems.iter().enumerate() {
                    let v = self
                        .emit_expr(elem)
                        .expect("tuple element yields a value");
                    let addr = self.new_tmp();
                    self.body
                        .push_str(&format!("\t{addr} =l add {t}, {}\n", 8 * i));
                    if v.ty == QbeTy::D {
                        self.body
                            .push_str(&format!("\tstored {}, {addr}\n", v.repr));
                    } else {
                        let lv = self.coerce(&v, QbeTy::L);
                        self.body
                            .push_str(&format!("\tstorel {}, {addr}\n", lv.repr));
                    }
                }
                Some(Value::new(t, QbeTy::L))
            }

            ExprKind::List(elems) => {
                let mut list = self.new_tmp();
                self.body.push_str(&format!(
                    "\t{list} =l call $fern_list_with_capacity(l {})\n",
                    elems.len()
                ));
                for elem in elems {
                    let v = self.emit_expr(elem).expect("list element yields a value");
                    let lv = self.coerce(&v, QbeTy::L);
                    let next = self.new_tmp();
                    self.body.push_str(&format!(
                        "\t{next} =l call $fern_list_push(l {list}, l {})\n",
                        lv.repr
                    ));
                    list = next;
                }
                Some(Value::new(list, QbeTy::L))
            }

            ExprKind::Block(stmts) => {
                self.push_scope();
                let mut last = None;
                for stmt in stmts {
                    match stmt.kind {
                        StmtKind::Expr(inner) => last = self.emit_expr(inner),
                        _ => {
                            self.stmt(stmt);
                            last = None;
                        }
                    }
                }
                self.pop_scope();
                last
            }

            ExprKind::Ctor { ctor, arg } => {
                let payload = arg.map(|a| {
                    let v = self.emit_expr(a).expect("constructor payload yields a value");
                    self.coerce(&v, QbeTy::L)
                });
                let t = self.new_tmp();
                match (ctor, payload) {
                    (Ctor::None, _) => {
                        self.body
                            .push_str(&format!("\t{t} =l call $fern_option_none()\n"));
                    }
                    (Ctor::Some, Some(p)) => {
                        self.body.push_str(&format!(
                            "\t{t} =l call $fern_option_some(l {})\n",
                            p.repr
                        ));
                    }
                    (Ctor::Ok, Some(p)) => {
                        self.body
                            .push_str(&format!("\t{t} =l call $fern_result_ok(l {})\n", p.repr));
                    }
                    (Ctor::Err, Some(p)) => {
                        self.body.push_str(&format!(
                            "\t{t} =l call $fern_result_err(l {})\n",
                            p.repr
                        ));
                    }
                    _ => panic!("constructor without payload reached the emitter"),
                }
                Some(Value::new(t, QbeTy::L))
            }
        }
    }

    // ── Operators ──────────────────────────────────────────────────────

    /// Eager binary operators: arithmetic, `**`, and comparisons.
    fn emit_arith_or_cmp(&mut self, op: BinOp, lhs: &Expr<'_>, rhs: &Expr<'_>) -> Option<Value> {
        let is_float = self
            .ty_of(lhs.id)
            .map(|t| t.is_con("Float"))
            .unwrap_or(false);
        let is_string = self
            .ty_of(lhs.id)
            .map(|t| t.is_con("String"))
            .unwrap_or(false);

        let lv = self.emit_expr(lhs).expect("binary operand yields a value");
        let rv = self.emit_expr(rhs).expect("binary operand yields a value");
        let float_op = is_float || lv.ty == QbeTy::D || rv.ty == QbeTy::D;

        if op == BinOp::Pow {
            let a = self.coerce(&lv, QbeTy::D);
            let b = self.coerce(&rv, QbeTy::D);
            let t = self.new_tmp();
            self.body.push_str(&format!(
                "\t{t} =d call $fern_pow(d {}, d {})\n",
                a.repr, b.repr
            ));
            return Some(Value::new(t, QbeTy::D));
        }

        if op.is_arithmetic() {
            let ins = match op {
                BinOp::Add => "add",
                BinOp::Sub => "sub",
                BinOp::Mul => "mul",
                BinOp::Div => "div",
                BinOp::Rem => "rem",
                _ => unreachable!(),
            };
            let t = self.new_tmp();
            if float_op {
                if op == BinOp::Rem {
                    // No float remainder instruction; the runtime helps.
                    self.body.push_str(&format!(
                        "\t{t} =d call $fern_fmod(d {}, d {})\n",
                        lv.repr, rv.repr
                    ));
                } else {
                    self.body.push_str(&format!(
                        "\t{t} =d {ins} {}, {}\n",
                        lv.repr, rv.repr
                    ));
                }
                return Some(Value::new(t, QbeTy::D));
            }
            self.body
                .push_str(&format!("\t{t} =w {ins} {}, {}\n", lv.repr, rv.repr));
            return Some(Value::new(t, QbeTy::W));
        }

        // Comparisons.
        if is_string && matches!(op, BinOp::Eq | BinOp::Ne) {
            let t = self.new_tmp();
            self.body.push_str(&format!(
                "\t{t} =l call $fern_str_eq(l {}, l {})\n",
                lv.repr, rv.repr
            ));
            if op == BinOp::Ne {
                let n = self.new_tmp();
                self.body.push_str(&format!("\t{n} =w xor {t}, 1\n"));
                return Some(Value::new(n, QbeTy::W));
            }
            return Some(Value::new(t, QbeTy::W));
        }

        let ins = if float_op {
            match op {
                BinOp::Eq => "ceqd",
                BinOp::Ne => "cned",
                BinOp::Lt => "cltd",
                BinOp::Le => "cled",
                BinOp::Gt => "cgtd",
                BinOp::Ge => "cged",
                _ => unreachable!(),
            }
        } else {
            match op {
                BinOp::Eq => "ceqw",
                BinOp::Ne => "cnew",
                BinOp::Lt => "csltw",
                BinOp::Le => "cslew",
                BinOp::Gt => "csgtw",
                BinOp::Ge => "csgew",
                _ => unreachable!(),
            }
        };
        let t = self.new_tmp();
        self.body
            .push_str(&format!("\t{t} =w {ins} {}, {}\n", lv.repr, rv.repr));
        Some(Value::new(t, QbeTy::W))
    }

    /// `and`/`or` lower to a basic-block diamond with a `phi` at the
    /// join; the right operand only evaluates when needed.
    fn emit_logical(&mut self, op: BinOp, lhs: &Expr<'_>, rhs: &Expr<'_>) -> Option<Value> {
        let lv = self.emit_expr(lhs).expect("logical operand yields a value");
        let lhs_block = self.cur_block.clone();

        let rhs_lbl = self.new_label();
        let join = self.new_label();
        match op {
            BinOp::And => self
                .body
                .push_str(&format!("\tjnz {}, {rhs_lbl}, {join}\n", lv.repr)),
            BinOp::Or => self
                .body
                .push_str(&format!("\tjnz {}, {join}, {rhs_lbl}\n", lv.repr)),
            _ => unreachable!(),
        }

        self.place_label(rhs_lbl);
        let rv = self.emit_expr(rhs).expect("logical operand yields a value");
        let rhs_block = self.cur_block.clone();
        self.body.push_str(&format!("\tjmp {join}\n"));

        self.place_label(join);
        let t = self.new_tmp();
        let short_circuit = if op == BinOp::And { 0 } else { 1 };
        self.body.push_str(&format!(
            "\t{t} =w phi {lhs_block} {short_circuit}, {rhs_block} {}\n",
            rv.repr
        ));
        Some(Value::new(t, QbeTy::W))
    }

    // ── Control flow ───────────────────────────────────────────────────

    fn emit_if(
        &mut self,
        cond: &Expr<'_>,
        then_branch: &Expr<'_>,
        else_branch: Option<&Expr<'_>>,
    ) -> Option<Value> {
        let cv = self.emit_expr(cond).expect("condition yields a value");
        let then_lbl = self.new_label();

        let Some(else_expr) = else_branch else {
            // Unit-typed if: no join value.
            let join = self.new_label();
            self.body
                .push_str(&format!("\tjnz {}, {then_lbl}, {join}\n", cv.repr));
            self.place_label(then_lbl);
            let _ = self.emit_expr(then_branch);
            self.body.push_str(&format!("\tjmp {join}\n"));
            self.place_label(join);
            return None;
        };

        let else_lbl = self.new_label();
        let join = self.new_label();
        self.body
            .push_str(&format!("\tjnz {}, {then_lbl}, {else_lbl}\n", cv.repr));

        self.place_label(then_lbl);
        let tv = self.emit_expr(then_branch);
        let then_end = self.cur_block.clone();
        self.body.push_str(&format!("\tjmp {join}\n"));

        self.place_label(else_lbl);
        let ev = self.emit_expr(else_expr);
        let else_end = self.cur_block.clone();
        self.body.push_str(&format!("\tjmp {join}\n"));

        self.place_label(join);
        match (tv, ev) {
            (Some(a), Some(b)) => {
                // Branches of a checked program agree on type; a mixed
                // w/l pair (unchecked input) joins on w, where the `l`
                // argument narrows implicitly.
                let ty = if a.ty == b.ty { a.ty } else { QbeTy::W };
                let t = self.new_tmp();
                self.body.push_str(&format!(
                    "\t{t} ={ty} phi {then_end} {}, {else_end} {}\n",
                    a.repr, b.repr
                ));
                Some(Value::new(t, ty))
            }
            _ => None,
        }
    }

    // ── Calls ──────────────────────────────────────────────────────────

    fn emit_call(
        &mut self,
        e: &Expr<'_>,
        callee: &Expr<'_>,
        args: &[Expr<'_>],
    ) -> Option<Value> {
        if let ExprKind::Ident(name) = callee.kind {
            if self.lookup_local(name).is_none() {
                if is_runtime_builtin(name) {
                    return self.emit_builtin_call(e, name, args);
                }
                // Direct call to a top-level function.
                let arg_vals = self.emit_abi_args(args);
                return self.emit_call_instruction(e, &format!("${name}"), &arg_vals);
            }
        }

        // Indirect call through a function value.
        let fv = self.emit_expr(callee).expect("callee yields a value");
        let arg_vals = self.emit_abi_args(args);
        self.emit_call_instruction(e, &fv.repr, &arg_vals)
    }

    /// Evaluate arguments and widen them to their ABI types.
    fn emit_abi_args(&mut self, args: &[Expr<'_>]) -> Vec<Value> {
        let mut out = Vec::new();
        for arg in args {
            let v = self.emit_expr(arg).expect("argument yields a value");
            let coerced = match v.ty {
                QbeTy::W => self.coerce(&v, QbeTy::L),
                _ => v,
            };
            out.push(coerced);
        }
        out
    }

    /// Emit the `call` itself; the result type comes from the checked
    /// type of the call expression (unit calls produce no value).
    fn emit_call_instruction(
        &mut self,
        e: &Expr<'_>,
        target: &str,
        args: &[Value],
    ) -> Option<Value> {
        let rendered: Vec<String> = args.iter().map(|a| format!("{} {}", a.ty, a.repr)).collect();
        let arg_text = rendered.join(", ");

        let ret = match self.ty_of(e.id) {
            Some(ty) => abi_ty(ty),
            None => Some(QbeTy::L),
        };
        match ret {
            Some(rt) => {
                let t = self.new_tmp();
                self.body
                    .push_str(&format!("\t{t} ={rt} call {target}({arg_text})\n"));
                Some(Value::new(t, rt))
            }
            None => {
                self.body
                    .push_str(&format!("\tcall {target}({arg_text})\n"));
                None
            }
        }
    }

    /// Calls to runtime-backed builtins. Print dispatches on the
    /// checked argument type.
    fn emit_builtin_call(
        &mut self,
        e: &Expr<'_>,
        name: &str,
        args: &[Expr<'_>],
    ) -> Option<Value> {
        match name {
            "print" | "println" => {
                let arg = args.first().expect("print takes one argument");
                let variant = match self.ty_of(arg.id) {
                    Some(t) if t.is_con("Float") => "float",
                    Some(t) if t.is_con("Bool") => "bool",
                    Some(t) if t.is_con("String") => "str",
                    Some(_) | None => "int",
                };
                let v = self.emit_expr(arg).expect("print argument yields a value");
                if variant == "float" {
                    let d = self.coerce(&v, QbeTy::D);
                    self.body
                        .push_str(&format!("\tcall $fern_{name}_float(d {})\n", d.repr));
                } else {
                    let l = self.coerce(&v, QbeTy::L);
                    self.body
                        .push_str(&format!("\tcall $fern_{name}_{variant}(l {})\n", l.repr));
                }
                None
            }
            "pow" => {
                let a = self.emit_expr(&args[0]).expect("pow argument");
                let b = self.emit_expr(&args[1]).expect("pow argument");
                let a = self.coerce(&a, QbeTy::D);
                let b = self.coerce(&b, QbeTy::D);
                let t = self.new_tmp();
                self.body.push_str(&format!(
                    "\t{t} =d call $fern_pow(d {}, d {})\n",
                    a.repr, b.repr
                ));
                Some(Value::new(t, QbeTy::D))
            }
            _ => {
                // str_len, str_concat, str_eq, list_len, list_get,
                // list_push: all take and return 64-bit values.
                let arg_vals = self.emit_abi_args(args);
                let rendered: Vec<String> = arg_vals
                    .iter()
                    .map(|a| format!("{} {}", a.ty, a.repr))
                    .collect();
                let t = self.new_tmp();
                self.body.push_str(&format!(
                    "\t{t} =l call $fern_{name}({})\n",
                    rendered.join(", ")
                ));
                Some(Value::new(t, QbeTy::L))
            }
        }
    }

    // ── Function bodies ────────────────────────────────────────────────

    /// Emit a complete QBE function into the function section. Used for
    /// named functions and lifted lambdas; `is_main` forces the C entry
    /// point shape (`w` return, `ret 0`).
    pub(crate) fn emit_function(
        &mut self,
        symbol: &str,
        params: &[Param<'_>],
        body_expr: &Expr<'_>,
        fn_ty: Option<Ty>,
        is_main: bool,
    ) {
        let (param_tys, ret_ty) = match fn_ty {
            Some(Ty::Fun(params, ret)) => (Some(params), Some(*ret)),
            _ => (None, None),
        };

        // Functions do not capture: the body sees only its own scope.
        let saved_scopes = std::mem::take(&mut self.scopes);
        let scope_id = self.push_scope();

        let mut sig_params = Vec::new();
        for (i, param) in params.iter().enumerate() {
            let qbe = param_tys
                .as_ref()
                .and_then(|tys| tys.get(i))
                .and_then(abi_ty)
                .unwrap_or(QbeTy::L);
            let qbe_name = format!("%{}.{}", param.name, scope_id);
            sig_params.push(format!("{qbe} {qbe_name}"));
            self.bind_local(param.name, qbe_name, qbe);
        }

        let saved_body = std::mem::take(&mut self.body);
        let saved_block = std::mem::take(&mut self.cur_block);
        self.place_label("@start".to_string());
        let value = self.emit_expr(body_expr);

        let ret_sig: Option<QbeTy>;
        if is_main {
            self.body.push_str("\tret 0\n");
            ret_sig = Some(QbeTy::W);
        } else {
            let declared = ret_ty.as_ref().and_then(abi_ty);
            let declared_unit = ret_ty.as_ref().map(|t| t.is_unit()).unwrap_or(false);
            match (declared, value) {
                _ if declared_unit => {
                    self.body.push_str("\tret\n");
                    ret_sig = None;
                }
                (None, None) => {
                    self.body.push_str("\tret\n");
                    ret_sig = None;
                }
                (declared, Some(v)) => {
                    let target = declared.unwrap_or(match v.ty {
                        QbeTy::W => QbeTy::L,
                        other => other,
                    });
                    let coerced = self.coerce(&v, target);
                    self.body.push_str(&format!("\tret {}\n", coerced.repr));
                    ret_sig = Some(target);
                }
                (Some(declared), None) => {
                    self.body.push_str("\tret 0\n");
                    ret_sig = Some(declared);
                }
            }
        }

        let fn_body = std::mem::replace(&mut self.body, saved_body);
        self.cur_block = saved_block;
        self.pop_scope();
        self.scopes = saved_scopes;

        let ret_text = match ret_sig {
            Some(t) => format!("{t} "),
            None => String::new(),
        };
        self.fns.push_str(&format!(
            "export function {ret_text}{symbol}({params}) {{\n{fn_body}}}\n",
            params = sig_params.join(", "),
        ));
    }
}

/// Render a float literal with enough precision to round-trip, always
/// keeping a decimal point so QBE reads it as a float.
fn float_text(x: f64) -> String {
    if x.is_finite() && x == x.trunc() {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

/// Symbol for a runtime builtin referenced as a bare value. `print` and
/// `println` default to their integer variants.
fn runtime_symbol(name: &str) -> String {
    match name {
        "print" => "$fern_print_int".to_string(),
        "println" => "$fern_println_int".to_string(),
        _ => format!("$fern_{name}"),
    }
}
