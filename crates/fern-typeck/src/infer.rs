//! The Fern type checker -- Algorithm W over the arena AST.
//!
//! Walks statements and expressions, generating constraints that are
//! solved immediately by unification. Implements let-polymorphism via
//! level-based generalization: each `let` (and `fn`) right-hand side is
//! checked one level deeper, and on completion every unbound variable
//! above the surrounding level is quantified.
//!
//! The checker is resilient: an error aborts the current statement, is
//! recorded, and checking continues with the next statement. Failed
//! expressions report the [`Ty::Error`] placeholder, which unifies with
//! everything to suppress cascades.

use fern_common::Pos;
use fern_parser::ast::{
    Ctor, Expr, ExprKind, NodeId, Param, Pattern, PatternKind, Stmt, StmtKind, TypeExpr,
    TypeExprKind, UnOp,
};
use rustc_hash::FxHashMap;

use crate::builtins;
use crate::env::TypeEnv;
use crate::error::TypeError;
use crate::exhaustiveness;
use crate::ty::{Scheme, Ty, TyCon};
use crate::unify::InferCtx;

/// The type checker. Create one per pipeline run; for a REPL, keep it
/// alive across inputs so the top-level environment accumulates.
pub struct Checker {
    ctx: InferCtx,
    env: TypeEnv,
    /// `type Name = ...` aliases, resolved at annotation sites.
    aliases: FxHashMap<String, Ty>,
    /// Inferred type of every checked node, keyed by its parse id.
    types: FxHashMap<NodeId, Ty>,
    /// Non-fatal findings (currently: non-exhaustive matches).
    warnings: Vec<TypeError>,
}

impl Checker {
    pub fn new() -> Self {
        let mut ctx = InferCtx::new();
        let mut env = TypeEnv::new();
        builtins::register_builtins(&mut ctx, &mut env);
        Checker {
            ctx,
            env,
            aliases: FxHashMap::default(),
            types: FxHashMap::default(),
            warnings: Vec::new(),
        }
    }

    // ── Public contract ────────────────────────────────────────────────

    /// Check a statement sequence, extending the top-level environment.
    /// Returns true when no errors were recorded.
    pub fn check_stmts(&mut self, stmts: &[Stmt<'_>]) -> bool {
        for stmt in stmts {
            // Errors are already recorded; continue with the next statement.
            let _ = self.infer_stmt(stmt);
        }
        self.finalize_types();
        !self.has_errors()
    }

    /// Infer the type of a single expression. Returns the resolved type,
    /// or [`Ty::Error`] if checking failed.
    pub fn infer_expr(&mut self, expr: &Expr<'_>) -> Ty {
        match self.expr_ty(expr) {
            Ok(ty) => {
                let resolved = self.ctx.resolve(ty);
                self.types.insert(expr.id, resolved.clone());
                resolved
            }
            Err(_) => Ty::Error,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.ctx.errors.is_empty()
    }

    /// The first recorded error, rendered, if any.
    pub fn first_error(&self) -> Option<String> {
        self.ctx.errors.first().map(|e| e.to_string())
    }

    pub fn clear_errors(&mut self) {
        self.ctx.errors.clear();
        self.warnings.clear();
    }

    pub fn errors(&self) -> &[TypeError] {
        &self.ctx.errors
    }

    pub fn warnings(&self) -> &[TypeError] {
        &self.warnings
    }

    /// Read-only view of the current environment.
    pub fn env(&self) -> &TypeEnv {
        &self.env
    }

    /// The scheme bound to a top-level name, if any.
    pub fn scheme_of(&self, name: &str) -> Option<&Scheme> {
        self.env.lookup(name)
    }

    /// Inferred types keyed by AST node id. Fully resolved after
    /// [`check_stmts`](Self::check_stmts).
    pub fn types(&self) -> &FxHashMap<NodeId, Ty> {
        &self.types
    }

    /// Resolve all recorded node types through the union-find table.
    fn finalize_types(&mut self) {
        let ids: Vec<NodeId> = self.types.keys().copied().collect();
        for id in ids {
            let ty = self.types[&id].clone();
            let resolved = self.ctx.resolve(ty);
            self.types.insert(id, resolved);
        }
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn infer_stmt(&mut self, stmt: &Stmt<'_>) -> Result<(), TypeError> {
        match stmt.kind {
            StmtKind::Let { pattern, ty, value } => {
                self.ctx.enter_level();
                let result = self.let_rhs_ty(ty, value, stmt.pos);
                self.ctx.leave_level();
                let value_ty = result?;

                match pattern.kind {
                    PatternKind::Binding(name) => {
                        let scheme = self.ctx.generalize(value_ty.clone());
                        self.env.insert(name.to_string(), scheme);
                        self.types.insert(pattern.id, value_ty.clone());
                    }
                    PatternKind::Wildcard => {
                        self.types.insert(pattern.id, value_ty.clone());
                    }
                    _ => {
                        // Destructuring binds monomorphically.
                        let pat_ty = self.pattern_ty(pattern)?;
                        self.unify_pattern(pat_ty, value_ty.clone(), pattern.pos)?;
                    }
                }

                self.types.insert(stmt.id, value_ty);
                Ok(())
            }

            StmtKind::Fn {
                name, params, ret, body, ..
            } => {
                self.ctx.enter_level();
                let result = self.fn_ty(name, params, ret, body, stmt.pos);
                self.ctx.leave_level();
                let fn_ty = result?;

                let scheme = self.ctx.generalize(fn_ty.clone());
                self.env.insert(name.to_string(), scheme);
                self.types.insert(stmt.id, fn_ty);
                Ok(())
            }

            StmtKind::TypeAlias { name, ty } => {
                let resolved = self.type_from_expr(ty);
                self.aliases.insert(name.to_string(), resolved);
                Ok(())
            }

            // Flat top-level namespace; imports carry no typing information.
            StmtKind::Import { .. } => Ok(()),

            StmtKind::Expr(e) => {
                let ty = self.expr_ty(e)?;
                self.types.insert(stmt.id, ty);
                Ok(())
            }
        }
    }

    /// Infer a let right-hand side, unifying against the annotation.
    fn let_rhs_ty(
        &mut self,
        annotation: Option<&TypeExpr<'_>>,
        value: &Expr<'_>,
        pos: Pos,
    ) -> Result<Ty, TypeError> {
        let value_ty = self.expr_ty(value)?;
        if let Some(ann) = annotation {
            let ann_ty = self.type_from_expr(ann);
            self.ctx.unify(value_ty.clone(), ann_ty, pos)?;
        }
        Ok(value_ty)
    }

    /// `fn name(params) -> ret: body` checks like
    /// `let name = fix (λname. λparams. body)`: the name is pre-bound to
    /// a fresh variable so recursive calls unify against it.
    fn fn_ty(
        &mut self,
        name: &str,
        params: &[Param<'_>],
        ret: Option<&TypeExpr<'_>>,
        body: &Expr<'_>,
        pos: Pos,
    ) -> Result<Ty, TypeError> {
        let self_var = self.ctx.fresh_var();
        self.env
            .insert(name.to_string(), Scheme::mono(self_var.clone()));

        self.env.push_scope();
        let mut param_tys = Vec::new();
        for param in params {
            let param_ty = match param.ty {
                Some(ann) => self.type_from_expr(ann),
                None => self.ctx.fresh_var(),
            };
            self.env
                .insert(param.name.to_string(), Scheme::mono(param_ty.clone()));
            param_tys.push(param_ty);
        }

        let body_result = self.expr_ty(body);
        self.env.pop_scope();
        let body_ty = body_result?;

        if let Some(ann) = ret {
            let ret_ty = self.type_from_expr(ann);
            self.ctx.unify(body_ty.clone(), ret_ty, pos)?;
        }

        let fn_ty = Ty::fun(param_tys, body_ty);
        self.ctx.unify(self_var, fn_ty.clone(), pos)?;
        Ok(fn_ty)
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn expr_ty(&mut self, expr: &Expr<'_>) -> Result<Ty, TypeError> {
        let ty = self.expr_ty_inner(expr)?;
        self.types.insert(expr.id, ty.clone());
        Ok(ty)
    }

    fn expr_ty_inner(&mut self, expr: &Expr<'_>) -> Result<Ty, TypeError> {
        match expr.kind {
            ExprKind::Int(_) => Ok(Ty::int()),
            ExprKind::Float(_) => Ok(Ty::float()),
            ExprKind::Str(_) => Ok(Ty::string()),
            ExprKind::Bool(_) => Ok(Ty::bool()),

            ExprKind::Ident(name) => match self.env.lookup(name) {
                Some(scheme) => {
                    let scheme = scheme.clone();
                    Ok(self.ctx.instantiate(&scheme))
                }
                None => {
                    let err = TypeError::UnboundIdentifier {
                        name: name.to_string(),
                        pos: expr.pos,
                    };
                    self.ctx.errors.push(err.clone());
                    Err(err)
                }
            },

            ExprKind::Unary { op, operand } => {
                let operand_ty = self.expr_ty(operand)?;
                match op {
                    UnOp::Neg => {
                        self.check_numeric(&operand_ty, operand.pos)?;
                        Ok(operand_ty)
                    }
                    UnOp::Not => {
                        let scheme = self.operator_scheme("not");
                        let op_ty = self.ctx.instantiate(&scheme);
                        let ret = self.ctx.fresh_var();
                        self.ctx.unify(
                            op_ty,
                            Ty::fun(vec![operand_ty], ret.clone()),
                            operand.pos,
                        )?;
                        Ok(ret)
                    }
                }
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.expr_ty(lhs)?;
                let rhs_ty = self.expr_ty(rhs)?;

                // Operators type-check as applications of their builtin
                // scheme, instantiated fresh at every use.
                let scheme = self.operator_scheme(op.symbol());
                let op_ty = self.ctx.instantiate(&scheme);
                let ret = self.ctx.fresh_var();
                self.ctx.unify(
                    op_ty,
                    Ty::fun(vec![lhs_ty.clone(), rhs_ty], ret.clone()),
                    expr.pos,
                )?;

                // `+ - * / %` are bipartite: Int with Int, or Float with
                // Float, no implicit coercion. The scheme keeps the sides
                // equal; this pins them to a numeric type once known.
                if op.is_arithmetic() {
                    self.check_numeric(&lhs_ty, expr.pos)?;
                }
                Ok(ret)
            }

            ExprKind::Call { callee, args } => {
                let callee_ty = self.expr_ty(callee)?;

                let mut arg_tys = Vec::new();
                for arg in args {
                    arg_tys.push(self.expr_ty(arg)?);
                }

                // Concrete non-function callee is its own error.
                let resolved_callee = self.ctx.resolve(callee_ty.clone());
                match resolved_callee {
                    Ty::Con(_) | Ty::Tuple(_) | Ty::App(..) => {
                        let err = TypeError::NotAFunction {
                            ty: resolved_callee,
                            pos: callee.pos,
                        };
                        self.ctx.errors.push(err.clone());
                        return Err(err);
                    }
                    _ => {}
                }

                let ret = self.ctx.fresh_var();
                let expected = Ty::fun(arg_tys, ret.clone());
                self.ctx.unify(callee_ty, expected, expr.pos)?;
                Ok(ret)
            }

            ExprKind::Lambda { params, body } => {
                self.env.push_scope();
                let mut param_tys = Vec::new();
                for param in params {
                    let param_ty = match param.ty {
                        Some(ann) => self.type_from_expr(ann),
                        None => self.ctx.fresh_var(),
                    };
                    self.env
                        .insert(param.name.to_string(), Scheme::mono(param_ty.clone()));
                    param_tys.push(param_ty);
                }
                let body_result = self.expr_ty(body);
                self.env.pop_scope();
                let body_ty = body_result?;
                Ok(Ty::fun(param_tys, body_ty))
            }

            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_ty = self.expr_ty(cond)?;
                self.ctx.unify(cond_ty, Ty::bool(), cond.pos)?;

                let then_ty = self.expr_ty(then_branch)?;
                match else_branch {
                    Some(else_expr) => {
                        let else_ty = self.expr_ty(else_expr)?;
                        self.ctx.unify(then_ty.clone(), else_ty, expr.pos)?;
                        Ok(then_ty)
                    }
                    None => {
                        // No else: the whole form is Unit, and the then
                        // branch must be Unit too.
                        self.ctx.unify(then_ty, Ty::unit(), then_branch.pos)?;
                        Ok(Ty::unit())
                    }
                }
            }

            ExprKind::Match { scrutinee, arms } => {
                let scrutinee_ty = self.expr_ty(scrutinee)?;

                let mut result_ty: Option<Ty> = None;
                for arm in arms {
                    self.env.push_scope();
                    let arm_result = (|| -> Result<Ty, TypeError> {
                        let pat_ty = self.pattern_ty(arm.pattern)?;
                        self.unify_pattern(pat_ty, scrutinee_ty.clone(), arm.pattern.pos)?;
                        self.expr_ty(arm.body)
                    })();
                    self.env.pop_scope();
                    let body_ty = arm_result?;

                    match &result_ty {
                        Some(prev) => {
                            self.ctx.unify(prev.clone(), body_ty, arm.body.pos)?;
                        }
                        None => result_ty = Some(body_ty),
                    }
                }

                let resolved_scrutinee = self.ctx.resolve(scrutinee_ty);
                let patterns: Vec<&Pattern> = arms.iter().map(|a| a.pattern).collect();
                if !exhaustiveness::is_exhaustive(&resolved_scrutinee, &patterns) {
                    self.warnings.push(TypeError::NonExhaustiveMatch {
                        scrutinee: resolved_scrutinee,
                        pos: expr.pos,
                    });
                }

                Ok(result_ty.unwrap_or_else(Ty::unit))
            }

            ExprKind::Tuple(elems) => {
                let mut elem_tys = Vec::new();
                for elem in elems {
                    elem_tys.push(self.expr_ty(elem)?);
                }
                Ok(Ty::Tuple(elem_tys))
            }

            ExprKind::List(elems) => {
                let elem_ty = self.ctx.fresh_var();
                for elem in elems {
                    let ty = self.expr_ty(elem)?;
                    self.ctx.unify(ty, elem_ty.clone(), elem.pos)?;
                }
                Ok(Ty::list(elem_ty))
            }

            ExprKind::Block(stmts) => {
                self.env.push_scope();
                let result = (|| -> Result<Ty, TypeError> {
                    let mut last_ty = Ty::unit();
                    for stmt in stmts {
                        self.infer_stmt(stmt)?;
                        last_ty = match stmt.kind {
                            StmtKind::Expr(_) => self
                                .types
                                .get(&stmt.id)
                                .cloned()
                                .unwrap_or_else(Ty::unit),
                            _ => Ty::unit(),
                        };
                    }
                    Ok(last_ty)
                })();
                self.env.pop_scope();
                result
            }

            ExprKind::Ctor { ctor, arg } => {
                let payload_ty = match (ctor.arity(), arg) {
                    (0, None) => None,
                    (_, Some(arg_expr)) => Some(self.expr_ty(arg_expr)?),
                    (expected, None) => {
                        let err = TypeError::ArityMismatch {
                            expected,
                            found: 0,
                            pos: expr.pos,
                        };
                        self.ctx.errors.push(err.clone());
                        return Err(err);
                    }
                };
                Ok(match ctor {
                    Ctor::Some => Ty::option(payload_ty.expect("Some carries a payload")),
                    Ctor::None => Ty::option(self.ctx.fresh_var()),
                    Ctor::Ok => {
                        let e = self.ctx.fresh_var();
                        Ty::result(payload_ty.expect("Ok carries a payload"), e)
                    }
                    Ctor::Err => {
                        let t = self.ctx.fresh_var();
                        Ty::result(t, payload_ty.expect("Err carries a payload"))
                    }
                })
            }
        }
    }

    // ── Patterns ───────────────────────────────────────────────────────

    /// Infer a pattern's type and bind its variables into the current
    /// scope (monomorphically).
    fn pattern_ty(&mut self, pattern: &Pattern<'_>) -> Result<Ty, TypeError> {
        let ty = match pattern.kind {
            PatternKind::Wildcard => self.ctx.fresh_var(),
            PatternKind::Binding(name) => {
                let ty = self.ctx.fresh_var();
                self.env.insert(name.to_string(), Scheme::mono(ty.clone()));
                ty
            }
            PatternKind::Int(_) => Ty::int(),
            PatternKind::Bool(_) => Ty::bool(),
            PatternKind::Str(_) => Ty::string(),
            PatternKind::Tuple(elems) => {
                let mut elem_tys = Vec::new();
                for elem in elems {
                    elem_tys.push(self.pattern_ty(elem)?);
                }
                Ty::Tuple(elem_tys)
            }
            PatternKind::Ctor { ctor, arg } => {
                // Constructor arity must match the declaration.
                let found = arg.map(|_| 1).unwrap_or(0);
                if found != ctor.arity() {
                    let err = TypeError::ArityMismatch {
                        expected: ctor.arity(),
                        found,
                        pos: pattern.pos,
                    };
                    self.ctx.errors.push(err.clone());
                    return Err(err);
                }
                let payload = match arg {
                    Some(inner) => Some(self.pattern_ty(inner)?),
                    None => None,
                };
                match ctor {
                    Ctor::Some => Ty::option(payload.expect("Some pattern has a payload")),
                    Ctor::None => Ty::option(self.ctx.fresh_var()),
                    Ctor::Ok => {
                        let e = self.ctx.fresh_var();
                        Ty::result(payload.expect("Ok pattern has a payload"), e)
                    }
                    Ctor::Err => {
                        let t = self.ctx.fresh_var();
                        Ty::result(t, payload.expect("Err pattern has a payload"))
                    }
                }
            }
        };
        self.types.insert(pattern.id, ty.clone());
        Ok(ty)
    }

    /// Unify a pattern type against the scrutinee type, reporting a
    /// pattern-specific error on failure.
    fn unify_pattern(&mut self, pat_ty: Ty, scrut_ty: Ty, pos: Pos) -> Result<(), TypeError> {
        let recorded = self.ctx.errors.len();
        match self.ctx.unify(pat_ty.clone(), scrut_ty.clone(), pos) {
            Ok(()) => Ok(()),
            Err(_) => {
                self.ctx.errors.truncate(recorded);
                let expected = self.ctx.resolve(scrut_ty);
                let found = self.ctx.resolve(pat_ty);
                let err = TypeError::PatternTypeMismatch {
                    expected,
                    found,
                    pos,
                };
                self.ctx.errors.push(err.clone());
                Err(err)
            }
        }
    }

    // ── Annotations ────────────────────────────────────────────────────

    /// Convert a syntactic type annotation to a type term. Unknown
    /// names become nominal constructors; lowercase variables are
    /// scoped to one annotation.
    fn type_from_expr(&mut self, ty: &TypeExpr<'_>) -> Ty {
        let mut vars: FxHashMap<String, Ty> = FxHashMap::default();
        self.type_from_expr_inner(ty, &mut vars)
    }

    fn type_from_expr_inner(
        &mut self,
        ty: &TypeExpr<'_>,
        vars: &mut FxHashMap<String, Ty>,
    ) -> Ty {
        match ty.kind {
            TypeExprKind::Named(name) => match name {
                "Int" => Ty::int(),
                "Float" => Ty::float(),
                "Bool" => Ty::bool(),
                "String" => Ty::string(),
                "Unit" => Ty::unit(),
                other => {
                    if let Some(aliased) = self.aliases.get(other) {
                        aliased.clone()
                    } else {
                        Ty::Con(TyCon::new(other))
                    }
                }
            },
            TypeExprKind::Var(name) => vars
                .entry(name.to_string())
                .or_insert_with(|| self.ctx.fresh_var())
                .clone(),
            TypeExprKind::Fun(params, ret) => {
                let params = params
                    .iter()
                    .map(|p| self.type_from_expr_inner(p, vars))
                    .collect();
                let ret = self.type_from_expr_inner(ret, vars);
                Ty::Fun(params, Box::new(ret))
            }
            TypeExprKind::Tuple(elems) => Ty::Tuple(
                elems
                    .iter()
                    .map(|e| self.type_from_expr_inner(e, vars))
                    .collect(),
            ),
            TypeExprKind::List(elem) => Ty::list(self.type_from_expr_inner(elem, vars)),
        }
    }

    // ── Operators ──────────────────────────────────────────────────────

    /// The scheme an operator symbol was registered with. Operators are
    /// keywords, so user code can never shadow these entries.
    fn operator_scheme(&self, symbol: &str) -> Scheme {
        self.env
            .lookup(symbol)
            .cloned()
            .expect("operator schemes are registered with the builtins")
    }

    // ── Numeric constraint ─────────────────────────────────────────────

    /// Arithmetic operands must (once known) be Int or Float.
    fn check_numeric(&mut self, ty: &Ty, pos: Pos) -> Result<(), TypeError> {
        let resolved = self.ctx.resolve(ty.clone());
        match &resolved {
            Ty::Var(_) | Ty::Error => Ok(()),
            Ty::Con(c) if c.name == "Int" || c.name == "Float" => Ok(()),
            _ => {
                let err = TypeError::Mismatch {
                    expected: Ty::int(),
                    found: resolved,
                    pos,
                };
                self.ctx.errors.push(err.clone());
                Err(err)
            }
        }
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}
