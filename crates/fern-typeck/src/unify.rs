//! Unification engine for Hindley-Milner type inference.
//!
//! Implements the core unification algorithm using `ena`'s union-find
//! table. Supports the occurs check (recursive type detection),
//! level-based generalization, and scheme instantiation.

use ena::unify::InPlaceUnificationTable;
use fern_common::Pos;
use rustc_hash::FxHashMap;

use crate::error::TypeError;
use crate::ty::{Scheme, Ty, TyVar};

/// The inference context -- owns the unification table, level state, and
/// the collected errors.
///
/// All type inference happens through this context. It creates fresh
/// type variables, unifies types, tracks levels for generalization, and
/// records errors.
pub struct InferCtx {
    /// The union-find unification table.
    table: InPlaceUnificationTable<TyVar>,
    /// Current let-nesting level for generalization.
    current_level: u32,
    /// Level at which each type variable was created, indexed by `TyVar.0`.
    var_levels: Vec<u32>,
    /// Type errors accumulated during inference.
    pub errors: Vec<TypeError>,
}

impl InferCtx {
    pub fn new() -> Self {
        InferCtx {
            table: InPlaceUnificationTable::new(),
            current_level: 0,
            var_levels: Vec::new(),
            errors: Vec::new(),
        }
    }

    // ── Type variable creation ──────────────────────────────────────────

    /// Create a fresh type variable at the current level.
    pub fn fresh_var(&mut self) -> Ty {
        let var = self.table.new_key(None);
        while self.var_levels.len() <= var.0 as usize {
            self.var_levels.push(0);
        }
        self.var_levels[var.0 as usize] = self.current_level;
        Ty::Var(var)
    }

    /// The creation (or unioned) level of a variable.
    pub fn level_of(&self, var: TyVar) -> u32 {
        self.var_levels.get(var.0 as usize).copied().unwrap_or(0)
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// Resolve a type by following union-find indirection.
    ///
    /// Bound variables are replaced by their solutions recursively;
    /// unbound variables normalize to their root key so variables in the
    /// same equivalence class compare equal after resolution.
    pub fn resolve(&mut self, ty: Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.table.probe_value(v) {
                Some(inner) => self.resolve(inner),
                None => Ty::Var(self.table.find(v)),
            },
            Ty::Fun(params, ret) => {
                let params = params.into_iter().map(|p| self.resolve(p)).collect();
                let ret = Box::new(self.resolve(*ret));
                Ty::Fun(params, ret)
            }
            Ty::App(con, args) => {
                let con = Box::new(self.resolve(*con));
                let args = args.into_iter().map(|a| self.resolve(a)).collect();
                Ty::App(con, args)
            }
            Ty::Tuple(elems) => {
                let elems = elems.into_iter().map(|e| self.resolve(e)).collect();
                Ty::Tuple(elems)
            }
            other => other,
        }
    }

    // ── Occurs check ────────────────────────────────────────────────────

    /// Check whether a type variable occurs anywhere within a type.
    ///
    /// Prevents recursive solutions like `a ~ (a) -> Int`, which have no
    /// finite representation.
    pub fn occurs_in(&mut self, var: TyVar, ty: &Ty) -> bool {
        match ty {
            Ty::Var(v) => {
                if self.table.find(*v) == self.table.find(var) {
                    return true;
                }
                match self.table.probe_value(*v) {
                    Some(inner) => self.occurs_in(var, &inner),
                    None => false,
                }
            }
            Ty::Con(_) | Ty::Error => false,
            Ty::Fun(params, ret) => {
                params.iter().any(|p| self.occurs_in(var, p)) || self.occurs_in(var, ret)
            }
            Ty::App(con, args) => {
                self.occurs_in(var, con) || args.iter().any(|a| self.occurs_in(var, a))
            }
            Ty::Tuple(elems) => elems.iter().any(|e| self.occurs_in(var, e)),
        }
    }

    // ── Unification ─────────────────────────────────────────────────────

    /// Unify two types, making them equal.
    ///
    /// Both types are resolved through the union-find table, then
    /// structurally compared. Failures are recorded in `errors` and
    /// returned. Unification is symmetric: `unify(a, b)` and
    /// `unify(b, a)` succeed or fail together.
    pub fn unify(&mut self, a: Ty, b: Ty, pos: Pos) -> Result<(), TypeError> {
        let a = self.resolve(a);
        let b = self.resolve(b);

        match (a, b) {
            // Two identical variables -- already unified.
            (Ty::Var(v1), Ty::Var(v2)) if v1 == v2 => Ok(()),

            // Variable meets variable -- union them, keeping the lower
            // level on the root so escaping variables never generalize.
            (Ty::Var(v1), Ty::Var(v2)) => {
                let min_level = self.level_of(v1).min(self.level_of(v2));
                self.table
                    .unify_var_var(v1, v2)
                    .expect("unifying two unbound vars cannot fail");
                let root = self.table.find(v1);
                self.var_levels[root.0 as usize] = min_level;
                Ok(())
            }

            // The error placeholder unifies with anything and binds
            // nothing, so one failure does not contaminate later
            // inference.
            (Ty::Error, _) | (_, Ty::Error) => Ok(()),

            // Variable meets concrete type -- bind it (occurs check first).
            (Ty::Var(v), ty) | (ty, Ty::Var(v)) => {
                if self.occurs_in(v, &ty) {
                    let err = TypeError::RecursiveType { var: v, ty, pos };
                    self.errors.push(err.clone());
                    Err(err)
                } else {
                    self.table
                        .unify_var_value(v, Some(ty))
                        .expect("binding an unbound var after the occurs check cannot fail");
                    Ok(())
                }
            }

            // Concrete constructor meets concrete constructor.
            (Ty::Con(c1), Ty::Con(c2)) => {
                if c1 == c2 {
                    Ok(())
                } else {
                    let err = TypeError::Mismatch {
                        expected: Ty::Con(c1),
                        found: Ty::Con(c2),
                        pos,
                    };
                    self.errors.push(err.clone());
                    Err(err)
                }
            }

            // Function types -- params pairwise, then returns.
            (Ty::Fun(p1, r1), Ty::Fun(p2, r2)) => {
                if p1.len() != p2.len() {
                    let err = TypeError::ArityMismatch {
                        expected: p1.len(),
                        found: p2.len(),
                        pos,
                    };
                    self.errors.push(err.clone());
                    Err(err)
                } else {
                    for (a, b) in p1.into_iter().zip(p2.into_iter()) {
                        self.unify(a, b, pos)?;
                    }
                    self.unify(*r1, *r2, pos)
                }
            }

            // Type applications -- constructor, then args.
            (Ty::App(c1, a1), Ty::App(c2, a2)) => {
                self.unify(*c1, *c2, pos)?;
                if a1.len() != a2.len() {
                    let err = TypeError::ArityMismatch {
                        expected: a1.len(),
                        found: a2.len(),
                        pos,
                    };
                    self.errors.push(err.clone());
                    Err(err)
                } else {
                    for (a, b) in a1.into_iter().zip(a2.into_iter()) {
                        self.unify(a, b, pos)?;
                    }
                    Ok(())
                }
            }

            // Tuples -- element-wise.
            (Ty::Tuple(e1), Ty::Tuple(e2)) => {
                if e1.len() != e2.len() {
                    let err = TypeError::ArityMismatch {
                        expected: e1.len(),
                        found: e2.len(),
                        pos,
                    };
                    self.errors.push(err.clone());
                    Err(err)
                } else {
                    for (a, b) in e1.into_iter().zip(e2.into_iter()) {
                        self.unify(a, b, pos)?;
                    }
                    Ok(())
                }
            }

            // Everything else is a mismatch.
            (a, b) => {
                let err = TypeError::Mismatch {
                    expected: a,
                    found: b,
                    pos,
                };
                self.errors.push(err.clone());
                Err(err)
            }
        }
    }

    // ── Level management ────────────────────────────────────────────────

    /// Enter a new let-binding level.
    pub fn enter_level(&mut self) {
        self.current_level += 1;
    }

    /// Leave the current let-binding level.
    pub fn leave_level(&mut self) {
        debug_assert!(self.current_level > 0, "cannot leave level 0");
        self.current_level -= 1;
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    // ── Generalization ──────────────────────────────────────────────────

    /// Generalize a type into a polymorphic scheme.
    ///
    /// Quantifies every unbound variable whose level is strictly greater
    /// than the current level -- exactly the variables introduced by the
    /// binding being generalized, and none that escaped outward.
    pub fn generalize(&mut self, ty: Ty) -> Scheme {
        let resolved = self.resolve(ty);
        let mut vars = Vec::new();
        self.collect_generalizable(&resolved, &mut vars);
        let mut seen = std::collections::HashSet::new();
        vars.retain(|v| seen.insert(*v));
        Scheme { vars, ty: resolved }
    }

    fn collect_generalizable(&mut self, ty: &Ty, out: &mut Vec<TyVar>) {
        match ty {
            Ty::Var(v) => match self.table.probe_value(*v) {
                Some(inner) => self.collect_generalizable(&inner, out),
                None => {
                    if self.level_of(*v) > self.current_level {
                        out.push(self.table.find(*v));
                    }
                }
            },
            Ty::Con(_) | Ty::Error => {}
            Ty::Fun(params, ret) => {
                for p in params {
                    self.collect_generalizable(p, out);
                }
                self.collect_generalizable(ret, out);
            }
            Ty::App(con, args) => {
                self.collect_generalizable(con, out);
                for a in args {
                    self.collect_generalizable(a, out);
                }
            }
            Ty::Tuple(elems) => {
                for e in elems {
                    self.collect_generalizable(e, out);
                }
            }
        }
    }

    // ── Instantiation ───────────────────────────────────────────────────

    /// Instantiate a polymorphic scheme with fresh type variables at the
    /// current level.
    pub fn instantiate(&mut self, scheme: &Scheme) -> Ty {
        if scheme.vars.is_empty() {
            return scheme.ty.clone();
        }
        let substitution: FxHashMap<TyVar, Ty> = scheme
            .vars
            .iter()
            .map(|v| (*v, self.fresh_var()))
            .collect();
        self.apply_substitution(&scheme.ty, &substitution)
    }

    fn apply_substitution(&mut self, ty: &Ty, subst: &FxHashMap<TyVar, Ty>) -> Ty {
        match ty {
            Ty::Var(v) => {
                let root = self.table.find(*v);
                if let Some(replacement) = subst.get(&root).or_else(|| subst.get(v)) {
                    return replacement.clone();
                }
                match self.table.probe_value(*v) {
                    Some(inner) => self.apply_substitution(&inner, subst),
                    None => ty.clone(),
                }
            }
            Ty::Con(_) | Ty::Error => ty.clone(),
            Ty::Fun(params, ret) => {
                let params = params
                    .iter()
                    .map(|p| self.apply_substitution(p, subst))
                    .collect();
                let ret = Box::new(self.apply_substitution(ret, subst));
                Ty::Fun(params, ret)
            }
            Ty::App(con, args) => {
                let con = Box::new(self.apply_substitution(con, subst));
                let args = args
                    .iter()
                    .map(|a| self.apply_substitution(a, subst))
                    .collect();
                Ty::App(con, args)
            }
            Ty::Tuple(elems) => {
                let elems = elems
                    .iter()
                    .map(|e| self.apply_substitution(e, subst))
                    .collect();
                Ty::Tuple(elems)
            }
        }
    }
}

impl Default for InferCtx {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> Pos {
        Pos::new(1, 1)
    }

    #[test]
    fn unify_two_fresh_vars() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();

        assert!(ctx.unify(a.clone(), b.clone(), here()).is_ok());

        // Binding one should resolve both.
        assert!(ctx.unify(a.clone(), Ty::int(), here()).is_ok());
        assert_eq!(ctx.resolve(a), Ty::int());
        assert_eq!(ctx.resolve(b), Ty::int());
    }

    #[test]
    fn unify_var_with_concrete() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        assert!(ctx.unify(a.clone(), Ty::int(), here()).is_ok());
        assert_eq!(ctx.resolve(a), Ty::int());
    }

    #[test]
    fn unify_mismatch() {
        let mut ctx = InferCtx::new();
        let result = ctx.unify(Ty::int(), Ty::string(), here());
        match result.unwrap_err() {
            TypeError::Mismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, Ty::int());
                assert_eq!(found, Ty::string());
            }
            other => panic!("expected Mismatch, got {:?}", other),
        }
        assert_eq!(ctx.errors.len(), 1);
    }

    #[test]
    fn unify_commutes() {
        // unify(a, b) and unify(b, a) agree on success and failure.
        let mut ctx1 = InferCtx::new();
        let mut ctx2 = InferCtx::new();

        let f1 = Ty::fun(vec![Ty::int()], Ty::string());
        let f2 = Ty::fun(vec![Ty::int()], Ty::string());
        assert!(ctx1.unify(f1.clone(), f2.clone(), here()).is_ok());
        assert!(ctx2.unify(f2, f1, here()).is_ok());

        assert_eq!(
            ctx1.unify(Ty::int(), Ty::bool(), here()).is_err(),
            ctx2.unify(Ty::bool(), Ty::int(), here()).is_err()
        );

        // Both orders produce the same substitution.
        let mut ctx3 = InferCtx::new();
        let v = ctx3.fresh_var();
        ctx3.unify(v.clone(), Ty::int(), here()).unwrap();
        let forward = ctx3.resolve(v);

        let mut ctx4 = InferCtx::new();
        let w = ctx4.fresh_var();
        ctx4.unify(Ty::int(), w.clone(), here()).unwrap();
        let backward = ctx4.resolve(w);

        assert_eq!(forward, backward);
    }

    #[test]
    fn occurs_check_rejects_recursive_type() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let fun = Ty::fun(vec![a.clone()], Ty::int());
        match ctx.unify(a, fun, here()).unwrap_err() {
            TypeError::RecursiveType { .. } => {}
            other => panic!("expected RecursiveType, got {:?}", other),
        }
    }

    #[test]
    fn occurs_check_through_links() {
        // a ~ b, then b ~ (a) -> Int must still be rejected.
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();
        ctx.unify(a.clone(), b.clone(), here()).unwrap();
        let fun = Ty::fun(vec![a], Ty::int());
        assert!(matches!(
            ctx.unify(b, fun, here()).unwrap_err(),
            TypeError::RecursiveType { .. }
        ));
    }

    #[test]
    fn generalize_then_instantiate_round_trips() {
        let mut ctx = InferCtx::new();

        ctx.enter_level();
        let a = ctx.fresh_var();
        let identity = Ty::fun(vec![a.clone()], a);
        ctx.leave_level();

        let scheme = ctx.generalize(identity);
        assert_eq!(scheme.vars.len(), 1, "one quantified var");

        // Two instantiations produce structurally equal types with
        // distinct fresh variables.
        let inst1 = ctx.instantiate(&scheme);
        let inst2 = ctx.instantiate(&scheme);
        match (&inst1, &inst2) {
            (Ty::Fun(p1, r1), Ty::Fun(p2, r2)) => {
                assert_eq!(p1[0], **r1, "identity shape preserved");
                assert_eq!(p2[0], **r2, "identity shape preserved");
                assert_ne!(p1[0], p2[0], "instantiations are independent");
            }
            _ => panic!("expected function types"),
        }
    }

    #[test]
    fn variables_at_outer_level_do_not_generalize() {
        let mut ctx = InferCtx::new();

        // Created at level 0, observed at level 0: not generalizable.
        let outer = ctx.fresh_var();
        let scheme = ctx.generalize(outer.clone());
        assert!(scheme.vars.is_empty());

        // Var-var unification keeps the minimum level on the root.
        ctx.enter_level();
        let inner = ctx.fresh_var();
        ctx.unify(inner.clone(), outer, here()).unwrap();
        ctx.leave_level();
        let scheme = ctx.generalize(inner);
        assert!(
            scheme.vars.is_empty(),
            "a variable that escaped to the outer level must not generalize"
        );
    }

    #[test]
    fn unify_function_arity_mismatch() {
        let mut ctx = InferCtx::new();
        let f1 = Ty::fun(vec![Ty::int()], Ty::string());
        let f2 = Ty::fun(vec![Ty::int(), Ty::int()], Ty::string());
        assert!(matches!(
            ctx.unify(f1, f2, here()).unwrap_err(),
            TypeError::ArityMismatch {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn error_placeholder_unifies_with_anything() {
        let mut ctx = InferCtx::new();
        assert!(ctx.unify(Ty::Error, Ty::int(), here()).is_ok());
        assert!(ctx.unify(Ty::string(), Ty::Error, here()).is_ok());
    }

    #[test]
    fn unify_option_types() {
        let mut ctx = InferCtx::new();
        assert!(ctx
            .unify(Ty::option(Ty::int()), Ty::option(Ty::int()), here())
            .is_ok());
        assert!(ctx
            .unify(Ty::option(Ty::int()), Ty::option(Ty::string()), here())
            .is_err());
    }

    #[test]
    fn ty_display() {
        assert_eq!(Ty::int().to_string(), "Int");
        assert_eq!(
            Ty::fun(vec![Ty::int(), Ty::string()], Ty::bool()).to_string(),
            "(Int, String) -> Bool"
        );
        assert_eq!(Ty::option(Ty::int()).to_string(), "Option<Int>");
        assert_eq!(Ty::list(Ty::int()).to_string(), "[Int]");
        assert_eq!(Ty::unit().to_string(), "()");
    }
}
