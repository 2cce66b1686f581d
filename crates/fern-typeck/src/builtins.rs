//! Built-in environment registration.
//!
//! Pre-populates the global scope with the operator schemes and the
//! runtime-exposed helpers every Fern program can call. The checker
//! instantiates these entries at each use site: binary and unary
//! operators type-check as ordinary applications of their scheme, and
//! `print`/`str_*`/`list_*`/`pow` resolve like any other identifier.
//!
//! Numeric operators are bipartite -- `(Int, Int) -> Int` or
//! `(Float, Float) -> Float` with no implicit coercion -- expressed as
//! `forall a. (a, a) -> a` schemes here, with the checker pinning `a`
//! to a numeric type once it is known.

use crate::env::TypeEnv;
use crate::ty::{Scheme, Ty, TyVar};
use crate::unify::InferCtx;

/// The `TyVar` inside a freshly created variable.
fn ty_var(ty: &Ty) -> TyVar {
    match ty {
        Ty::Var(v) => *v,
        _ => unreachable!("fresh_var returns a variable"),
    }
}

/// `forall a. (a, a) -> a` -- arithmetic keeps both operands and the
/// result at one type.
fn arithmetic_scheme(ctx: &mut InferCtx) -> Scheme {
    let a = ctx.fresh_var();
    Scheme {
        vars: vec![ty_var(&a)],
        ty: Ty::fun(vec![a.clone(), a.clone()], a),
    }
}

/// `forall a. (a, a) -> Bool` -- comparisons accept any matching pair.
fn comparison_scheme(ctx: &mut InferCtx) -> Scheme {
    let a = ctx.fresh_var();
    Scheme {
        vars: vec![ty_var(&a)],
        ty: Ty::fun(vec![a.clone(), a], Ty::bool()),
    }
}

/// Register all built-in operators and runtime helpers.
pub fn register_builtins(ctx: &mut InferCtx, env: &mut TypeEnv) {
    // ── Operators ───────────────────────────────────────────────────

    for op in ["+", "-", "*", "/", "%"] {
        let scheme = arithmetic_scheme(ctx);
        env.insert(op.into(), scheme);
    }

    // `**` always works on floats and yields a float.
    env.insert(
        "**".into(),
        Scheme::mono(Ty::fun(vec![Ty::float(), Ty::float()], Ty::float())),
    );

    for op in ["==", "!=", "<", ">", "<=", ">="] {
        let scheme = comparison_scheme(ctx);
        env.insert(op.into(), scheme);
    }

    let bool_binop = Scheme::mono(Ty::fun(vec![Ty::bool(), Ty::bool()], Ty::bool()));
    env.insert("and".into(), bool_binop.clone());
    env.insert("or".into(), bool_binop);
    env.insert(
        "not".into(),
        Scheme::mono(Ty::fun(vec![Ty::bool()], Ty::bool())),
    );

    // ── Printing ────────────────────────────────────────────────────

    // Polymorphic in the argument; codegen dispatches on the checked
    // argument type.
    for name in ["print", "println"] {
        let a = ctx.fresh_var();
        env.insert(
            name.into(),
            Scheme {
                vars: vec![ty_var(&a)],
                ty: Ty::fun(vec![a], Ty::unit()),
            },
        );
    }

    // ── Strings ─────────────────────────────────────────────────────

    env.insert(
        "str_len".into(),
        Scheme::mono(Ty::fun(vec![Ty::string()], Ty::int())),
    );
    env.insert(
        "str_concat".into(),
        Scheme::mono(Ty::fun(vec![Ty::string(), Ty::string()], Ty::string())),
    );
    env.insert(
        "str_eq".into(),
        Scheme::mono(Ty::fun(vec![Ty::string(), Ty::string()], Ty::bool())),
    );

    // ── Lists ───────────────────────────────────────────────────────

    {
        let a = ctx.fresh_var();
        env.insert(
            "list_len".into(),
            Scheme {
                vars: vec![ty_var(&a)],
                ty: Ty::fun(vec![Ty::list(a)], Ty::int()),
            },
        );
    }
    {
        let a = ctx.fresh_var();
        env.insert(
            "list_get".into(),
            Scheme {
                vars: vec![ty_var(&a)],
                ty: Ty::fun(vec![Ty::list(a.clone()), Ty::int()], a),
            },
        );
    }
    {
        let a = ctx.fresh_var();
        env.insert(
            "list_push".into(),
            Scheme {
                vars: vec![ty_var(&a)],
                ty: Ty::fun(vec![Ty::list(a.clone()), a.clone()], Ty::list(a)),
            },
        );
    }

    // ── Numeric helpers ─────────────────────────────────────────────

    env.insert(
        "pow".into(),
        Scheme::mono(Ty::fun(vec![Ty::float(), Ty::float()], Ty::float())),
    );
}

/// Names the emitter resolves to runtime calls rather than user
/// functions.
pub fn is_runtime_builtin(name: &str) -> bool {
    matches!(
        name,
        "print"
            | "println"
            | "str_len"
            | "str_concat"
            | "str_eq"
            | "list_len"
            | "list_get"
            | "list_push"
            | "pow"
    )
}
