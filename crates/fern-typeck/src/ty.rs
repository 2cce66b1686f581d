//! Type representation for the Fern type system.
//!
//! Defines the core `Ty` enum, type constructors (`TyCon`), type
//! variables (`TyVar`), and polymorphic type schemes (`Scheme`). These
//! form the foundation of Hindley-Milner type inference.

use std::fmt;

/// A type variable, identified by a `u32` index into the unification table.
///
/// Type variables are created during inference and unified with concrete
/// types or other variables. The `ena` crate handles the union-find
/// mechanics; variable state lives in an index-keyed table, never in the
/// type terms themselves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TyVar(pub u32);

/// A type constructor -- a named type like `Int`, `String`, `Option`.
///
/// Nullary constructors are primitives or user-defined nominal types;
/// parameterized ones (`Option`, `Result`, `List`) appear applied via
/// [`Ty::App`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TyCon {
    pub name: String,
}

impl TyCon {
    pub fn new(name: impl Into<String>) -> Self {
        TyCon { name: name.into() }
    }
}

impl fmt::Display for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A Fern type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// A type variable (unresolved during inference).
    Var(TyVar),
    /// A concrete type constructor (`Int`, `String`, `Bool`, ...).
    Con(TyCon),
    /// A function type: `(param_types) -> return_type`.
    Fun(Vec<Ty>, Box<Ty>),
    /// A type constructor applied to arguments: `Option<Int>`, `List<T>`.
    App(Box<Ty>, Vec<Ty>),
    /// A tuple type; the empty tuple is the unit type.
    Tuple(Vec<Ty>),
    /// The placeholder assigned to expressions that failed to check.
    /// Unifies with everything so one mistake does not cascade.
    Error,
}

impl Ty {
    pub fn int() -> Ty {
        Ty::Con(TyCon::new("Int"))
    }

    pub fn float() -> Ty {
        Ty::Con(TyCon::new("Float"))
    }

    pub fn string() -> Ty {
        Ty::Con(TyCon::new("String"))
    }

    pub fn bool() -> Ty {
        Ty::Con(TyCon::new("Bool"))
    }

    /// The unit type, written `()`.
    pub fn unit() -> Ty {
        Ty::Tuple(Vec::new())
    }

    pub fn option(inner: Ty) -> Ty {
        Ty::App(Box::new(Ty::Con(TyCon::new("Option"))), vec![inner])
    }

    pub fn result(ok: Ty, err: Ty) -> Ty {
        Ty::App(Box::new(Ty::Con(TyCon::new("Result"))), vec![ok, err])
    }

    pub fn list(elem: Ty) -> Ty {
        Ty::App(Box::new(Ty::Con(TyCon::new("List"))), vec![elem])
    }

    pub fn fun(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Fun(params, Box::new(ret))
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Ty::Tuple(elems) if elems.is_empty())
    }

    /// Whether this is the named primitive `name` (`Int`, `Float`, ...).
    pub fn is_con(&self, name: &str) -> bool {
        matches!(self, Ty::Con(c) if c.name == name)
    }

    /// Whether `Ty::Error` occurs anywhere in the term.
    pub fn contains_error(&self) -> bool {
        match self {
            Ty::Error => true,
            Ty::Var(_) | Ty::Con(_) => false,
            Ty::Fun(params, ret) => {
                params.iter().any(Ty::contains_error) || ret.contains_error()
            }
            Ty::App(con, args) => con.contains_error() || args.iter().any(Ty::contains_error),
            Ty::Tuple(elems) => elems.iter().any(Ty::contains_error),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "?{}", v.0),
            Ty::Con(c) => write!(f, "{}", c),
            Ty::Fun(params, ret) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Ty::App(con, args) => {
                // Lists print with the bracket sugar.
                if let Ty::Con(c) = con.as_ref() {
                    if c.name == "List" && args.len() == 1 {
                        return write!(f, "[{}]", args[0]);
                    }
                }
                write!(f, "{}", con)?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", a)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Ty::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
            Ty::Error => write!(f, "<error>"),
        }
    }
}

/// A polymorphic type scheme: a type with universally quantified variables.
///
/// The type of the identity function is `forall a. (a) -> a`, represented
/// as `Scheme { vars: [a], ty: Fun([Var(a)], Var(a)) }`. Monotypes have an
/// empty quantifier list.
#[derive(Clone, Debug)]
pub struct Scheme {
    /// The quantified (generic) type variables.
    pub vars: Vec<TyVar>,
    /// The underlying type (may reference `vars`).
    pub ty: Ty,
}

impl Scheme {
    /// Create a monomorphic scheme (no quantified variables).
    pub fn mono(ty: Ty) -> Self {
        Scheme {
            vars: Vec::new(),
            ty,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.vars.is_empty() {
            write!(f, "forall")?;
            for v in &self.vars {
                write!(f, " ?{}", v.0)?;
            }
            write!(f, ". ")?;
        }
        write!(f, "{}", self.ty)
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for TyVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}
