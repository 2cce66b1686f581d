//! The Fern abstract syntax tree.
//!
//! All nodes are arena-allocated tagged sums; child links are arena
//! references and child sequences are arena slices, so the whole tree
//! shares the arena's lifetime and is freed with it. Every expression,
//! statement, and pattern carries a [`NodeId`] -- a dense per-parse index
//! used by the checker and emitter to key side tables -- plus its source
//! position.

use fern_common::Pos;

/// Dense per-parse node index. Assigned monotonically by the parser;
/// unique across expressions, statements, and patterns of one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

// ── Expressions ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expr<'a> {
    pub kind: ExprKind<'a>,
    pub pos: Pos,
    pub id: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExprKind<'a> {
    Int(i64),
    Float(f64),
    Str(&'a str),
    Bool(bool),
    Ident(&'a str),
    Unary {
        op: UnOp,
        operand: &'a Expr<'a>,
    },
    Binary {
        op: BinOp,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    },
    Call {
        callee: &'a Expr<'a>,
        args: &'a [Expr<'a>],
    },
    Lambda {
        params: &'a [Param<'a>],
        body: &'a Expr<'a>,
    },
    If {
        cond: &'a Expr<'a>,
        then_branch: &'a Expr<'a>,
        else_branch: Option<&'a Expr<'a>>,
    },
    Match {
        scrutinee: &'a Expr<'a>,
        arms: &'a [MatchArm<'a>],
    },
    Tuple(&'a [Expr<'a>]),
    List(&'a [Expr<'a>]),
    /// A layout block: statements with the last expression as the value.
    Block(&'a [Stmt<'a>]),
    /// `Ok(e)`, `Err(e)`, `Some(e)`, `None`.
    Ctor {
        ctor: Ctor,
        arg: Option<&'a Expr<'a>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Pow => "**",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem
        )
    }
}

/// The built-in option/result constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ctor {
    Ok,
    Err,
    Some,
    None,
}

impl Ctor {
    pub fn name(self) -> &'static str {
        match self {
            Ctor::Ok => "Ok",
            Ctor::Err => "Err",
            Ctor::Some => "Some",
            Ctor::None => "None",
        }
    }

    /// Number of payload values the constructor takes.
    pub fn arity(self) -> usize {
        match self {
            Ctor::None => 0,
            _ => 1,
        }
    }
}

/// A function or lambda parameter: name with optional type annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param<'a> {
    pub name: &'a str,
    pub ty: Option<&'a TypeExpr<'a>>,
    pub pos: Pos,
}

/// One `pattern -> expr` arm of a match expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchArm<'a> {
    pub pattern: &'a Pattern<'a>,
    pub body: &'a Expr<'a>,
}

// ── Statements ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stmt<'a> {
    pub kind: StmtKind<'a>,
    pub pos: Pos,
    pub id: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StmtKind<'a> {
    /// `let pattern [: type] = expr`
    Let {
        pattern: &'a Pattern<'a>,
        ty: Option<&'a TypeExpr<'a>>,
        value: &'a Expr<'a>,
    },
    /// `["pub"] fn name(params) [-> type]: body`
    Fn {
        name: &'a str,
        params: &'a [Param<'a>],
        ret: Option<&'a TypeExpr<'a>>,
        body: &'a Expr<'a>,
        is_pub: bool,
    },
    /// `type name = typeexpr`
    TypeAlias {
        name: &'a str,
        ty: &'a TypeExpr<'a>,
    },
    /// `import a.b.c`
    Import { path: &'a str },
    /// A bare expression statement.
    Expr(&'a Expr<'a>),
}

// ── Patterns ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pattern<'a> {
    pub kind: PatternKind<'a>,
    pub pos: Pos,
    pub id: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternKind<'a> {
    /// `_`
    Wildcard,
    /// An identifier binder.
    Binding(&'a str),
    Int(i64),
    Bool(bool),
    Str(&'a str),
    Tuple(&'a [Pattern<'a>]),
    /// `Some x`, `Ok y`, `Err e`, `None`.
    Ctor {
        ctor: Ctor,
        arg: Option<&'a Pattern<'a>>,
    },
}

impl<'a> Pattern<'a> {
    /// Whether the pattern matches unconditionally.
    pub fn is_irrefutable(&self) -> bool {
        match self.kind {
            PatternKind::Wildcard | PatternKind::Binding(_) => true,
            PatternKind::Tuple(elems) => elems.iter().all(|p| p.is_irrefutable()),
            _ => false,
        }
    }
}

// ── Type expressions ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeExpr<'a> {
    pub kind: TypeExprKind<'a>,
    pub pos: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeExprKind<'a> {
    /// `Int`, `Float`, `Bool`, `String`, or a user-defined name.
    Named(&'a str),
    /// `T1 -> T2`; a tuple on the left supplies multiple parameters.
    Fun(&'a [TypeExpr<'a>], &'a TypeExpr<'a>),
    /// `(T1, T2)`; the empty tuple `()` is the unit type.
    Tuple(&'a [TypeExpr<'a>]),
    /// `[T]`
    List(&'a TypeExpr<'a>),
    /// A lowercase type variable, e.g. `a` in `type Pair = (a, a)`.
    Var(&'a str),
}
