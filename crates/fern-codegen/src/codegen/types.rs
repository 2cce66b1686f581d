//! Fern-type to QBE-type mapping.
//!
//! QBE has four base types; Fern uses three of them: `w` (32-bit word)
//! for Int/Bool arithmetic, `l` (64-bit long) for pointers and for
//! integers crossing function boundaries, and `d` (double) for Float.
//! Unit values have no QBE representation at all.
//!
//! QBE's integer subtyping means an `l` value can be used directly
//! where a `w` operand is expected (the low 32 bits are read); widening
//! `w` to `l` requires an explicit `extsw`.

use std::fmt;

use fern_typeck::Ty;

/// A QBE base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QbeTy {
    /// 32-bit word.
    W,
    /// 64-bit long (also pointers).
    L,
    /// 64-bit IEEE double.
    D,
}

impl fmt::Display for QbeTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QbeTy::W => write!(f, "w"),
            QbeTy::L => write!(f, "l"),
            QbeTy::D => write!(f, "d"),
        }
    }
}

/// An SSA value: the temporary (or symbol) holding it, plus its type.
#[derive(Debug, Clone)]
pub struct Value {
    pub repr: String,
    pub ty: QbeTy,
}

impl Value {
    pub fn new(repr: impl Into<String>, ty: QbeTy) -> Self {
        Value {
            repr: repr.into(),
            ty,
        }
    }
}

/// The in-function operating type for a Fern type. `None` is unit.
pub fn value_ty(ty: &Ty) -> Option<QbeTy> {
    match ty {
        Ty::Con(c) if c.name == "Int" || c.name == "Bool" => Some(QbeTy::W),
        Ty::Con(c) if c.name == "Float" => Some(QbeTy::D),
        Ty::Tuple(elems) if elems.is_empty() => None,
        // Strings, lists, options/results, tuples, functions, nominal
        // types, and unresolved variables are all pointer-sized.
        _ => Some(QbeTy::L),
    }
}

/// The ABI type used when a value crosses a function boundary:
/// integers widen to `l`, floats stay `d`, unit disappears.
pub fn abi_ty(ty: &Ty) -> Option<QbeTy> {
    match value_ty(ty) {
        Some(QbeTy::W) => Some(QbeTy::L),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_and_bool_operate_on_words() {
        assert_eq!(value_ty(&Ty::int()), Some(QbeTy::W));
        assert_eq!(value_ty(&Ty::bool()), Some(QbeTy::W));
    }

    #[test]
    fn floats_are_doubles() {
        assert_eq!(value_ty(&Ty::float()), Some(QbeTy::D));
        assert_eq!(abi_ty(&Ty::float()), Some(QbeTy::D));
    }

    #[test]
    fn pointers_are_longs() {
        assert_eq!(value_ty(&Ty::string()), Some(QbeTy::L));
        assert_eq!(value_ty(&Ty::list(Ty::int())), Some(QbeTy::L));
        assert_eq!(value_ty(&Ty::option(Ty::int())), Some(QbeTy::L));
    }

    #[test]
    fn unit_has_no_representation() {
        assert_eq!(value_ty(&Ty::unit()), None);
        assert_eq!(abi_ty(&Ty::unit()), None);
    }

    #[test]
    fn integers_widen_at_the_abi() {
        assert_eq!(abi_ty(&Ty::int()), Some(QbeTy::L));
        assert_eq!(abi_ty(&Ty::bool()), Some(QbeTy::L));
    }
}
