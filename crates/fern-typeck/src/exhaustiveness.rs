//! Shallow match-exhaustiveness analysis.
//!
//! Fern warns on non-exhaustive matches but still compiles them (the
//! emitted cascade falls through to a runtime panic). The analysis is
//! deliberately shallow: a match is considered covered when some arm is
//! irrefutable, or when the scrutinee is a `Bool`, `Option`, or `Result`
//! whose constructors are all present with irrefutable payloads.

use fern_parser::ast::{Ctor, Pattern, PatternKind};

use crate::ty::Ty;

/// Whether the given arm patterns cover the (resolved) scrutinee type.
pub fn is_exhaustive(scrutinee: &Ty, patterns: &[&Pattern<'_>]) -> bool {
    if patterns.iter().any(|p| p.is_irrefutable()) {
        return true;
    }

    if scrutinee.is_con("Bool") {
        let has_true = patterns
            .iter()
            .any(|p| matches!(p.kind, PatternKind::Bool(true)));
        let has_false = patterns
            .iter()
            .any(|p| matches!(p.kind, PatternKind::Bool(false)));
        return has_true && has_false;
    }

    if let Ty::App(con, _) = scrutinee {
        if con.is_con("Option") {
            return covers_ctor(patterns, Ctor::Some) && covers_ctor(patterns, Ctor::None);
        }
        if con.is_con("Result") {
            return covers_ctor(patterns, Ctor::Ok) && covers_ctor(patterns, Ctor::Err);
        }
    }

    // Int, Float, String, tuples of literals, unresolved variables:
    // only an irrefutable arm covers them.
    false
}

fn covers_ctor(patterns: &[&Pattern<'_>], wanted: Ctor) -> bool {
    patterns.iter().any(|p| match p.kind {
        PatternKind::Ctor { ctor, arg } if ctor == wanted => match arg {
            Some(inner) => inner.is_irrefutable(),
            None => true,
        },
        _ => false,
    })
}
