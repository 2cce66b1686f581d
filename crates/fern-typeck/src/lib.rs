//! Fern type checker: Hindley-Milner type inference.
//!
//! Assigns a type to every expression in a parsed Fern program,
//! supporting let-polymorphism with level-based generalization,
//! unification with a mandatory occurs check, and resilient error
//! collection (one bad statement does not stop checking).
//!
//! # Architecture
//!
//! - [`ty`]: type terms, constructors, variables, and schemes
//! - [`unify`]: the inference context -- union-find, levels,
//!   generalization, instantiation
//! - [`env`]: scope-stacked type environment
//! - [`builtins`]: operator and runtime-helper registration
//! - [`infer`]: the AST walk ([`Checker`])
//! - [`exhaustiveness`]: shallow match-coverage warnings
//! - [`error`]: the error taxonomy

pub mod builtins;
pub mod env;
pub mod error;
pub mod exhaustiveness;
pub mod infer;
pub mod ty;
pub mod unify;

pub use error::TypeError;
pub use infer::Checker;
pub use ty::{Scheme, Ty, TyCon, TyVar};
