//! QBE code generation for the Fern compiler.
//!
//! Transforms a type-checked Fern program into textual QBE IR -- typed
//! SSA with explicit basic blocks, `%temp` locals, `$global` symbols,
//! `@label` labels, and `data` definitions -- ready for the external
//! `qbe` tool to turn into native assembly.
//!
//! ## Pipeline
//!
//! ```text
//! AST + node types -> QBE IR text -> qbe -> .s -> cc -> executable
//! ```

pub mod codegen;

pub use codegen::Codegen;
